use crate::braille::BrailleCanvas;
use crate::choropleth::blend;
use crate::data::FeatureId;
use crate::geo::{Bounds, LineString, Ring};
use crate::map::geometry::{draw_line, draw_weighted_line, ring_centroid, rings_contain};
use crate::map::projection::Viewport;
use crate::map::spatial::RegionGrid;
use crate::map::surface::{MapSurface, PathStyle, PopupContent};
use glam::DVec2;
use rayon::prelude::*;
use ratatui::style::Color;
use std::cell::OnceCell;
use std::collections::HashMap;

/// Map background where no parcel is drawn
pub const BACKGROUND: Color = Color::Rgb(0x11, 0x18, 0x27);
/// Basemap line colour
pub const BASEMAP: Color = Color::Rgb(0x4b, 0x55, 0x63);

struct Region {
    id: FeatureId,
    rings: Vec<Ring>,
    bounds: Bounds,
    style: PathStyle,
}

/// A region projected into braille pixel space for one frame
struct Projected {
    rings: Vec<Vec<DVec2>>,
    min: DVec2,
    max: DVec2,
}

impl Projected {
    fn new(region: &Region, viewport: &Viewport) -> Self {
        let rings: Vec<Vec<DVec2>> = region
            .rings
            .iter()
            .map(|ring| {
                ring.iter()
                    .map(|&(lon, lat)| DVec2::from(viewport.project_f(lon, lat)))
                    .collect()
            })
            .collect();
        let (min, max) = rings.iter().flatten().fold(
            (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
            |(min, max), &p| (min.min(p), max.max(p)),
        );
        Self { rings, min, max }
    }

    /// Smaller than a character cell: such regions would cover no cell
    /// centre, so they claim the cell holding their centroid instead.
    fn anchor_cell(&self) -> Option<(i64, i64)> {
        if self.max.x - self.min.x >= 2.0 || self.max.y - self.min.y >= 4.0 {
            return None;
        }
        let c = self.rings.first().and_then(|r| ring_centroid(r))?;
        Some(((c.x / 2.0).floor() as i64, (c.y / 4.0).floor() as i64))
    }

    fn covers(&self, col: i64, row: i64) -> bool {
        if let Some(anchor) = self.anchor_cell() {
            return anchor == (col, row);
        }
        rings_contain(&self.rings, cell_center(col, row))
    }

    /// Cells (col, row) inside a `cols` x `rows` screen covered by this region
    fn covered_cells(&self, cols: usize, rows: usize) -> Vec<(usize, usize)> {
        if let Some((col, row)) = self.anchor_cell() {
            let on_screen = col >= 0 && row >= 0 && (col as usize) < cols && (row as usize) < rows;
            return if on_screen { vec![(col as usize, row as usize)] } else { Vec::new() };
        }
        let col0 = ((self.min.x / 2.0).floor().max(0.0)) as usize;
        let row0 = ((self.min.y / 4.0).floor().max(0.0)) as usize;
        let col1 = ((self.max.x / 2.0).ceil().max(0.0) as usize).min(cols);
        let row1 = ((self.max.y / 4.0).ceil().max(0.0) as usize).min(rows);

        let mut cells = Vec::new();
        for row in row0..row1 {
            for col in col0..col1 {
                if rings_contain(&self.rings, cell_center(col as i64, row as i64)) {
                    cells.push((col, row));
                }
            }
        }
        cells
    }
}

#[inline]
fn cell_center(col: i64, row: i64) -> DVec2 {
    DVec2::new(col as f64 * 2.0 + 1.0, row as f64 * 4.0 + 2.0)
}

/// One rendered frame of the map, in character cells
pub struct MapFrame {
    pub cols: usize,
    pub rows: usize,
    /// Background colour per cell, row-major
    pub fills: Vec<Color>,
    pub outlines: BrailleCanvas,
    pub basemap: BrailleCanvas,
    /// Outline dot colour per cell, already blended over the fill
    pub outline_colors: Vec<Color>,
}

impl MapFrame {
    pub fn fill(&self, col: usize, row: usize) -> Color {
        self.fills[row * self.cols + col]
    }

    pub fn outline_color(&self, col: usize, row: usize) -> Color {
        self.outline_colors[row * self.cols + col]
    }
}

/// Terminal implementation of [`MapSurface`]: keeps regions in lon/lat,
/// rasterises them into coloured cells plus braille outlines on demand, and
/// answers hit-tests for the mouse.
pub struct TerminalMap {
    pub viewport: Viewport,
    regions: Vec<Region>,
    slot: HashMap<FeatureId, usize>,
    popups: HashMap<FeatureId, PopupContent>,
    grid: OnceCell<RegionGrid>,
    basemap: Vec<LineString>,
    open_popup: Option<(FeatureId, (u16, u16))>,
}

impl TerminalMap {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            regions: Vec::new(),
            slot: HashMap::new(),
            popups: HashMap::new(),
            grid: OnceCell::new(),
            basemap: Vec::new(),
            open_popup: None,
        }
    }

    pub fn set_basemap(&mut self, lines: Vec<LineString>) {
        self.basemap = lines;
    }

    /// Size the viewport to a map area of `cols` x `rows` characters
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.viewport.width = cols as usize * 2;
        self.viewport.height = rows as usize * 4;
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn style_of(&self, id: FeatureId) -> Option<PathStyle> {
        self.slot.get(&id).map(|&i| self.regions[i].style)
    }

    fn grid(&self) -> &RegionGrid {
        self.grid.get_or_init(|| {
            let extent = self.regions.iter().map(|r| r.bounds).reduce(Bounds::union);
            let mut grid = RegionGrid::new(RegionGrid::cell_size_for(extent.as_ref()));
            for (i, region) in self.regions.iter().enumerate() {
                grid.insert(i, &region.bounds);
            }
            grid
        })
    }

    /// Indices of regions that may be visible, in draw order
    fn visible_regions(&self, viewport: &Viewport) -> Vec<usize> {
        let mut candidates = Vec::new();
        self.grid().query_bounds(&viewport.visible_bounds(), &mut candidates);
        candidates
    }

    /// Front-most region covering the character cell at (col, row)
    pub fn region_at(&self, col: u16, row: u16) -> Option<FeatureId> {
        // Query the whole cell, not just its centre, so sub-cell regions
        // anchored here are candidates too
        let (x, y) = (col as f64 * 2.0, row as f64 * 4.0);
        let (west, north) = self.viewport.unproject_f(x, y);
        let (east, south) = self.viewport.unproject_f(x + 2.0, y + 4.0);
        let cell_bounds = Bounds {
            min_lon: west,
            min_lat: south,
            max_lon: east,
            max_lat: north,
        };

        let mut candidates = Vec::new();
        self.grid().query_bounds(&cell_bounds, &mut candidates);

        candidates
            .into_iter()
            .rev()
            .map(|i| &self.regions[i])
            .find(|region| {
                Projected::new(region, &self.viewport).covers(col as i64, row as i64)
            })
            .map(|region| region.id)
    }

    /// Left click at a cell: opens the bound popup of the region hit, or
    /// closes any open popup when the click misses.
    pub fn click(&mut self, col: u16, row: u16) -> Option<FeatureId> {
        let hit = self.region_at(col, row);
        self.open_popup = hit
            .filter(|id| self.popups.contains_key(id))
            .map(|id| (id, (col, row)));
        hit
    }

    pub fn close_popup(&mut self) {
        self.open_popup = None;
    }

    /// Open popup content and the cell it is anchored to
    pub fn popup(&self) -> Option<(&PopupContent, (u16, u16))> {
        let (id, anchor) = self.open_popup?;
        self.popups.get(&id).map(|p| (p, anchor))
    }

    /// Rasterise the current view into a frame of `cols` x `rows` cells.
    pub fn frame(&self, cols: usize, rows: usize) -> MapFrame {
        let mut viewport = self.viewport.clone();
        viewport.width = cols * 2;
        viewport.height = rows * 4;

        let mut basemap = BrailleCanvas::new(cols, rows);
        for line in &self.basemap {
            draw_linestring(&mut basemap, line, &viewport);
        }

        let visible = self.visible_regions(&viewport);
        let regions = &self.regions;
        // Coverage is independent per region; painting keeps draw order
        let coverage: Vec<(usize, Projected, Vec<(usize, usize)>)> = visible
            .par_iter()
            .map(|&i| {
                let projected = Projected::new(&regions[i], &viewport);
                let cells = projected.covered_cells(cols, rows);
                (i, projected, cells)
            })
            .collect();

        let mut fills = vec![BACKGROUND; cols * rows];
        let mut owner: Vec<Option<usize>> = vec![None; cols * rows];
        let mut outlines = BrailleCanvas::new(cols, rows);

        for (i, projected, cells) in &coverage {
            let style = self.regions[*i].style;
            let color = blend(style.fill, BACKGROUND, style.fill_opacity);
            for &(col, row) in cells {
                fills[row * cols + col] = color;
                owner[row * cols + col] = Some(*i);
            }
            for ring in &projected.rings {
                draw_ring(&mut outlines, ring, style.weight, &viewport);
            }
        }

        let outline_colors = (0..cols * rows)
            .map(|cell| {
                let style = owner[cell].map(|i| self.regions[i].style);
                let (outline, opacity) = style
                    .map(|s| (s.outline, s.outline_opacity))
                    .unwrap_or((Color::Rgb(0xff, 0xff, 0xff), 0.8));
                blend(outline, fills[cell], opacity)
            })
            .collect();

        MapFrame {
            cols,
            rows,
            fills,
            outlines,
            basemap,
            outline_colors,
        }
    }
}

impl MapSurface for TerminalMap {
    fn add_region(&mut self, id: FeatureId, rings: &[Ring], style: PathStyle) {
        let Some(bounds) = Bounds::of_rings(rings) else {
            return;
        };
        self.slot.insert(id, self.regions.len());
        self.regions.push(Region {
            id,
            rings: rings.to_vec(),
            bounds,
            style,
        });
        self.grid = OnceCell::new();
    }

    fn set_style(&mut self, id: FeatureId, style: PathStyle) {
        if let Some(&i) = self.slot.get(&id) {
            self.regions[i].style = style;
        }
    }

    fn bind_popup(&mut self, id: FeatureId, popup: PopupContent) {
        self.popups.insert(id, popup);
    }

    fn fit_bounds(&mut self, bounds: &Bounds, padding: (u16, u16)) {
        self.viewport.fit_bounds(bounds, padding);
    }
}

fn draw_ring(canvas: &mut BrailleCanvas, ring: &[DVec2], weight: u8, viewport: &Viewport) {
    for pair in ring.windows(2) {
        let a = (pair[0].x.floor() as i32, pair[0].y.floor() as i32);
        let b = (pair[1].x.floor() as i32, pair[1].y.floor() as i32);
        if viewport.line_might_be_visible(a, b) {
            draw_weighted_line(canvas, a, b, weight);
        }
    }
}

/// Draw a linestring with viewport culling
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;

    for &(lon, lat) in line {
        let (px, py) = viewport.project(lon, lat);

        if let Some((prev_x, prev_y)) = prev {
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < viewport.width * 4 && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }

        prev = Some((px, py));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::three_parcels;
    use crate::map::renderer::{self, RegionEvent};

    const COLS: u16 = 60;
    const ROWS: u16 = 20;

    fn rendered() -> (TerminalMap, renderer::ChoroplethLayer) {
        let mut map = TerminalMap::new(Viewport::new(0.0, 0.0, 1.0, 0, 0));
        map.resize(COLS, ROWS);
        let layer = renderer::render(&three_parcels(), &mut map, (8, 8));
        (map, layer)
    }

    /// Cell holding the projected centre of a parcel
    fn center_cell(map: &TerminalMap, lon: f64, lat: f64) -> (u16, u16) {
        let (px, py) = map.viewport.project_f(lon, lat);
        ((px / 2.0) as u16, (py / 4.0) as u16)
    }

    #[test]
    fn test_three_regions_fitted_with_padding() {
        let (map, layer) = rendered();
        assert_eq!(map.region_count(), 3);
        assert_eq!(layer.region_count(), 3);

        let bounds = layer.bounds().unwrap();
        let (x0, y0) = map.viewport.project_f(bounds.min_lon, bounds.max_lat);
        let (x1, y1) = map.viewport.project_f(bounds.max_lon, bounds.min_lat);
        let (w, h) = (COLS as f64 * 2.0, ROWS as f64 * 4.0);
        let eps = 1e-6;
        assert!(x0 >= 8.0 - eps && y0 >= 8.0 - eps);
        assert!(x1 <= w - 8.0 + eps && y1 <= h - 8.0 + eps);
    }

    #[test]
    fn test_hit_test_each_parcel() {
        let (map, _) = rendered();
        let centers = [(-2.095, 57.105), (-2.085, 57.105), (-2.075, 57.105)];
        for (i, (lon, lat)) in centers.into_iter().enumerate() {
            let (col, row) = center_cell(&map, lon, lat);
            assert_eq!(map.region_at(col, row), Some(FeatureId(i)));
        }
        assert_eq!(map.region_at(0, 0), None);
    }

    #[test]
    fn test_frame_paints_tier_colours() {
        let (map, _) = rendered();
        let frame = map.frame(COLS as usize, ROWS as usize);
        let (col, row) = center_cell(&map, -2.075, 57.105);
        let expected = blend(crate::choropleth::PALETTE[6], BACKGROUND, 0.6);
        assert_eq!(frame.fill(col as usize, row as usize), expected);
        assert_eq!(frame.fill(0, 0), BACKGROUND);
    }

    #[test]
    fn test_hover_changes_frame() {
        let (mut map, mut layer) = rendered();
        let (col, row) = center_cell(&map, -2.095, 57.105);
        let before = map.frame(COLS as usize, ROWS as usize).fill(col as usize, row as usize);

        layer.hover(map.region_at(col, row), &mut map);
        let during = map.frame(COLS as usize, ROWS as usize).fill(col as usize, row as usize);
        assert_ne!(before, during);
        assert_eq!(map.style_of(FeatureId(0)).unwrap().weight, 2);

        layer.handle(RegionEvent::HoverOut(FeatureId(0)), &mut map);
        let after = map.frame(COLS as usize, ROWS as usize).fill(col as usize, row as usize);
        assert_eq!(before, after);
    }

    #[test]
    fn test_click_opens_and_closes_popup() {
        let (mut map, _) = rendered();
        let (col, row) = center_cell(&map, -2.085, 57.105);
        assert_eq!(map.click(col, row), Some(FeatureId(1)));
        let (popup, anchor) = map.popup().unwrap();
        assert_eq!(popup.title, "SCT0000002");
        assert_eq!(anchor, (col, row));

        assert_eq!(map.click(0, 0), None);
        assert!(map.popup().is_none());
    }

    #[test]
    fn test_tiny_region_still_claims_a_cell() {
        let mut map = TerminalMap::new(Viewport::new(0.0, 0.0, 1.0, 0, 0));
        map.resize(40, 10);
        let style = renderer::base_style(&Default::default());
        let big = vec![vec![(-10.0, -10.0), (10.0, -10.0), (10.0, 10.0), (-10.0, 10.0), (-10.0, -10.0)]];
        let tiny = vec![vec![(0.0, 0.0), (0.001, 0.0), (0.001, 0.001), (0.0, 0.001), (0.0, 0.0)]];
        map.add_region(FeatureId(0), &big, style);
        map.add_region(FeatureId(1), &tiny, style);
        map.fit_bounds(&Bounds::of_rings(&big).unwrap(), (0, 0));

        let (px, py) = map.viewport.project_f(0.0005, 0.0005);
        let cell = ((px / 2.0) as u16, (py / 4.0) as u16);
        assert_eq!(map.region_at(cell.0, cell.1), Some(FeatureId(1)));
    }
}
