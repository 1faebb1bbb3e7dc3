use crate::choropleth;
use crate::data::{Dataset, FeatureId, ParcelProperties};
use crate::format::{format_area, format_currency};
use crate::geo::Bounds;
use crate::map::surface::{MapSurface, PathStyle, PopupContent};
use ratatui::style::Color;
use tracing::debug;

const OUTLINE: Color = Color::Rgb(0xff, 0xff, 0xff);
const OUTLINE_OPACITY: f64 = 0.8;

const BASE_WEIGHT: u8 = 1;
const BASE_FILL_OPACITY: f64 = 0.6;
const HOVER_WEIGHT: u8 = 2;
const HOVER_FILL_OPACITY: f64 = 0.8;

/// Resting style for a parcel: fill from its land value tier.
pub fn base_style(props: &ParcelProperties) -> PathStyle {
    PathStyle {
        fill: choropleth::color_for(props.land_value_per_m2),
        fill_opacity: BASE_FILL_OPACITY,
        outline: OUTLINE,
        weight: BASE_WEIGHT,
        outline_opacity: OUTLINE_OPACITY,
    }
}

/// Style while the pointer is over the parcel
pub fn hover_style(base: PathStyle) -> PathStyle {
    PathStyle {
        weight: HOVER_WEIGHT,
        fill_opacity: HOVER_FILL_OPACITY,
        ..base
    }
}

pub fn popup_content(props: &ParcelProperties) -> PopupContent {
    PopupContent {
        title: props.label.clone(),
        rows: vec![
            ("Land Value/m²:".into(), format_currency(props.land_value_per_m2)),
            ("Area:".into(), format_area(props.area)),
            ("Total Land Value:".into(), format_currency(props.land_value_combined)),
        ],
    }
}

/// Pointer interaction with a rendered region
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionEvent {
    Click(FeatureId),
    HoverIn(FeatureId),
    HoverOut(FeatureId),
}

/// The parcels as drawn on a surface, plus their interaction state.
pub struct ChoroplethLayer {
    /// Base style per parcel; `None` for parcels without drawable geometry
    styles: Vec<Option<PathStyle>>,
    hovered: Option<FeatureId>,
    bounds: Option<Bounds>,
}

/// Add every drawable parcel to the surface with its choropleth style and
/// popup, then fit the view to all of them.
pub fn render<S: MapSurface + ?Sized>(
    dataset: &Dataset,
    surface: &mut S,
    padding: (u16, u16),
) -> ChoroplethLayer {
    let mut styles = vec![None; dataset.len()];
    let mut bounds: Option<Bounds> = None;

    for (id, parcel) in dataset.iter() {
        let Some(parcel_bounds) = parcel.bounds else {
            continue;
        };
        let style = base_style(&parcel.properties);
        surface.add_region(id, &parcel.rings, style);
        surface.bind_popup(id, popup_content(&parcel.properties));
        styles[id.index()] = Some(style);
        bounds = Some(bounds.map_or(parcel_bounds, |b| b.union(parcel_bounds)));
    }

    let layer = ChoroplethLayer {
        styles,
        hovered: None,
        bounds,
    };
    layer.fit(surface, padding);
    debug!(regions = layer.region_count(), "Rendered choropleth layer");
    layer
}

impl ChoroplethLayer {
    /// Number of interactive regions
    pub fn region_count(&self) -> usize {
        self.styles.iter().filter(|s| s.is_some()).count()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn hovered(&self) -> Option<FeatureId> {
        self.hovered
    }

    /// Fit the surface to the union of all rendered geometries
    pub fn fit<S: MapSurface + ?Sized>(&self, surface: &mut S, padding: (u16, u16)) {
        if let Some(bounds) = self.bounds {
            surface.fit_bounds(&bounds, padding);
        }
    }

    fn base(&self, id: FeatureId) -> Option<PathStyle> {
        self.styles.get(id.index()).copied().flatten()
    }

    /// Apply an event. A click on a rendered region returns the parcel to
    /// select; hover events only restyle.
    pub fn handle<S: MapSurface + ?Sized>(
        &mut self,
        event: RegionEvent,
        surface: &mut S,
    ) -> Option<FeatureId> {
        match event {
            RegionEvent::Click(id) => self.base(id).map(|_| id),
            RegionEvent::HoverIn(id) => {
                if let Some(base) = self.base(id) {
                    surface.set_style(id, hover_style(base));
                    self.hovered = Some(id);
                }
                None
            }
            RegionEvent::HoverOut(id) => {
                if let Some(base) = self.base(id) {
                    surface.set_style(id, base);
                    if self.hovered == Some(id) {
                        self.hovered = None;
                    }
                }
                None
            }
        }
    }

    /// Move the hover to `target`, emitting the out/in pair as needed.
    pub fn hover<S: MapSurface + ?Sized>(&mut self, target: Option<FeatureId>, surface: &mut S) {
        if self.hovered == target {
            return;
        }
        if let Some(prev) = self.hovered {
            self.handle(RegionEvent::HoverOut(prev), surface);
        }
        if let Some(next) = target {
            self.handle(RegionEvent::HoverIn(next), surface);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::tests::three_parcels;
    use crate::geo::Ring;
    use std::collections::HashMap;

    /// Surface that records what the layer asked for
    #[derive(Default)]
    pub(crate) struct RecordingSurface {
        pub regions: Vec<FeatureId>,
        pub styles: HashMap<FeatureId, PathStyle>,
        pub popups: HashMap<FeatureId, PopupContent>,
        pub fitted: Option<(Bounds, (u16, u16))>,
    }

    impl MapSurface for RecordingSurface {
        fn add_region(&mut self, id: FeatureId, _rings: &[Ring], style: PathStyle) {
            self.regions.push(id);
            self.styles.insert(id, style);
        }

        fn set_style(&mut self, id: FeatureId, style: PathStyle) {
            self.styles.insert(id, style);
        }

        fn bind_popup(&mut self, id: FeatureId, popup: PopupContent) {
            self.popups.insert(id, popup);
        }

        fn fit_bounds(&mut self, bounds: &Bounds, padding: (u16, u16)) {
            self.fitted = Some((*bounds, padding));
        }
    }

    #[test]
    fn test_three_features_three_regions() {
        let ds = three_parcels();
        let mut surface = RecordingSurface::default();
        let layer = render(&ds, &mut surface, (8, 8));

        assert_eq!(layer.region_count(), 3);
        assert_eq!(surface.regions, vec![FeatureId(0), FeatureId(1), FeatureId(2)]);
        assert_eq!(surface.popups.len(), 3);

        let (fitted, padding) = surface.fitted.unwrap();
        assert_eq!(padding, (8, 8));
        for (_, parcel) in ds.iter() {
            assert!(fitted.contains_bounds(&parcel.bounds.unwrap()));
        }
        assert_eq!(Some(fitted), ds.bounds());
    }

    #[test]
    fn test_fill_follows_tier() {
        let ds = three_parcels();
        let mut surface = RecordingSurface::default();
        render(&ds, &mut surface, (8, 8));
        assert_eq!(surface.styles[&FeatureId(0)].fill, choropleth::PALETTE[0]);
        assert_eq!(surface.styles[&FeatureId(1)].fill, choropleth::PALETTE[3]);
        assert_eq!(surface.styles[&FeatureId(2)].fill, choropleth::PALETTE[6]);
        assert_eq!(surface.styles[&FeatureId(0)].weight, 1);
        assert_eq!(surface.styles[&FeatureId(0)].fill_opacity, 0.6);
    }

    #[test]
    fn test_popup_rows() {
        let ds = three_parcels();
        let mut surface = RecordingSurface::default();
        render(&ds, &mut surface, (0, 0));
        let popup = &surface.popups[&FeatureId(0)];
        assert_eq!(popup.title, "SCT0000001");
        assert_eq!(
            popup.rows,
            vec![
                ("Land Value/m²:".to_string(), "£50.00".to_string()),
                ("Area:".to_string(), "120.50 m²".to_string()),
                ("Total Land Value:".to_string(), "£6,025.00".to_string()),
            ]
        );
    }

    #[test]
    fn test_hover_is_symmetric() {
        let ds = three_parcels();
        let mut surface = RecordingSurface::default();
        let mut layer = render(&ds, &mut surface, (8, 8));
        let resting = surface.styles[&FeatureId(1)];

        layer.hover(Some(FeatureId(1)), &mut surface);
        let hot = surface.styles[&FeatureId(1)];
        assert_eq!((hot.weight, hot.fill_opacity), (2, 0.8));
        assert_eq!(hot.fill, resting.fill);

        layer.hover(Some(FeatureId(2)), &mut surface);
        assert_eq!(surface.styles[&FeatureId(1)], resting);
        assert_eq!(surface.styles[&FeatureId(2)].weight, 2);

        layer.hover(None, &mut surface);
        assert_eq!(layer.hovered(), None);
        assert_eq!(surface.styles[&FeatureId(2)].weight, 1);
    }

    #[test]
    fn test_click_selects_only_rendered() {
        let ds = three_parcels();
        let mut surface = RecordingSurface::default();
        let mut layer = render(&ds, &mut surface, (8, 8));
        assert_eq!(
            layer.handle(RegionEvent::Click(FeatureId(2)), &mut surface),
            Some(FeatureId(2))
        );
        assert_eq!(layer.handle(RegionEvent::Click(FeatureId(9)), &mut surface), None);
    }

    #[test]
    fn test_empty_dataset_does_not_fit() {
        let mut surface = RecordingSurface::default();
        let layer = render(&Dataset::default(), &mut surface, (8, 8));
        assert_eq!(layer.region_count(), 0);
        assert!(surface.fitted.is_none());
    }
}
