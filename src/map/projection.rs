use crate::geo::Bounds;
use std::f64::consts::PI;

/// Web Mercator x for a longitude, normalised to [0, 1]
#[inline]
fn mercator_x(lon: f64) -> f64 {
    (lon + 180.0) / 360.0
}

/// Web Mercator y for a latitude, normalised to [0, 1] (north at 0)
#[inline]
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat.clamp(-85.0511, 85.0511) * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

#[inline]
fn inverse_mercator_y(y: f64) -> f64 {
    (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI
}

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level: the world is `zoom * width` pixels across
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            min_zoom: 0.5,
            max_zoom: 5_000_000.0,
            width,
            height,
        }
    }

    pub fn with_zoom_limits(mut self, min_zoom: f64, max_zoom: f64) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom.max(min_zoom);
        self.zoom = self.zoom.clamp(self.min_zoom, self.max_zoom);
        self
    }

    /// Pixels per unit of normalised Mercator space
    #[inline]
    fn scale(&self) -> f64 {
        self.zoom * self.width.max(1) as f64
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = self.scale();
        let x = mercator_x(self.center_lon) + dx as f64 / scale;
        let y = mercator_y(self.center_lat) + dy as f64 / scale;

        self.center_lon = x * 360.0 - 180.0;
        self.center_lat = inverse_mercator_y(y);

        // Wrap longitude
        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }

        // Clamp latitude
        self.center_lat = self.center_lat.clamp(-85.0, 85.0);
    }

    /// Zoom in by a factor
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(self.max_zoom);
    }

    /// Zoom out by a factor
    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(self.min_zoom);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    /// Zoom by factor towards a specific pixel location
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        // Get the geographic coordinates under the mouse
        let (lon, lat) = self.unproject(px, py);

        self.zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);

        // Calculate where that point would now project to
        let (new_px, new_py) = self.project(lon, lat);

        // Pan to bring it back under the mouse
        self.pan(new_px - px, new_py - py);
    }

    /// Centre on a geographic point without changing zoom
    pub fn center_on(&mut self, lon: f64, lat: f64) {
        self.center_lon = lon;
        self.center_lat = lat.clamp(-85.0, 85.0);
    }

    /// Centre and zoom so `bounds` fills the canvas minus `padding` pixels on
    /// each side (x, y). Degenerate bounds keep the current zoom.
    pub fn fit_bounds(&mut self, bounds: &Bounds, padding: (u16, u16)) {
        let x0 = mercator_x(bounds.min_lon);
        let x1 = mercator_x(bounds.max_lon);
        // North maps to the smaller y
        let y0 = mercator_y(bounds.max_lat);
        let y1 = mercator_y(bounds.min_lat);

        let avail_w = (self.width as f64 - 2.0 * padding.0 as f64).max(1.0);
        let avail_h = (self.height as f64 - 2.0 * padding.1 as f64).max(1.0);
        let width = self.width.max(1) as f64;

        let mut zoom = f64::INFINITY;
        if x1 - x0 > 0.0 {
            zoom = zoom.min(avail_w / ((x1 - x0) * width));
        }
        if y1 - y0 > 0.0 {
            zoom = zoom.min(avail_h / ((y1 - y0) * width));
        }
        if zoom.is_finite() {
            self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        }

        self.center_lon = ((x0 + x1) / 2.0) * 360.0 - 180.0;
        self.center_lat = inverse_mercator_y((y0 + y1) / 2.0);
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        self.unproject_f(px as f64, py as f64)
    }

    pub fn unproject_f(&self, px: f64, py: f64) -> (f64, f64) {
        let scale = self.scale();
        let x = (px - self.width as f64 / 2.0) / scale + mercator_x(self.center_lon);
        let y = (py - self.height as f64 / 2.0) / scale + mercator_y(self.center_lat);
        (x * 360.0 - 180.0, inverse_mercator_y(y))
    }

    /// Project a geographic coordinate (lon, lat) to sub-pixel coordinates
    pub fn project_f(&self, lon: f64, lat: f64) -> (f64, f64) {
        let scale = self.scale();
        let px = (mercator_x(lon) - mercator_x(self.center_lon)) * scale + self.width as f64 / 2.0;
        let py = (mercator_y(lat) - mercator_y(self.center_lat)) * scale + self.height as f64 / 2.0;
        (px, py)
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let (px, py) = self.project_f(lon, lat);
        (px.floor() as i32, py.floor() as i32)
    }

    /// Geographic bounds of the visible canvas
    pub fn visible_bounds(&self) -> Bounds {
        let (west, north) = self.unproject_f(0.0, 0.0);
        let (east, south) = self.unproject_f(self.width as f64, self.height as f64);
        Bounds {
            min_lon: west,
            min_lat: south,
            max_lon: east,
            max_lat: north,
        }
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0
            && min_x < self.width as i32
            && max_y >= 0
            && min_y < self.height as i32
    }
}
