use crate::data::FeatureId;
use crate::geo::{Bounds, Ring};
use ratatui::style::Color;

/// Visual style of one polygon region
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathStyle {
    pub fill: Color,
    pub fill_opacity: f64,
    pub outline: Color,
    /// Outline thickness in braille pixels
    pub weight: u8,
    pub outline_opacity: f64,
}

/// Text shown when a region is clicked
#[derive(Clone, Debug, PartialEq)]
pub struct PopupContent {
    pub title: String,
    /// (label, value) rows
    pub rows: Vec<(String, String)>,
}

/// Narrow interface over whatever draws the map.
///
/// The choropleth layer only ever talks to the map through this trait, so
/// it can be driven by a recording stub in tests and by the terminal surface
/// at runtime.
pub trait MapSurface {
    /// Add a polygon region. Regions added later draw on top.
    fn add_region(&mut self, id: FeatureId, rings: &[Ring], style: PathStyle);

    /// Restyle a previously added region.
    fn set_style(&mut self, id: FeatureId, style: PathStyle);

    fn bind_popup(&mut self, id: FeatureId, popup: PopupContent);

    /// Move the view so `bounds` is visible with `padding` kept free on each
    /// side (x, y).
    fn fit_bounds(&mut self, bounds: &Bounds, padding: (u16, u16));
}
