mod geometry;
mod projection;
pub mod renderer;
mod spatial;
mod surface;
mod terminal;

pub use projection::Viewport;
pub use renderer::{render, ChoroplethLayer, RegionEvent};
pub use surface::{MapSurface, PathStyle, PopupContent};
pub use terminal::{MapFrame, TerminalMap, BACKGROUND, BASEMAP};
