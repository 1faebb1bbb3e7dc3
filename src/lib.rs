//! Terminal land value tax map.
//!
//! Parcels from a GeoJSON FeatureCollection are drawn as a choropleth of land
//! value per m². Selecting a parcel shows its figures and lets the user
//! compare what they pay in council tax and LBTT against the land value tax
//! equivalents.

pub mod app;
pub mod braille;
pub mod calc;
pub mod choropleth;
pub mod config;
pub mod data;
pub mod error;
pub mod format;
pub mod geo;
pub mod map;
pub mod ui;
