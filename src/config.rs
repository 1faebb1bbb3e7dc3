use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "lvt-map.toml";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub map: MapConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    /// Path or http(s) URL of the parcel FeatureCollection.
    pub source: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: "data/properties.geojson".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    /// Initial view before the data arrives, as [lat, lon]
    pub center: [f64; 2],
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Margin kept around the parcels when fitting the view, in braille pixels [x, y]
    pub fit_padding: [u16; 2],
    /// Line GeoJSON files (coastlines, roads) drawn beneath the parcels
    pub basemap: Vec<PathBuf>,
}

impl Default for MapConfig {
    fn default() -> Self {
        // Aberdeenshire
        Self {
            center: [57.3655, -2.5205],
            zoom: 2000.0,
            min_zoom: 0.5,
            max_zoom: 5_000_000.0,
            fit_padding: [8, 8],
            basemap: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UiConfig {
    /// Delay between drawing the parcels and dropping the loading overlay
    pub loading_delay_ms: u64,
    pub min_search_length: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            loading_delay_ms: 100,
            min_search_length: 3,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// Explicit paths must exist; the default file is optional.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load_from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
