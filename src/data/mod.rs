mod model;

pub use model::{Dataset, FeatureId, Parcel, ParcelProperties, Statistics, Summary};

use crate::error::LoadError;
use crate::geo::{LineString, Ring};
use anyhow::Result;
use geojson::{Feature, GeoJson, Geometry, JsonObject, Value};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where the parcel dataset lives
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    Path(PathBuf),
    Url(String),
}

impl Source {
    /// Classify a user supplied location. `file://` URLs are rejected the
    /// same way a browser refuses to fetch them from a local page.
    pub fn parse(location: &str) -> Result<Self, LoadError> {
        let trimmed = location.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("file:") {
            return Err(LoadError::LocalOrigin {
                url: trimmed.to_string(),
            });
        }
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Ok(Source::Url(trimmed.to_string()))
        } else {
            Ok(Source::Path(PathBuf::from(trimmed)))
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Path(path) => write!(f, "{}", path.display()),
            Source::Url(url) => f.write_str(url),
        }
    }
}

/// Fetch and parse the parcel FeatureCollection.
pub fn load(source: &Source) -> Result<Dataset, LoadError> {
    info!(%source, "Fetching properties");
    let mut bytes = fetch(source)?;
    let dataset = parse_dataset(&mut bytes)?;
    info!(count = dataset.len(), "Loaded properties");
    Ok(dataset)
}

fn fetch(source: &Source) -> Result<Vec<u8>, LoadError> {
    match source {
        Source::Path(path) => fs::read(path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        }),
        Source::Url(url) => {
            let http = |source| LoadError::Http {
                url: url.clone(),
                source,
            };
            let response = reqwest::blocking::get(url).map_err(http)?;
            let status = response.status();
            if !status.is_success() {
                return Err(LoadError::Status {
                    url: url.clone(),
                    status: status.as_u16(),
                });
            }
            Ok(response.bytes().map_err(http)?.to_vec())
        }
    }
}

/// Parse GeoJSON bytes into a dataset. The buffer is used as scratch space
/// by the SIMD parser.
pub fn parse_dataset(bytes: &mut [u8]) -> Result<Dataset, LoadError> {
    let geojson: GeoJson =
        simd_json::serde::from_slice(bytes).map_err(|e| LoadError::Parse(e.to_string()))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(LoadError::NotFeatureCollection),
    };

    // Order is preserved by the indexed collect
    let parcels: Vec<Parcel> = collection
        .features
        .into_par_iter()
        .map(parcel_from_feature)
        .collect();

    Ok(Dataset::new(parcels))
}

fn parcel_from_feature(feature: Feature) -> Parcel {
    let properties = feature
        .properties
        .as_ref()
        .map(read_properties)
        .unwrap_or_default();

    let mut rings = Vec::new();
    if let Some(ref geometry) = feature.geometry {
        collect_rings(geometry, &mut rings);
    }

    Parcel::new(properties, rings)
}

fn read_properties(props: &JsonObject) -> ParcelProperties {
    let number = |key: &str| props.get(key).and_then(|v| v.as_f64());

    let label = match props.get("Label") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    ParcelProperties {
        label,
        land_value_per_m2: number("Land_Value_per_m2"),
        area: number("Area"),
        land_value_combined: number("Land_Value_Combined"),
        building_value_combined: number("Building_Value_Combined"),
        council_tax_amount: number("Council_Tax_Amount"),
        lbtt_amount: number("LBTT_Amount"),
    }
}

fn to_ring(coords: &[Vec<f64>]) -> Ring {
    coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| (c[0], c[1]))
        .collect()
}

fn collect_rings(geometry: &Geometry, rings: &mut Vec<Ring>) {
    match &geometry.value {
        Value::Polygon(polygon) => {
            rings.extend(polygon.iter().map(|r| to_ring(r)));
        }
        Value::MultiPolygon(polygons) => {
            for polygon in polygons {
                rings.extend(polygon.iter().map(|r| to_ring(r)));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_rings(g, rings);
            }
        }
        _ => {}
    }
}

/// Load line work from each basemap file. Files that fail are skipped with
/// a warning; the parcels are still usable without a basemap.
pub fn load_basemap(paths: &[PathBuf]) -> Vec<LineString> {
    let mut lines = Vec::new();
    for path in paths {
        match load_lines(path) {
            Ok(mut found) => {
                info!(path = %path.display(), count = found.len(), "Loaded basemap lines");
                lines.append(&mut found);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to load basemap"),
        }
    }
    lines
}

fn load_lines(path: &Path) -> Result<Vec<LineString>> {
    let content = fs::read_to_string(path)?;
    let geojson: GeoJson = content.parse()?;
    let mut lines = Vec::new();
    process_geojson_lines(&geojson, |line| lines.push(line));
    Ok(lines)
}

/// Process GeoJSON and extract line features
fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(LineString),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    process_geometry_lines(geometry, &mut add_line);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => {
            process_geometry_lines(geometry, &mut add_line);
        }
    }
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(LineString),
{
    match &geometry.value {
        Value::LineString(coords) => add_line(to_ring(coords)),
        Value::MultiLineString(lines) => {
            for coords in lines {
                add_line(to_ring(coords));
            }
        }
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_ring(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                if let Some(exterior) = rings.first() {
                    add_line(to_ring(exterior));
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}
