use std::path::PathBuf;
use thiserror::Error;

/// Failure while fetching or parsing the parcel dataset.
///
/// Fatal to the session: nothing is drawn, only [`LoadError::user_message`]
/// is shown.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A `file://` URL was given. Only plain paths and http(s) are fetched.
    #[error("refusing to fetch {url}: data must be served over http(s) or given as a plain path")]
    LocalOrigin { url: String },
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP error! Status: {status}")]
    Status { url: String, status: u16 },
    #[error("failed to parse GeoJSON: {0}")]
    Parse(String),
    #[error("GeoJSON must be a FeatureCollection")]
    NotFeatureCollection,
}

impl LoadError {
    pub fn is_local_origin(&self) -> bool {
        matches!(self, LoadError::LocalOrigin { .. })
    }

    /// Text surfaced to the user when the load fails.
    pub fn user_message(&self) -> String {
        if self.is_local_origin() {
            "Cannot load property data. Please serve the data from a web server \
             (e.g. \"python -m http.server 8000\") or pass a plain file path \
             rather than a file:// URL."
                .to_string()
        } else {
            format!("Error loading property data: {self}")
        }
    }
}

/// Rejected calculate request. Recoverable; displayed state is left as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select at least one tax type to compare")]
    NoTaxSelected,
}
