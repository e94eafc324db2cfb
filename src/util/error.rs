//! Error types for the viewer library.

use thiserror::Error;

/// Main error type for viewer operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Asset URL does not resolve to anything the source can serve
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// Asset URL is malformed or escapes the asset root
    #[error("Invalid asset URL: {0}")]
    InvalidUrl(String),

    /// Transport failure while retrieving asset bytes
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// Asset bytes could not be decoded
    #[error("Failed to parse {url}: {message}")]
    Parse { url: String, message: String },

    /// Asset decoded but contains no drawable geometry
    #[error("Asset has no drawable geometry: {0}")]
    EmptyScene(String),

    /// Bounding volume has zero extent or non-finite coordinates
    #[error("Degenerate bounds: largest dimension is {0}")]
    DegenerateBounds(f32),

    /// Background loader went away before answering
    #[error("Loader disconnected while loading {0}")]
    LoaderDisconnected(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a parse error for the given asset URL.
    pub fn parse(url: impl Into<String>, msg: impl ToString) -> Self {
        Self::Parse {
            url: url.into(),
            message: msg.to_string(),
        }
    }

    /// True for failures a caller may retry by loading again.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::AssetNotFound(_)
                | Self::InvalidUrl(_)
                | Self::Fetch { .. }
                | Self::Parse { .. }
                | Self::EmptyScene(_)
                | Self::LoaderDisconnected(_)
        )
    }
}

/// Result type alias for viewer operations.
pub type Result<T> = std::result::Result<T, Error>;
