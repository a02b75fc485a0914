//! Error types for the export service

use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while exporting artboards
#[derive(Error, Debug)]
pub enum Error {
    /// No object in the artboard's scene graph carries the artboard's own id
    #[error("artboard '{id}' has no self-reference object in its scene graph")]
    MissingSelfReference { id: String },

    /// The self-reference object's placement field is absent or zero
    #[error("artboard '{id}' {field} adjustment is undefined")]
    UndefinedAdjustment { id: String, field: &'static str },

    /// Failed to launch or initialize the rendering host
    #[error("Host initialization failed: {0}")]
    Initialization(String),

    /// Navigation to the hosting page failed
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// The rendering surface rejected the scene or produced no output
    #[error("Rendering failed: {0}")]
    Render(String),

    /// Failed to build the output archive
    #[error("Archive error: {0}")]
    Archive(String),

    /// The request body could not be understood
    #[error("Invalid request: {0}")]
    Request(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Request(err.to_string())
    }
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Render(err.to_string())
    }
}
