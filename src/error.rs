//! Error types for the card export pipeline and REST client

use thiserror::Error;

/// Result type alias for pipeline and client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering, exporting, or talking to the
/// card service
#[derive(Error, Debug)]
pub enum Error {
    /// The render target is detached (no scene attached to snapshot)
    #[error("Render target is not attached")]
    RenderTargetMissing,

    /// The raster surface could not be read back or serialized
    #[error("Image encoding failed: {0}")]
    EncodingFailed(String),

    /// The PDF page could not be derived from the raster geometry
    #[error("Page composition failed: {0}")]
    PageCompositionFailed(String),

    /// A REST call was rejected or could not be completed
    #[error("Network request failed: {0}")]
    NetworkFailure(String),

    /// The requested record does not exist
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The session token store could not be read or written
    #[error("Session storage error: {0}")]
    SessionError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
