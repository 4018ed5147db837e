//! Error types for the asset pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while acquiring metadata or rendering assets
#[derive(Error, Debug)]
pub enum Error {
    /// A rendering session did not become ready in time
    #[error("Rendering session was not ready after {0}ms")]
    AcquireTimeout(u64),

    /// Failed to start or attach to the rendering engine
    #[error("Engine initialization failed: {0}")]
    InitializationError(String),

    /// Failed to load a URL or inject markup
    #[error("Failed to load page: {0}")]
    LoadError(String),

    /// Failed to capture the rendered frame
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// The data table never materialized on a reference page
    #[error("Could not find the table on {url} within {timeout_ms}ms")]
    ScrapeTimeout { url: String, timeout_ms: u64 },

    /// A reference page yielded no table rows
    #[error("Failed scraping the data on web page {0}")]
    EmptyScrapeResult(String),

    /// Capturing a single manifest image failed
    #[error("Failed to save image {name}")]
    CaptureFailed {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// The output directory could not be created
    #[error("Could not create output directory {}: {source}", .path.display())]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The visual source could not be resolved
    #[error("Invalid source: {0}")]
    SourceError(String),

    /// Filesystem error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    CdpError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::CdpError(err.to_string())
    }
}
