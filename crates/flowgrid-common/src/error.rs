//! Error types shared by the raster and frame codecs.

use thiserror::Error;

/// Errors that can occur while reading, writing or transforming grid files.
#[derive(Error, Debug)]
pub enum FlowgridError {
    /// The file does not follow the expected layout.
    #[error("format error: {0}")]
    Format(String),

    /// Companion files disagree with each other.
    #[error("consistency error: {0}")]
    Consistency(String),

    /// The input is valid but outside what this implementation handles.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FlowgridError {
    /// Create a Format error.
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Create a Consistency error.
    pub fn consistency(msg: impl Into<String>) -> Self {
        Self::Consistency(msg.into())
    }

    /// Create an Unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}

/// Result type for flowgrid operations.
pub type FlowgridResult<T> = std::result::Result<T, FlowgridError>;
