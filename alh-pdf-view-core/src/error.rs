//! Error types for the viewport controller and its channel.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ViewError>;

/// Rejected viewport or page dimensions
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    #[error("invalid geometry: viewport {viewport_width}x{viewport_height}, page {page_width}x{page_height}")]
    InvalidGeometry {
        viewport_width: f64,
        viewport_height: f64,
        page_width: f64,
        page_height: f64,
    },
}

/// Configuration payload could not be turned into a [`Configuration`](crate::Configuration)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration payload is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("configuration needs exactly one of `filePath` or `bytes`")]
    AmbiguousSource,

    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by a native render surface
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// Errors returned by controller operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewError {
    #[error("viewport has not been laid out yet")]
    NotInitialized,

    #[error("zoom factor must be a positive finite number, got {0}")]
    InvalidZoom(f64),

    #[error("no document is loaded")]
    NoDocument,

    #[error("view has been disposed")]
    Disposed,

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

impl ViewError {
    /// Stable code reported to the host alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::InvalidZoom(_) => "INVALID_ZOOM",
            Self::NoDocument => "NO_DOCUMENT",
            Self::Disposed => "DISPOSED",
            Self::Geometry(_) => "INVALID_GEOMETRY",
            Self::Surface(_) => "INVALID_DOCUMENT",
        }
    }
}

/// Failure returned to the host for a single channel command
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("method `{0}` is not implemented")]
    NotImplemented(String),

    #[error("invalid arguments for `{method}`: {reason}")]
    InvalidArguments { method: String, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    View(#[from] ViewError),
}

impl ChannelError {
    pub(crate) fn invalid_arguments(method: &str, reason: impl ToString) -> Self {
        Self::InvalidArguments {
            method: method.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NotImplemented(_) => "NOT_IMPLEMENTED",
            Self::InvalidArguments { .. } | Self::Config(_) => "INVALID_ARGUMENTS",
            Self::View(err) => err.code(),
        }
    }
}
