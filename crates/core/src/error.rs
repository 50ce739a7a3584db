//! Error types shared across the workspace.

use thiserror::Error;

/// Top-level error type for non-RHI failures.
///
/// Vulkan-internal errors live in `spinel-rhi`; this type covers the
/// windowing, configuration, and IO failures that happen around them.
#[derive(Error, Debug)]
pub enum Error {
    /// Vulkan-related errors surfaced outside the RHI layer
    #[error("Vulkan error: {0}")]
    Vulkan(String),

    /// Window creation or management errors
    #[error("Window error: {0}")]
    Window(String),

    /// Asset lookup or loading errors
    #[error("Resource error: {0}")]
    Resource(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using the workspace's top-level Error type.
pub type Result<T> = std::result::Result<T, Error>;
