//! # Core Error Types
//!
//! Fatal conditions only exist at construction time. Everything inside the
//! frame degrades by omission - an unrenderable entity just doesn't appear.

use thiserror::Error;

/// Errors that can occur while loading or validating engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// Path that was attempted.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A render target dimension was zero.
    #[error("render target must be at least 1x1, got {width}x{height}")]
    ZeroTarget {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },

    /// A pool or particle capacity was zero.
    #[error("capacity '{name}' must be greater than zero")]
    ZeroCapacity {
        /// Name of the offending field.
        name: &'static str,
    },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, ConfigError>;
