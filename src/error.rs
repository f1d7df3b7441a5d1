//! Error types
//!
//! Only construction and asset loading can fail. Frame-time code degrades
//! visually instead of returning errors.

use std::path::PathBuf;
use thiserror::Error;

/// Atlas image or metadata could not be fetched or decoded.
///
/// Non-fatal: the engine stays inert until a later load succeeds.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode atlas image {source_name}: {source}")]
    Image {
        source_name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to parse atlas metadata {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("atlas image source missing")]
    MissingImage,

    #[error("malformed data URI: {0}")]
    DataUri(String),

    #[error("unsupported atlas image source: {0}")]
    UnsupportedSource(String),

    #[error("atlas loader stopped before finishing")]
    Disconnected,
}

/// Fatal construction errors. The engine is never partially built.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("animation table must contain at least one state")]
    EmptyAnimationTable,

    #[error("unable to allocate a {width}x{height} device surface")]
    Surface { width: u32, height: u32 },

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("failed to write config: {0}")]
    Write(String),
}
