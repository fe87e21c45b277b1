/// Error types shared across the configurator
use thiserror::Error;

/// The main error type for kc3d.
///
/// Configuration problems (bad catalog entries, unknown trays) are surfaced
/// eagerly at construction time; mesh load failures at runtime are reported
/// as per-slot events instead and never appear as this type from the frame
/// loop.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed STL data.
    #[error("stl parse error: {0}")]
    Stl(String),

    /// Catalog file could not be deserialized.
    #[error("catalog error: {0}")]
    CatalogFormat(#[from] toml::de::Error),

    /// A catalog entry is internally inconsistent.
    #[error("catalog entry {index}: {reason}")]
    CatalogEntry { index: usize, reason: String },

    /// A hex color literal did not parse.
    #[error("bad hex color literal {0:?}")]
    HexColor(String),

    /// Texture image could not be decoded.
    #[error("texture {path:?}: {reason}")]
    Texture { path: String, reason: String },

    /// A tray references a part kind with no configured slots.
    #[error("tray {0:?} has no matching part slots")]
    UnknownTray(String),

    /// A swatch key points outside the catalog.
    #[error("swatch key {index} out of range (catalog has {len} entries)")]
    SwatchIndex { index: usize, len: usize },
}

/// Alias for `Result<T, kc3d_core::Error>`.
pub type Result<T> = std::result::Result<T, Error>;
