//! Error types for veneer.

use std::io;
use std::path::PathBuf;

/// Errors produced by theme resolution, publishing and configuration.
#[derive(Debug, thiserror::Error)]
pub enum VeneerError {
    #[error("unable to create directory {}: {reason}", path.display())]
    DirectoryCreation { path: PathBuf, reason: String },

    #[error("unable to locate directory {}", .0.display())]
    DirectoryMissing(PathBuf),

    #[error("theme [ {0} ] not found")]
    InvalidTheme(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("VFS error: {0}")]
    Vfs(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, VeneerError>;
