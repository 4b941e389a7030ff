//! Foundation types for veneer.
//!
//! Shared by every veneer crate: the error type and the theme configuration
//! model read from `veneer.toml`.

pub mod config;
pub mod error;

pub use config::{ThemeConfig, ThemeDescriptor, ThemeEntry};
pub use error::{Result, VeneerError};
