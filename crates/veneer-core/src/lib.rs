//! veneer core.
//!
//! Selects a named theme at startup: resolves its view, translation and
//! asset locations, publishes asset folders into the public tree as
//! symlinks, and registers search locations with the host's view finder and
//! translator. Activation happens once; later requests are ignored.

// Re-exports from veneer-types and veneer-vfs.
pub use veneer_types::config;
pub use veneer_types::error;
pub use veneer_vfs as vfs;

pub mod registry;
pub mod resolver;
pub mod translation;
pub mod views;

pub use registry::ThemeRegistry;
pub use resolver::{
    Activation, ActivationReport, PublishOptions, PublishOutcome, PublishedFolder, ThemeResolver,
};
pub use translation::{Catalog, Placeholders, Translator};
pub use views::{ViewFinder, ViewPaths};
