//! Filesystem abstraction used by theme activation.
//!
//! Activation only needs a handful of operations: directory checks,
//! recursive directory creation, and symlink inspection/creation. Catalog
//! and view lookups add plain reads. [`MemoryVfs`] backs unit tests;
//! [`DiskVfs`] talks to the real filesystem.

mod disk;
mod memory;

pub use disk::DiskVfs;
pub use memory::MemoryVfs;

use std::path::Path;

use veneer_types::error::Result;

/// Filesystem operations needed by the resolver and its collaborators.
pub trait Vfs {
    /// True if `path` is a directory, following symlinks.
    fn is_dir(&self, path: &Path) -> bool;

    /// True if `path` itself is a symbolic link (dangling links included).
    fn is_symlink(&self, path: &Path) -> bool;

    /// True if anything exists at `path`, following symlinks.
    fn exists(&self, path: &Path) -> bool;

    /// Create `path` and every missing parent. Existing directories are fine.
    fn create_dir_all(&mut self, path: &Path) -> Result<()>;

    /// Create a symbolic link at `target` pointing to `origin`.
    fn symlink(&mut self, origin: &Path, target: &Path) -> Result<()>;

    /// Read a whole file.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write a whole file. The parent directory must exist.
    fn write(&mut self, path: &Path, data: &[u8]) -> Result<()>;

    /// Read a file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| {
            veneer_types::VeneerError::Vfs(format!("{}: {e}", path.display()))
        })
    }
}
