//! Real filesystem backend.

use std::fs;
use std::io;
use std::path::Path;

use veneer_types::error::Result;

use crate::Vfs;

/// [`Vfs`] backed by `std::fs`. Paths are used as given, relative paths
/// resolve against the process working directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskVfs;

impl DiskVfs {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
fn make_link(origin: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(origin, target)
}

#[cfg(windows)]
fn make_link(origin: &Path, target: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(origin, target)
}

impl Vfs for DiskVfs {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        path.is_symlink()
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&mut self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        Ok(())
    }

    fn symlink(&mut self, origin: &Path, target: &Path) -> Result<()> {
        // A relative origin would be resolved against the link's directory.
        let origin = std::path::absolute(origin)?;
        log::trace!("symlink {} -> {}", target.display(), origin.display());
        make_link(&origin, target)?;
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(fs::read(path)?)
    }

    fn write(&mut self, path: &Path, data: &[u8]) -> Result<()> {
        fs::write(path, data)?;
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn create_dir_all_and_is_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let mut vfs = DiskVfs::new();
        let nested = tmp.path().join("public/assets/dark");
        vfs.create_dir_all(&nested).unwrap();
        assert!(vfs.is_dir(&nested));
        assert!(!vfs.is_symlink(&nested));
    }

    #[test]
    fn create_dir_all_under_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let mut vfs = DiskVfs::new();
        let file = tmp.path().join("blocker");
        vfs.write(&file, b"x").unwrap();
        assert!(vfs.create_dir_all(&file.join("sub")).is_err());
    }

    #[test]
    fn symlink_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let mut vfs = DiskVfs::new();
        let origin = tmp.path().join("themes/dark/assets/fonts");
        vfs.create_dir_all(&origin).unwrap();
        vfs.write(&origin.join("mono.woff"), b"font").unwrap();
        let target = tmp.path().join("fonts");
        vfs.symlink(&origin, &target).unwrap();

        assert!(vfs.is_symlink(&target));
        assert!(vfs.is_dir(&target));
        assert_eq!(fs::read_link(&target).unwrap(), origin);
        assert_eq!(vfs.read(&target.join("mono.woff")).unwrap(), b"font");
    }

    #[test]
    fn dangling_symlink() {
        let tmp = tempfile::tempdir().unwrap();
        let mut vfs = DiskVfs::new();
        let target = tmp.path().join("css");
        vfs.symlink(&tmp.path().join("missing"), &target).unwrap();
        assert!(vfs.is_symlink(&target));
        assert!(!vfs.is_dir(&target));
        assert!(!vfs.exists(&target));
    }
}
