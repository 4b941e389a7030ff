//! View search locations.
//!
//! [`ViewFinder`] is the seam to the host's template engine. [`ViewPaths`]
//! is a minimal in-memory finder: the most recently prepended directory is
//! searched first.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use veneer_vfs::Vfs;

/// Separator between a namespace and a view name (`dark::layouts.main`).
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Host view finder.
pub trait ViewFinder {
    /// Search `dir` before every location registered so far.
    fn prepend_location(&mut self, dir: &Path);

    /// Search `dir` first for views addressed as `namespace::view`.
    fn prepend_namespace(&mut self, namespace: &str, dir: &Path);
}

/// In-memory [`ViewFinder`] resolving dotted view names to files.
#[derive(Debug, Clone)]
pub struct ViewPaths {
    /// Highest priority first.
    locations: Vec<PathBuf>,
    namespaces: BTreeMap<String, Vec<PathBuf>>,
    extension: String,
}

impl Default for ViewPaths {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewPaths {
    pub fn new() -> Self {
        Self {
            locations: Vec::new(),
            namespaces: BTreeMap::new(),
            extension: "html".to_string(),
        }
    }

    /// Use `extension` (without the dot) for view files.
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Search `dir` after every location registered so far.
    pub fn add_location(&mut self, dir: &Path) {
        self.locations.push(dir.to_path_buf());
    }

    /// Registered locations, highest priority first.
    pub fn locations(&self) -> &[PathBuf] {
        &self.locations
    }

    /// Directories of `namespace`, highest priority first.
    pub fn namespace(&self, namespace: &str) -> &[PathBuf] {
        self.namespaces
            .get(namespace)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every file path `view` could resolve to, in search order.
    ///
    /// `layouts.main` maps to `<dir>/layouts/main.<ext>` under each location;
    /// `dark::layouts.main` searches only the `dark` namespace.
    pub fn candidates(&self, view: &str) -> Vec<PathBuf> {
        let (dirs, name) = match view.split_once(NAMESPACE_SEPARATOR) {
            Some((ns, name)) => (self.namespace(ns), name),
            None => (self.locations.as_slice(), view),
        };
        let mut relative: PathBuf = name.split('.').collect();
        relative.set_extension(&self.extension);
        dirs.iter().map(|dir| dir.join(&relative)).collect()
    }

    /// First existing file for `view`.
    pub fn find(&self, vfs: &impl Vfs, view: &str) -> Option<PathBuf> {
        self.candidates(view)
            .into_iter()
            .find(|path| vfs.exists(path) && !vfs.is_dir(path))
    }
}

impl ViewFinder for ViewPaths {
    fn prepend_location(&mut self, dir: &Path) {
        self.locations.insert(0, dir.to_path_buf());
    }

    fn prepend_namespace(&mut self, namespace: &str, dir: &Path) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(0, dir.to_path_buf());
    }
}

#[cfg(test)]
mod tests {
    use veneer_vfs::MemoryVfs;

    use super::*;

    #[test]
    fn prepend_puts_location_first() {
        let mut views = ViewPaths::new();
        views.add_location(Path::new("/app/views"));
        views.prepend_location(Path::new("/themes/dark"));
        views.prepend_location(Path::new("/themes/dark/views"));
        assert_eq!(
            views.locations(),
            &[
                PathBuf::from("/themes/dark/views"),
                PathBuf::from("/themes/dark"),
                PathBuf::from("/app/views"),
            ]
        );
    }

    #[test]
    fn namespace_most_recent_first() {
        let mut views = ViewPaths::new();
        views.prepend_namespace("dark", Path::new("/a"));
        views.prepend_namespace("dark", Path::new("/b"));
        assert_eq!(
            views.namespace("dark"),
            &[PathBuf::from("/b"), PathBuf::from("/a")]
        );
        assert!(views.namespace("light").is_empty());
    }

    #[test]
    fn candidates_map_dots_to_dirs() {
        let mut views = ViewPaths::new();
        views.add_location(Path::new("/app/views"));
        assert_eq!(
            views.candidates("layouts.main"),
            vec![PathBuf::from("/app/views/layouts/main.html")]
        );
    }

    #[test]
    fn namespaced_candidates_skip_locations() {
        let mut views = ViewPaths::new().with_extension(".tera");
        views.add_location(Path::new("/app/views"));
        views.prepend_namespace("dark", Path::new("/themes/dark/views"));
        assert_eq!(
            views.candidates("dark::home"),
            vec![PathBuf::from("/themes/dark/views/home.tera")]
        );
        assert!(views.candidates("light::home").is_empty());
    }

    #[test]
    fn find_prefers_prepended_location() {
        let mut vfs = MemoryVfs::new();
        vfs.create_dir_all(Path::new("/app/views")).unwrap();
        vfs.create_dir_all(Path::new("/themes/dark/views")).unwrap();
        vfs.write(Path::new("/app/views/home.html"), b"app").unwrap();
        vfs.write(Path::new("/app/views/about.html"), b"app")
            .unwrap();
        vfs.write(Path::new("/themes/dark/views/home.html"), b"dark")
            .unwrap();

        let mut views = ViewPaths::new();
        views.add_location(Path::new("/app/views"));
        views.prepend_location(Path::new("/themes/dark/views"));

        assert_eq!(
            views.find(&vfs, "home"),
            Some(PathBuf::from("/themes/dark/views/home.html"))
        );
        assert_eq!(
            views.find(&vfs, "about"),
            Some(PathBuf::from("/app/views/about.html"))
        );
        assert_eq!(views.find(&vfs, "missing"), None);
    }
}
