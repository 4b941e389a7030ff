//! In-memory VFS implementation.
//!
//! Used by unit tests and dry runs. The whole tree lives in a
//! `BTreeMap<String, Node>` keyed by normalized absolute paths. Symbolic
//! links store a normalized destination and are followed on lookup, in any
//! path component, up to [`MAX_LINK_HOPS`] redirections.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use veneer_types::error::{Result, VeneerError};

use crate::Vfs;

/// Redirections followed before a path is considered a link loop.
const MAX_LINK_HOPS: usize = 16;

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
    Symlink(String),
}

/// A fully in-memory virtual file system.
#[derive(Debug)]
pub struct MemoryVfs {
    /// Map of normalized paths to file/directory/link nodes.
    nodes: BTreeMap<String, Node>,
    /// Prefixes under which nothing new may be created.
    read_only: Vec<String>,
}

impl MemoryVfs {
    /// Create a new in-memory VFS with only the root directory.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Dir);
        Self {
            nodes,
            read_only: Vec::new(),
        }
    }

    /// Refuse creation of any entry at or below `path`, like a directory
    /// without write permission. Existing entries stay readable.
    pub fn deny_writes_under(&mut self, path: &Path) {
        self.read_only.push(key(path));
    }

    /// Destination of the symbolic link at `path`.
    pub fn read_link(&self, path: &Path) -> Result<PathBuf> {
        let path = key(path);
        match self
            .resolve_parent(&path)
            .and_then(|loc| self.nodes.get(&loc))
        {
            Some(Node::Symlink(dest)) => Ok(PathBuf::from(dest)),
            Some(_) => Err(VeneerError::Vfs(format!("not a symlink: {path}"))),
            None => Err(VeneerError::Vfs(format!("no such path: {path}"))),
        }
    }

    fn check_writable(&self, path: &str) -> Result<()> {
        let denied = self.read_only.iter().any(|prefix| {
            prefix == "/"
                || path == prefix
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        });
        if denied {
            return Err(VeneerError::Vfs(format!("permission denied: {path}")));
        }
        Ok(())
    }

    /// Follow symlinks in every component of a normalized path. `None` when
    /// a component is missing or the link chain is too long.
    fn resolve(&self, path: &str) -> Option<String> {
        let mut current = path.to_string();
        for _ in 0..=MAX_LINK_HOPS {
            match self.step(&current) {
                Step::Resolved => return Some(current),
                Step::Redirect(next) => current = next,
                Step::Missing => return None,
            }
        }
        None
    }

    /// Scan components left to right and rewrite the first symlink found.
    fn step(&self, path: &str) -> Step {
        if path == "/" {
            return Step::Resolved;
        }
        let ends = path
            .char_indices()
            .filter(|&(i, c)| c == '/' && i > 0)
            .map(|(i, _)| i)
            .chain(std::iter::once(path.len()));
        for end in ends {
            match self.nodes.get(&path[..end]) {
                Some(Node::Symlink(dest)) => {
                    let rest = &path[end..];
                    return Step::Redirect(normalize(&format!("{dest}{rest}")).into_owned());
                },
                Some(_) => {},
                None => return Step::Missing,
            }
        }
        Step::Resolved
    }

    /// Location of the final component with only its parents resolved, so
    /// a link itself can be inspected or created.
    fn resolve_parent(&self, path: &str) -> Option<String> {
        if path == "/" {
            return Some("/".to_string());
        }
        let par = self.resolve(parent(path))?;
        Some(join(&par, file_name(path)))
    }

    fn lookup(&self, path: &Path) -> Option<&Node> {
        let resolved = self.resolve(&key(path))?;
        self.nodes.get(&resolved)
    }

    fn mkdir_p(&mut self, path: &str) -> Result<()> {
        if let Some(resolved) = self.resolve(path) {
            return match self.nodes.get(&resolved) {
                Some(Node::Dir) => Ok(()),
                _ => Err(VeneerError::Vfs(format!("not a directory: {path}"))),
            };
        }
        let par = parent(path).to_string();
        if par != path {
            self.mkdir_p(&par)?;
        }
        let location = self
            .resolve_parent(path)
            .ok_or_else(|| VeneerError::Vfs(format!("no such directory: {par}")))?;
        if self.nodes.contains_key(&location) {
            // Dangling symlink in the way.
            return Err(VeneerError::Vfs(format!("file exists: {path}")));
        }
        self.check_writable(&location)?;
        self.nodes.insert(location, Node::Dir);
        Ok(())
    }
}

impl Default for MemoryVfs {
    fn default() -> Self {
        Self::new()
    }
}

enum Step {
    Resolved,
    Redirect(String),
    Missing,
}

/// Check whether a path is already in normal form (starts with `/`, no `//`,
/// no trailing `/` unless root).
fn is_normalized(path: &str) -> bool {
    if !path.starts_with('/') {
        return false;
    }
    if path.len() > 1 && path.ends_with('/') {
        return false;
    }
    !path.contains("//")
}

/// Normalize a path: ensure leading `/`, collapse `//`, strip trailing `/`
/// (except for root). Returns the input unchanged (zero-alloc) when already
/// in normal form.
fn normalize(path: &str) -> Cow<'_, str> {
    if is_normalized(path) {
        return Cow::Borrowed(path);
    }
    let path_str = if path.starts_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{path}"))
    };
    let mut result = String::with_capacity(path_str.len());
    let mut prev_slash = false;
    for ch in path_str.chars() {
        if ch == '/' {
            if !prev_slash {
                result.push(ch);
            }
            prev_slash = true;
        } else {
            result.push(ch);
            prev_slash = false;
        }
    }
    if result.len() > 1 && result.ends_with('/') {
        result.pop();
    }
    Cow::Owned(result)
}

fn key(path: &Path) -> String {
    let raw = path.to_string_lossy();
    normalize(&raw).into_owned()
}

/// Return the parent of a normalized path.
fn parent(path: &str) -> &str {
    if path == "/" {
        return "/";
    }
    match path.rfind('/') {
        Some(0) => "/",
        Some(i) => &path[..i],
        None => "/",
    }
}

fn file_name(path: &str) -> &str {
    path.rfind('/').map_or(path, |i| &path[i + 1..])
}

fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

impl Vfs for MemoryVfs {
    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lookup(path), Some(Node::Dir))
    }

    fn is_symlink(&self, path: &Path) -> bool {
        self.resolve_parent(&key(path))
            .is_some_and(|loc| matches!(self.nodes.get(&loc), Some(Node::Symlink(_))))
    }

    fn exists(&self, path: &Path) -> bool {
        self.lookup(path).is_some()
    }

    fn create_dir_all(&mut self, path: &Path) -> Result<()> {
        self.mkdir_p(&key(path))
    }

    fn symlink(&mut self, origin: &Path, target: &Path) -> Result<()> {
        let target_key = key(target);
        let location = self
            .resolve_parent(&target_key)
            .ok_or_else(|| {
                VeneerError::Vfs(format!(
                    "parent directory does not exist: {}",
                    parent(&target_key)
                ))
            })?;
        if !matches!(self.nodes.get(parent(&location)), Some(Node::Dir)) {
            return Err(VeneerError::Vfs(format!(
                "not a directory: {}",
                parent(&target_key)
            )));
        }
        if self.nodes.contains_key(&location) {
            return Err(VeneerError::Vfs(format!("file exists: {target_key}")));
        }
        self.check_writable(&location)?;
        self.nodes.insert(location, Node::Symlink(key(origin)));
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        match self.lookup(path) {
            Some(Node::File(data)) => Ok(data.clone()),
            Some(_) => Err(VeneerError::Vfs(format!(
                "is a directory: {}",
                path.display()
            ))),
            None => Err(VeneerError::Vfs(format!("no such file: {}", path.display()))),
        }
    }

    fn write(&mut self, path: &Path, data: &[u8]) -> Result<()> {
        let path = key(path);
        let par = parent(&path);
        let location = match self.resolve(par) {
            Some(dir) if matches!(self.nodes.get(&dir), Some(Node::Dir)) => {
                join(&dir, file_name(&path))
            },
            _ => {
                return Err(VeneerError::Vfs(format!(
                    "parent directory does not exist: {par}"
                )));
            },
        };
        let location = self.resolve(&location).unwrap_or(location);
        if matches!(self.nodes.get(&location), Some(Node::Dir)) {
            return Err(VeneerError::Vfs(format!("is a directory: {path}")));
        }
        self.check_writable(&location)?;
        self.nodes.insert(location, Node::File(data.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> &Path {
        Path::new(s)
    }

    #[test]
    fn root_exists() {
        let vfs = MemoryVfs::new();
        assert!(vfs.exists(p("/")));
        assert!(vfs.is_dir(p("/")));
    }

    #[test]
    fn create_dir_all_creates_parents() {
        let mut vfs = MemoryVfs::new();
        vfs.create_dir_all(p("/a/b/c")).unwrap();
        assert!(vfs.is_dir(p("/a")));
        assert!(vfs.is_dir(p("/a/b")));
        assert!(vfs.is_dir(p("/a/b/c")));
    }

    #[test]
    fn create_dir_all_existing_is_ok() {
        let mut vfs = MemoryVfs::new();
        vfs.create_dir_all(p("/dir")).unwrap();
        vfs.create_dir_all(p("/dir")).unwrap();
        assert!(vfs.is_dir(p("/dir")));
    }

    #[test]
    fn create_dir_all_over_file_fails() {
        let mut vfs = MemoryVfs::new();
        vfs.write(p("/file"), b"x").unwrap();
        assert!(vfs.create_dir_all(p("/file")).is_err());
        assert!(vfs.create_dir_all(p("/file/sub")).is_err());
    }

    #[test]
    fn write_and_read() {
        let mut vfs = MemoryVfs::new();
        vfs.create_dir_all(p("/tmp")).unwrap();
        vfs.write(p("/tmp/test.txt"), b"hello world").unwrap();
        assert_eq!(vfs.read(p("/tmp/test.txt")).unwrap(), b"hello world");
        assert_eq!(vfs.read_to_string(p("/tmp/test.txt")).unwrap(), "hello world");
    }

    #[test]
    fn write_without_parent_fails() {
        let mut vfs = MemoryVfs::new();
        assert!(vfs.write(p("/no/such/dir/file"), b"x").is_err());
    }

    #[test]
    fn write_to_dir_path_fails() {
        let mut vfs = MemoryVfs::new();
        vfs.create_dir_all(p("/dir")).unwrap();
        assert!(vfs.write(p("/dir"), b"data").is_err());
        assert!(vfs.is_dir(p("/dir")));
    }

    #[test]
    fn read_dir_as_file_fails() {
        let mut vfs = MemoryVfs::new();
        vfs.create_dir_all(p("/dir")).unwrap();
        assert!(vfs.read(p("/dir")).is_err());
    }

    #[test]
    fn symlink_to_directory_is_followed() {
        let mut vfs = MemoryVfs::new();
        vfs.create_dir_all(p("/themes/dark/assets/fonts")).unwrap();
        vfs.write(p("/themes/dark/assets/fonts/mono.woff"), b"font")
            .unwrap();
        vfs.create_dir_all(p("/public/assets/dark")).unwrap();
        vfs.symlink(
            p("/themes/dark/assets/fonts"),
            p("/public/assets/dark/fonts"),
        )
        .unwrap();

        let link = p("/public/assets/dark/fonts");
        assert!(vfs.is_symlink(link));
        assert!(vfs.is_dir(link));
        assert_eq!(
            vfs.read_link(link).unwrap(),
            PathBuf::from("/themes/dark/assets/fonts")
        );
        assert_eq!(
            vfs.read(p("/public/assets/dark/fonts/mono.woff")).unwrap(),
            b"font"
        );
    }

    #[test]
    fn dangling_symlink_is_link_but_not_dir() {
        let mut vfs = MemoryVfs::new();
        vfs.create_dir_all(p("/public")).unwrap();
        vfs.symlink(p("/nowhere"), p("/public/css")).unwrap();
        assert!(vfs.is_symlink(p("/public/css")));
        assert!(!vfs.is_dir(p("/public/css")));
        assert!(!vfs.exists(p("/public/css")));
    }

    #[test]
    fn symlink_over_existing_entry_fails() {
        let mut vfs = MemoryVfs::new();
        vfs.create_dir_all(p("/a")).unwrap();
        vfs.create_dir_all(p("/b")).unwrap();
        assert!(vfs.symlink(p("/a"), p("/b")).is_err());
        vfs.symlink(p("/a"), p("/c")).unwrap();
        assert!(vfs.symlink(p("/b"), p("/c")).is_err());
    }

    #[test]
    fn symlink_without_parent_fails() {
        let mut vfs = MemoryVfs::new();
        assert!(vfs.symlink(p("/a"), p("/missing/link")).is_err());
    }

    #[test]
    fn link_loop_does_not_hang() {
        let mut vfs = MemoryVfs::new();
        vfs.symlink(p("/b"), p("/a")).unwrap();
        vfs.symlink(p("/a"), p("/b")).unwrap();
        assert!(!vfs.is_dir(p("/a")));
        assert!(!vfs.exists(p("/a/x")));
    }

    #[test]
    fn denied_prefix_blocks_creation() {
        let mut vfs = MemoryVfs::new();
        vfs.create_dir_all(p("/srv/existing")).unwrap();
        vfs.deny_writes_under(p("/srv"));
        assert!(vfs.create_dir_all(p("/srv/public/assets")).is_err());
        assert!(vfs.write(p("/srv/file"), b"x").is_err());
        assert!(vfs.symlink(p("/x"), p("/srv/link")).is_err());
        // Already present entries are unaffected.
        vfs.create_dir_all(p("/srv/existing")).unwrap();
        // Sibling prefixes are not denied.
        vfs.create_dir_all(p("/srvx")).unwrap();
    }

    #[test]
    fn normalize_paths() {
        let mut vfs = MemoryVfs::new();
        vfs.create_dir_all(p("/dir/")).unwrap();
        assert!(vfs.is_dir(p("/dir")));
        vfs.write(p("//dir//file"), b"ok").unwrap();
        assert_eq!(vfs.read(p("/dir/file")).unwrap(), b"ok");
    }

    #[test]
    fn relative_paths_are_rooted() {
        let mut vfs = MemoryVfs::new();
        vfs.create_dir_all(p("resources/dark")).unwrap();
        assert!(vfs.is_dir(p("/resources/dark")));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalize_is_idempotent(path in "[/a-z0-9_.]{1,50}") {
                let once = normalize(&path);
                let twice = normalize(&once);
                prop_assert_eq!(&once, &twice, "normalize must be idempotent");
            }

            #[test]
            fn normalize_never_has_double_slashes(path in "[/a-z0-9_.]{1,50}") {
                let normed = normalize(&path);
                prop_assert!(!normed.contains("//"), "found // in {normed}");
            }

            #[test]
            fn create_dir_all_then_every_parent_is_dir(
                segments in proptest::collection::vec("[a-z]{1,6}", 1..5),
            ) {
                let mut vfs = MemoryVfs::new();
                let path = format!("/{}", segments.join("/"));
                vfs.create_dir_all(Path::new(&path)).unwrap();
                let mut partial = String::new();
                for seg in &segments {
                    partial.push('/');
                    partial.push_str(seg);
                    prop_assert!(vfs.is_dir(Path::new(&partial)), "missing parent: {partial}");
                }
            }

            #[test]
            fn link_resolves_to_origin_contents(
                origin in "[a-z]{1,8}",
                file in "[a-z]{1,8}",
            ) {
                let mut vfs = MemoryVfs::new();
                let origin_dir = format!("/src/{origin}");
                vfs.create_dir_all(Path::new(&origin_dir)).unwrap();
                vfs.write(Path::new(&format!("{origin_dir}/{file}")), b"x").unwrap();
                vfs.create_dir_all(Path::new("/pub")).unwrap();
                vfs.symlink(Path::new(&origin_dir), Path::new("/pub/link")).unwrap();
                let linked = format!("/pub/link/{file}");
                prop_assert!(vfs.exists(Path::new(&linked)));
            }
        }
    }
}
