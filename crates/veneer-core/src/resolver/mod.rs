//! Theme activation and path resolution.
//!
//! A [`ThemeResolver`] owns the registry, the publishing options and the
//! three collaborators (filesystem, view finder, translator). Activation
//! runs at most once per resolver: the first successful
//! [`ThemeResolver::activate`] fixes the active theme, later calls are
//! reported as [`Activation::AlreadyActive`] and change nothing.
//!
//! Mutating calls take `&mut self`. Sharing a resolver between threads
//! means wrapping it in a `Mutex`, which makes the active-theme check and
//! the final write a single critical section.

use std::fmt;
use std::path::{Path, PathBuf};

use veneer_types::config::{ThemeConfig, ThemeDescriptor};
use veneer_types::error::{Result, VeneerError};
use veneer_vfs::Vfs;

use crate::registry::ThemeRegistry;
use crate::translation::{Placeholders, Translator};
use crate::views::{NAMESPACE_SEPARATOR, ViewFinder};


/// Where published assets go and what gets published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOptions {
    /// Directory receiving `<theme>/<folder>` links for every theme.
    pub public_assets_root: PathBuf,
    /// Whether activation creates symlinks at all.
    pub create_symlinks: bool,
    /// Asset subfolders to link, in order.
    pub symlink_folders: Vec<String>,
    /// Web path of `public_assets_root`, e.g. `/assets`.
    pub url_prefix: String,
}

impl PublishOptions {
    /// Options with publishing disabled. The URL prefix is derived from the
    /// last component of `public_assets_root`.
    pub fn new(public_assets_root: impl Into<PathBuf>) -> Self {
        let public_assets_root = public_assets_root.into();
        let url_prefix = public_assets_root
            .file_name()
            .map(|name| format!("/{}", name.to_string_lossy()))
            .unwrap_or_default();
        Self {
            public_assets_root,
            create_symlinks: false,
            symlink_folders: Vec::new(),
            url_prefix,
        }
    }

    /// Enable publishing of `folders`.
    pub fn with_symlinks<S: Into<String>>(
        mut self,
        folders: impl IntoIterator<Item = S>,
    ) -> Self {
        self.create_symlinks = true;
        self.symlink_folders = folders.into_iter().map(Into::into).collect();
        self
    }

    pub fn from_config(config: &ThemeConfig) -> Self {
        let url_path: Vec<String> = config
            .public_assets_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .filter(|c| c != "/" && c != ".")
            .collect();
        Self {
            public_assets_root: config.public_assets_root(),
            create_symlinks: config.create_symlinks,
            symlink_folders: config.symlink_folders.clone(),
            url_prefix: format!("/{}", url_path.join("/")),
        }
    }
}

/// Result of publishing one asset folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A new link was created.
    Linked,
    /// The target already is a symlink; left untouched.
    AlreadyLinked,
    /// The theme has no such asset directory; nothing to link.
    MissingSource,
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linked => write!(f, "linked"),
            Self::AlreadyLinked => write!(f, "already linked"),
            Self::MissingSource => write!(f, "missing source"),
        }
    }
}

/// One entry of an activation's publishing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedFolder {
    pub folder: String,
    /// Theme-side asset directory.
    pub origin: PathBuf,
    /// Public-side link location.
    pub target: PathBuf,
    pub outcome: PublishOutcome,
}

/// What a successful activation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationReport {
    pub theme: String,
    pub descriptor: ThemeDescriptor,
    /// Empty when symlink publishing is disabled.
    pub published: Vec<PublishedFolder>,
}

/// Outcome of [`ThemeResolver::activate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The requested theme is now active.
    Activated(ActivationReport),
    /// A theme was already active; the request was ignored.
    AlreadyActive { active: String },
}

/// Resolves, activates and publishes themes.
#[derive(Debug)]
pub struct ThemeResolver<F, V, T> {
    options: PublishOptions,
    registry: ThemeRegistry,
    active_theme: Option<String>,
    fs: F,
    views: V,
    translator: T,
}

/// Create `dir` unless it already is a directory.
fn ensure_dir(fs: &mut impl Vfs, dir: &Path) -> Result<()> {
    if fs.is_dir(dir) {
        return Ok(());
    }
    fs.create_dir_all(dir)
        .map_err(|e| VeneerError::DirectoryCreation {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })
}

impl<F: Vfs, V: ViewFinder, T: Translator> ThemeResolver<F, V, T> {
    /// Build a resolver, creating `options.public_assets_root` if needed.
    pub fn new(
        options: PublishOptions,
        registry: ThemeRegistry,
        mut fs: F,
        views: V,
        translator: T,
    ) -> Result<Self> {
        let root = &options.public_assets_root;
        ensure_dir(&mut fs, root)?;
        if !fs.is_dir(root) {
            return Err(VeneerError::DirectoryMissing(root.clone()));
        }
        Ok(Self {
            options,
            registry,
            active_theme: None,
            fs,
            views,
            translator,
        })
    }

    /// Build a resolver from a loaded configuration.
    pub fn from_config(config: &ThemeConfig, fs: F, views: V, translator: T) -> Result<Self> {
        Self::new(
            PublishOptions::from_config(config),
            ThemeRegistry::from_config(config),
            fs,
            views,
            translator,
        )
    }

    /// True if `name` is a known theme. Fallback namespaces are not consulted.
    pub fn has(&self, name: &str) -> bool {
        self.registry.has(name)
    }

    /// Descriptor of `name`, resolving its fallback namespace if needed.
    pub fn lookup(&mut self, name: &str) -> Option<ThemeDescriptor> {
        self.registry.lookup(name)
    }

    /// Known descriptor of `name`, without fallback resolution.
    pub fn descriptor(&self, name: &str) -> Option<&ThemeDescriptor> {
        self.registry.get(name)
    }

    /// Activate `name`: create its public directory, publish its asset
    /// folders, and register its views and translations.
    ///
    /// A no-op once any theme is active, even for a different name. The
    /// name is not looked up in that case, so an unknown name also yields
    /// [`Activation::AlreadyActive`] rather than [`VeneerError::InvalidTheme`].
    pub fn activate(&mut self, name: &str) -> Result<Activation> {
        if let Some(active) = &self.active_theme {
            if active != name {
                log::warn!("Ignoring activation of theme '{name}': '{active}' is already active");
            }
            return Ok(Activation::AlreadyActive {
                active: active.clone(),
            });
        }

        if name.is_empty() {
            return Err(VeneerError::InvalidTheme(name.to_string()));
        }
        let descriptor = self
            .registry
            .lookup(name)
            .ok_or_else(|| VeneerError::InvalidTheme(name.to_string()))?;

        ensure_dir(&mut self.fs, &self.options.public_assets_root.join(name))?;

        let published = if self.options.create_symlinks {
            self.publish(name, &descriptor)?
        } else {
            Vec::new()
        };

        let views_dir = descriptor.views_dir();
        self.views.prepend_location(&descriptor.source_root);
        self.views.prepend_location(&views_dir);
        self.views.prepend_namespace(name, &views_dir);
        self.translator.add_namespace(name, &descriptor.lang_dir());

        log::info!(
            "Activated theme '{name}' from {} ({} asset folder(s) linked)",
            descriptor.source_root.display(),
            published
                .iter()
                .filter(|p| p.outcome == PublishOutcome::Linked)
                .count(),
        );
        self.active_theme = Some(name.to_string());

        Ok(Activation::Activated(ActivationReport {
            theme: name.to_string(),
            descriptor,
            published,
        }))
    }

    /// Link every configured asset folder of `name` into the public tree.
    fn publish(
        &mut self,
        name: &str,
        descriptor: &ThemeDescriptor,
    ) -> Result<Vec<PublishedFolder>> {
        let assets = descriptor.assets_dir();
        let public_dir = self.options.public_assets_root.join(name);
        let mut published = Vec::with_capacity(self.options.symlink_folders.len());

        for folder in &self.options.symlink_folders {
            let origin = assets.join(folder);
            let target = public_dir.join(folder);
            let outcome = if self.fs.is_symlink(&target) {
                PublishOutcome::AlreadyLinked
            } else if !self.fs.is_dir(&origin) {
                PublishOutcome::MissingSource
            } else {
                self.fs.symlink(&origin, &target)?;
                PublishOutcome::Linked
            };
            log::debug!(
                "Publish {name}/{folder}: {outcome} ({} -> {})",
                target.display(),
                origin.display()
            );
            published.push(PublishedFolder {
                folder: folder.clone(),
                origin,
                target,
                outcome,
            });
        }
        Ok(published)
    }

    /// `public_assets_root/relative`.
    pub fn public_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.options.public_assets_root.join(relative)
    }

    /// `source_root/relative`.
    pub fn theme_source_path(source_root: &Path, relative: impl AsRef<Path>) -> PathBuf {
        source_root.join(relative)
    }

    /// `public_assets_root/<active theme>/relative`, once a theme is active.
    pub fn active_assets_path(&self, relative: impl AsRef<Path>) -> Option<PathBuf> {
        let theme = self.active_theme.as_deref()?;
        Some(self.options.public_assets_root.join(theme).join(relative))
    }

    /// Web path of an asset of the active theme: `/assets/dark/css/app.css`.
    pub fn asset_url(&self, relative: &str) -> Option<String> {
        let theme = self.active_theme.as_deref()?;
        Some(format!(
            "{}/{theme}/{}",
            self.options.url_prefix.trim_end_matches('/'),
            relative.trim_start_matches('/')
        ))
    }

    pub fn current_theme(&self) -> Option<&str> {
        self.active_theme.as_deref()
    }

    pub fn current_descriptor(&self) -> Option<&ThemeDescriptor> {
        self.registry.get(self.active_theme.as_deref()?)
    }

    /// The key [`Self::resolve_translation`] hands to the translator.
    ///
    /// `ns::key` is used as is; a bare key is tried under the active
    /// theme's namespace first and falls back to the bare key when the
    /// translator does not know it.
    pub fn translation_key(&self, key: &str) -> String {
        if let Some((namespace, rest)) = key.split_once(NAMESPACE_SEPARATOR) {
            if namespace.is_empty() {
                return rest.to_string();
            }
            return key.to_string();
        }
        if let Some(theme) = &self.active_theme {
            let themed = format!("{theme}{NAMESPACE_SEPARATOR}{key}");
            if self.translator.has(&themed) {
                return themed;
            }
        }
        key.to_string()
    }

    /// Translate `key` in the translator's current locale, preferring the
    /// active theme's lines.
    pub fn resolve_translation(&self, key: &str, placeholders: &Placeholders) -> String {
        let key = self.translation_key(key);
        self.translator
            .translate(&key, placeholders, self.translator.locale())
    }

    pub fn options(&self) -> &PublishOptions {
        &self.options
    }

    pub fn registry(&self) -> &ThemeRegistry {
        &self.registry
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn views(&self) -> &V {
        &self.views
    }

    pub fn translator(&self) -> &T {
        &self.translator
    }

    /// Mutable access to the translator, e.g. to load catalogs after
    /// activation registered the theme's namespace.
    pub fn translator_mut(&mut self) -> &mut T {
        &mut self.translator
    }
}
