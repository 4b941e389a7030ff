//! Theme configuration loaded from `veneer.toml`.
//!
//! ```toml
//! public_root = "public"
//! public_assets_path = "assets"
//! themes_path = "resources"
//! create_symlinks = true
//! symlink_folders = ["css", "js", "fonts"]
//!
//! [themes.dark]
//! theme_path = "resources/dark"
//! theme_assets_path = "assets"
//!
//! # Fallback namespace, resolved on first lookup of "light".
//! [light_theme.light]
//! theme_path = "vendor/light"
//! ```

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, VeneerError};

/// Top-level theme configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeConfig {
    /// Public web root of the host application.
    #[serde(default = "default_public_root")]
    pub public_root: PathBuf,
    /// Directory under `public_root` receiving every theme's published assets.
    #[serde(default = "default_public_assets_path")]
    pub public_assets_path: PathBuf,
    /// Directory holding one subdirectory per theme, used when an entry
    /// omits `theme_path`.
    #[serde(default = "default_themes_path")]
    pub themes_path: PathBuf,
    /// Whether activation symlinks asset folders into the public tree.
    #[serde(default)]
    pub create_symlinks: bool,
    /// Asset subfolders eligible for publishing, in publishing order.
    #[serde(default)]
    pub symlink_folders: Vec<String>,
    /// Statically configured themes.
    #[serde(default)]
    pub themes: BTreeMap<String, ThemeEntry>,
    /// Theme activated by the demo binary when none is requested.
    #[serde(default)]
    pub default_theme: Option<String>,
    /// Every other top-level table. Searched for `<name>_theme.<name>` when a
    /// theme is missing from `themes`.
    #[serde(flatten)]
    pub namespaces: toml::Table,
}

fn default_public_root() -> PathBuf {
    PathBuf::from("public")
}
fn default_public_assets_path() -> PathBuf {
    PathBuf::from("assets")
}
fn default_themes_path() -> PathBuf {
    PathBuf::from("resources")
}
fn default_assets_subpath() -> PathBuf {
    PathBuf::from("assets")
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            public_root: default_public_root(),
            public_assets_path: default_public_assets_path(),
            themes_path: default_themes_path(),
            create_symlinks: false,
            symlink_folders: Vec::new(),
            themes: BTreeMap::new(),
            default_theme: None,
            namespaces: toml::Table::new(),
        }
    }
}

/// A theme entry as written in the configuration. Missing fields fall back
/// to `<themes_path>/<name>` and `assets`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ThemeEntry {
    #[serde(default)]
    pub theme_path: Option<PathBuf>,
    #[serde(default)]
    pub theme_assets_path: Option<PathBuf>,
}

impl ThemeEntry {
    /// Resolve this entry into a descriptor for theme `name`.
    pub fn resolve(&self, name: &str, themes_path: &Path) -> ThemeDescriptor {
        ThemeDescriptor {
            source_root: self
                .theme_path
                .clone()
                .unwrap_or_else(|| themes_path.join(name)),
            assets_subpath: self
                .theme_assets_path
                .clone()
                .unwrap_or_else(default_assets_subpath),
        }
    }
}

/// Resolved location metadata of one theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeDescriptor {
    /// Root of the theme's source tree (`views/`, `lang/`, assets).
    pub source_root: PathBuf,
    /// Where publishable asset subfolders live, relative to `source_root`.
    pub assets_subpath: PathBuf,
}

impl ThemeDescriptor {
    pub fn new(source_root: impl Into<PathBuf>, assets_subpath: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            assets_subpath: assets_subpath.into(),
        }
    }

    pub fn views_dir(&self) -> PathBuf {
        self.source_root.join("views")
    }

    pub fn lang_dir(&self) -> PathBuf {
        self.source_root.join("lang")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.source_root.join(&self.assets_subpath)
    }
}

impl ThemeConfig {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: ThemeConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| VeneerError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml(&text)
            .map_err(|e| VeneerError::Config(format!("{}: {e}", path.display())))?;
        log::debug!(
            "Loaded {} theme(s) from {}",
            config.themes.len(),
            path.display()
        );
        Ok(config)
    }

    /// Directory receiving published assets: `public_root/public_assets_path`.
    pub fn public_assets_root(&self) -> PathBuf {
        self.public_root.join(&self.public_assets_path)
    }

    /// Descriptors of every statically configured theme.
    pub fn descriptors(&self) -> BTreeMap<String, ThemeDescriptor> {
        self.themes
            .iter()
            .map(|(name, entry)| (name.clone(), entry.resolve(name, &self.themes_path)))
            .collect()
    }

    /// Read the fallback namespace `<name>_theme.<name>`.
    ///
    /// `Ok(None)` when the namespace is absent; an error when present but
    /// not shaped like a theme entry.
    pub fn namespace_entry(&self, name: &str) -> Result<Option<ThemeEntry>> {
        let Some(value) = self
            .namespaces
            .get(&format!("{name}_theme"))
            .and_then(|ns| ns.get(name))
        else {
            return Ok(None);
        };
        value
            .clone()
            .try_into::<ThemeEntry>()
            .map(Some)
            .map_err(|e| VeneerError::Config(format!("{name}_theme.{name}: {e}")))
    }

    /// Names of every fallback namespace `<name>_theme.<name>` present.
    pub fn namespace_names(&self) -> Vec<String> {
        self.namespaces
            .iter()
            .filter_map(|(key, value)| {
                let name = key.strip_suffix("_theme")?;
                value.get(name).map(|_| name.to_string())
            })
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if let Some(name) = self.themes.keys().find(|name| name.is_empty()) {
            return Err(VeneerError::Config(format!("invalid theme name {name:?}")));
        }
        for folder in &self.symlink_folders {
            let mut components = Path::new(folder).components();
            let single_normal = matches!(components.next(), Some(Component::Normal(_)))
                && components.next().is_none();
            if !single_normal {
                return Err(VeneerError::Config(format!(
                    "symlink_folders: {folder:?} must be a single folder name"
                )));
            }
        }
        Ok(())
    }
}
