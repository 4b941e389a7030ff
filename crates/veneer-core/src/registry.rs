//! Theme registry: configured descriptors plus lazily resolved fallbacks.
//!
//! The base map comes from the `themes` table and never changes. Themes
//! missing from it are looked up once in the `<name>_theme.<name>`
//! namespace of the configuration and memoized in a second map.

use std::collections::BTreeMap;

use veneer_types::config::{ThemeConfig, ThemeDescriptor};

#[derive(Debug, Clone, Default)]
pub struct ThemeRegistry {
    base: BTreeMap<String, ThemeDescriptor>,
    cache: BTreeMap<String, ThemeDescriptor>,
    fallback: Option<ThemeConfig>,
}

impl ThemeRegistry {
    /// Registry over a fixed set of descriptors, without fallback namespaces.
    pub fn new(base: BTreeMap<String, ThemeDescriptor>) -> Self {
        Self {
            base,
            cache: BTreeMap::new(),
            fallback: None,
        }
    }

    /// Registry over the `themes` table of `config`, falling back to its
    /// other tables for unknown names.
    pub fn from_config(config: &ThemeConfig) -> Self {
        Self {
            base: config.descriptors(),
            cache: BTreeMap::new(),
            fallback: Some(config.clone()),
        }
    }

    /// True if `name` is already known. Does not consult fallback namespaces.
    pub fn has(&self, name: &str) -> bool {
        self.base.contains_key(name) || self.cache.contains_key(name)
    }

    /// Known descriptor for `name`, without fallback resolution.
    pub fn get(&self, name: &str) -> Option<&ThemeDescriptor> {
        self.base.get(name).or_else(|| self.cache.get(name))
    }

    /// Descriptor for `name`, resolving and caching the fallback namespace
    /// on first use.
    pub fn lookup(&mut self, name: &str) -> Option<ThemeDescriptor> {
        if let Some(descriptor) = self.get(name) {
            return Some(descriptor.clone());
        }
        let config = self.fallback.as_ref()?;
        let entry = match config.namespace_entry(name) {
            Ok(entry) => entry?,
            Err(e) => {
                log::warn!("Ignoring fallback for theme '{name}': {e}");
                return None;
            },
        };
        let descriptor = entry.resolve(name, &config.themes_path);
        log::debug!(
            "Resolved theme '{name}' from {name}_theme namespace: {}",
            descriptor.source_root.display()
        );
        self.cache.insert(name.to_string(), descriptor.clone());
        Some(descriptor)
    }

    /// Resolve every fallback namespace present in the configuration now,
    /// so later lookups never touch it. Returns how many were added.
    pub fn warm(&mut self) -> usize {
        let names = match &self.fallback {
            Some(config) => config.namespace_names(),
            None => return 0,
        };
        let mut added = 0;
        for name in &names {
            if !self.has(name) && self.lookup(name).is_some() {
                added += 1;
            }
        }
        added
    }

    /// Names of every known theme, configured first, then resolved fallbacks.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.base.keys().chain(self.cache.keys()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.base.len() + self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
