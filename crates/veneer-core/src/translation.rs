//! Translation lookups.
//!
//! [`Translator`] is the seam to the host's translation service. [`Catalog`]
//! is a minimal in-memory implementation: `(locale, key)` entries, a
//! fallback locale, and `:name` placeholder substitution. Keys of a
//! registered namespace are written `namespace::group.key`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use veneer_types::error::{Result, VeneerError};
use veneer_vfs::Vfs;

use crate::views::NAMESPACE_SEPARATOR;

/// Placeholder values substituted into a translated line.
pub type Placeholders = BTreeMap<String, String>;

/// Host translation service.
pub trait Translator {
    /// Register `dir` as the source of translations for `namespace`.
    fn add_namespace(&mut self, namespace: &str, dir: &Path);

    /// True if `key` has a line in the current (or fallback) locale.
    fn has(&self, key: &str) -> bool;

    /// Translate `key` into `locale`, substituting `placeholders`.
    fn translate(&self, key: &str, placeholders: &Placeholders, locale: &str) -> String;

    /// Current locale.
    fn locale(&self) -> &str;
}

/// In-memory [`Translator`].
#[derive(Debug, Clone)]
pub struct Catalog {
    locale: String,
    fallback_locale: Option<String>,
    /// locale -> key -> line
    lines: HashMap<String, HashMap<String, String>>,
    namespaces: BTreeMap<String, PathBuf>,
}

impl Catalog {
    pub fn new(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            fallback_locale: None,
            lines: HashMap::new(),
            namespaces: BTreeMap::new(),
        }
    }

    /// Consult `locale` when a key is missing from the requested one.
    pub fn with_fallback(mut self, locale: &str) -> Self {
        self.fallback_locale = Some(locale.to_string());
        self
    }

    pub fn set_locale(&mut self, locale: &str) {
        self.locale = locale.to_string();
    }

    pub fn insert(&mut self, locale: &str, key: &str, line: &str) {
        self.lines
            .entry(locale.to_string())
            .or_default()
            .insert(key.to_string(), line.to_string());
    }

    /// Directory registered for `namespace`.
    pub fn namespace_dir(&self, namespace: &str) -> Option<&Path> {
        self.namespaces.get(namespace).map(PathBuf::as_path)
    }

    /// Load lines from a JSON object. Nested objects are flattened with `.`;
    /// keys are prefixed with `namespace::` when one is given. Returns the
    /// number of lines added.
    pub fn load_json(
        &mut self,
        locale: &str,
        namespace: Option<&str>,
        json: &str,
    ) -> Result<usize> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let serde_json::Value::Object(map) = value else {
            return Err(VeneerError::Config(format!(
                "translations for locale '{locale}' must be a JSON object"
            )));
        };
        let prefix = namespace.map(|ns| format!("{ns}{NAMESPACE_SEPARATOR}"));
        let mut flat = Vec::new();
        flatten("", &map, &mut flat);
        let count = flat.len();
        for (key, line) in flat {
            let key = match &prefix {
                Some(prefix) => format!("{prefix}{key}"),
                None => key,
            };
            self.insert(locale, &key, &line);
        }
        Ok(count)
    }

    /// Load `<dir>/<locale>.json` of a registered namespace. A missing file
    /// loads nothing.
    pub fn load_namespace(
        &mut self,
        vfs: &impl Vfs,
        namespace: &str,
        locale: &str,
    ) -> Result<usize> {
        let dir = self.namespace_dir(namespace).ok_or_else(|| {
            VeneerError::Config(format!("unknown translation namespace '{namespace}'"))
        })?;
        let file = dir.join(format!("{locale}.json"));
        if !vfs.exists(&file) {
            log::debug!("No '{locale}' translations for '{namespace}' at {}", file.display());
            return Ok(0);
        }
        let json = vfs.read_to_string(&file)?;
        self.load_json(locale, Some(namespace), &json)
    }

    fn line(&self, key: &str, locale: &str) -> Option<&str> {
        self.line_in(key, locale).or_else(|| {
            self.fallback_locale
                .as_deref()
                .and_then(|fallback| self.line_in(key, fallback))
        })
    }

    fn line_in(&self, key: &str, locale: &str) -> Option<&str> {
        self.lines
            .get(locale)
            .and_then(|lines| lines.get(key))
            .map(String::as_str)
    }
}

fn flatten(
    prefix: &str,
    map: &serde_json::Map<String, serde_json::Value>,
    out: &mut Vec<(String, String)>,
) {
    for (key, value) in map {
        let full = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            serde_json::Value::Object(inner) => flatten(&full, inner, out),
            serde_json::Value::String(line) => out.push((full, line.clone())),
            serde_json::Value::Number(n) => out.push((full, n.to_string())),
            serde_json::Value::Bool(b) => out.push((full, b.to_string())),
            serde_json::Value::Null | serde_json::Value::Array(_) => {
                log::warn!("Skipping translation '{full}': not a string");
            },
        }
    }
}

/// Replace `:name`, `:Name` and `:NAME` with the value in matching case.
/// Longer names go first so `:username` is not clobbered by `:user`.
fn substitute(line: &str, placeholders: &Placeholders) -> String {
    let mut ordered: Vec<(&String, &String)> = placeholders.iter().collect();
    ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    let mut out = line.to_string();
    for (name, value) in ordered {
        out = out.replace(&format!(":{}", name.to_uppercase()), &value.to_uppercase());
        out = out.replace(&format!(":{}", capitalize(name)), &capitalize(value));
        out = out.replace(&format!(":{name}"), value);
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Translator for Catalog {
    fn add_namespace(&mut self, namespace: &str, dir: &Path) {
        self.namespaces
            .insert(namespace.to_string(), dir.to_path_buf());
    }

    fn has(&self, key: &str) -> bool {
        self.line(key, &self.locale).is_some()
    }

    fn translate(&self, key: &str, placeholders: &Placeholders, locale: &str) -> String {
        match self.line(key, locale) {
            Some(line) => substitute(line, placeholders),
            None => key.to_string(),
        }
    }

    fn locale(&self) -> &str {
        &self.locale
    }
}
