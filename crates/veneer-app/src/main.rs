//! veneer entry point.
//!
//! Loads a theme configuration, activates one theme against the real
//! filesystem and reports what was published.
//!
//! Usage: `veneer-app [CONFIG] [THEME]`. Missing arguments fall back to the
//! `VENEER_CONFIG` / `VENEER_THEME` environment variables, then to
//! `veneer.toml` and the config's `default_theme`.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use veneer_core::config::ThemeConfig;
use veneer_core::vfs::DiskVfs;
use veneer_core::{Activation, Catalog, PublishOutcome, ThemeResolver, Translator, ViewPaths};

const DEFAULT_CONFIG: &str = "veneer.toml";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config_path: PathBuf = args
        .next()
        .or_else(|| std::env::var("VENEER_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string())
        .into();
    let config = ThemeConfig::from_file(&config_path)?;

    // Resolve theme from CLI arg, VENEER_THEME env var, or config.
    let Some(theme) = args
        .next()
        .or_else(|| std::env::var("VENEER_THEME").ok())
        .or_else(|| config.default_theme.clone())
    else {
        bail!(
            "no theme requested: pass one, set VENEER_THEME or default_theme in {}",
            config_path.display()
        );
    };

    let mut resolver =
        ThemeResolver::from_config(&config, DiskVfs::new(), ViewPaths::new(), Catalog::new("en"))
            .with_context(|| format!("preparing {}", config.public_assets_root().display()))?;
    log::info!(
        "{} theme(s) configured, publishing into {}",
        resolver.registry().len(),
        resolver.options().public_assets_root.display()
    );

    let report = match resolver.activate(&theme)? {
        Activation::Activated(report) => report,
        Activation::AlreadyActive { active } => bail!("theme '{active}' was already active"),
    };

    for folder in &report.published {
        match folder.outcome {
            PublishOutcome::Linked | PublishOutcome::AlreadyLinked => log::info!(
                "  {}: {} -> {} ({})",
                folder.folder,
                folder.target.display(),
                folder.origin.display(),
                folder.outcome
            ),
            PublishOutcome::MissingSource => log::info!(
                "  {}: skipped, {} does not exist",
                folder.folder,
                folder.origin.display()
            ),
        }
    }

    let fs = *resolver.fs();
    let locale = resolver.translator().locale().to_string();
    let lines = resolver
        .translator_mut()
        .load_namespace(&fs, &theme, &locale)?;
    if lines == 0 {
        log::warn!(
            "Theme '{theme}' has no '{locale}' translations in {}",
            report.descriptor.lang_dir().display()
        );
    } else {
        log::info!("Loaded {lines} '{locale}' translation line(s) for '{theme}'");
    }

    if let Some(url) = resolver.asset_url("css/app.css") {
        log::info!("Stylesheets resolve under {url}");
    }

    Ok(())
}
