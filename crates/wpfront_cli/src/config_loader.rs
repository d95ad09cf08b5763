use std::path::Path;

use anyhow::{Result, bail};
use wpfront_core::config::{SiteConfig, load_site_config};

pub const CONFIG_FILE: &str = "wpfront.yaml";

/// Resolves the site configuration and applies `PUBLIC_CMS_URL`.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<SiteConfig> {
    Ok(resolve_config(root, explicit)?.with_env_overrides())
}

/// An explicit path must exist. Without one, `wpfront.yaml` under `root` is
/// read when present and the built-in defaults are used otherwise.
pub fn resolve_config(root: &Path, explicit: Option<&Path>) -> Result<SiteConfig> {
    if let Some(path) = explicit {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        };
        if !path.exists() {
            bail!("config file {} does not exist", path.display());
        }
        return load_site_config(&path);
    }
    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        tracing::debug!(root = %root.display(), "no {CONFIG_FILE}, using defaults");
        return Ok(SiteConfig::default());
    }
    load_site_config(&config_path)
}
