use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use wpfront_core::api::{ContentClient, Transport};
use wpfront_core::config::SiteConfig;
use wpfront_core::endpoints::{Endpoint, build_search_index_json, build_sitemap_xml};
use wpfront_core::sitemap::render_sitemap_index;

/// Writes every generated endpoint under `out_dir`, mirroring its URL path.
/// Unlike the live endpoints, an upstream failure aborts the export.
pub fn export_endpoints<T: Transport>(
    client: &ContentClient<T>,
    config: &SiteConfig,
    out_dir: &Path,
    now: DateTime<Utc>,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for endpoint in Endpoint::ALL {
        let body = match endpoint {
            Endpoint::SearchIndex => {
                build_search_index_json(client).context("failed to build search index")?
            }
            Endpoint::Sitemap => {
                build_sitemap_xml(client, config, now).context("failed to build sitemap")?
            }
            Endpoint::SitemapIndex => render_sitemap_index(&config.site.base_url, now),
        };
        let path = out_dir.join(endpoint.path().trim_start_matches('/'));
        write_file(&path, &body)?;
        tracing::info!(path = %path.display(), "wrote {}", endpoint.path());
        written.push(path);
    }
    Ok(written)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
