//! Generated endpoints: search index, sitemap and sitemap index.
//!
//! Bodies are built from live CMS data on every call. Upstream failures are
//! logged and answered with a 500 carrying a minimal body; nothing is
//! retried or cached.

use chrono::{DateTime, Utc};

use crate::api::{ContentClient, Transport};
use crate::config::SiteConfig;
use crate::error::EndpointError;
use crate::search::build_search_index;
use crate::sitemap::{render_sitemap, render_sitemap_index};

pub const CACHE_CONTROL: &str = "public, max-age=3600";

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const XML_CONTENT_TYPE: &str = "application/xml";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

pub const SEARCH_INDEX_ERROR: &str = "Error al obtener posts";
pub const SITEMAP_ERROR: &str = "Error generating sitemap";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub cache_control: Option<&'static str>,
    pub body: String,
}

impl EndpointResponse {
    fn ok(content_type: &'static str, body: String) -> Self {
        Self {
            status: 200,
            content_type,
            cache_control: Some(CACHE_CONTROL),
            body,
        }
    }

    fn server_error(content_type: &'static str, body: String) -> Self {
        Self {
            status: 500,
            content_type,
            cache_control: None,
            body,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    SearchIndex,
    Sitemap,
    SitemapIndex,
}

impl Endpoint {
    pub const ALL: [Endpoint; 3] = [
        Endpoint::SearchIndex,
        Endpoint::Sitemap,
        Endpoint::SitemapIndex,
    ];

    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/api/search.json" => Some(Endpoint::SearchIndex),
            "/sitemap.xml" => Some(Endpoint::Sitemap),
            "/sitemap-index.xml" => Some(Endpoint::SitemapIndex),
            _ => None,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Endpoint::SearchIndex => "/api/search.json",
            Endpoint::Sitemap => "/sitemap.xml",
            Endpoint::SitemapIndex => "/sitemap-index.xml",
        }
    }
}

/// Compact JSON array of every post's search entry.
pub fn build_search_index_json<T: Transport>(
    client: &ContentClient<T>,
) -> Result<String, EndpointError> {
    let posts = client.fetch_all_posts()?;
    Ok(serde_json::to_string(&build_search_index(&posts))?)
}

/// Listing pages come from the home listing's page count at the configured
/// page size.
pub fn build_sitemap_xml<T: Transport>(
    client: &ContentClient<T>,
    config: &SiteConfig,
    now: DateTime<Utc>,
) -> Result<String, EndpointError> {
    let posts = client.fetch_all_posts()?;
    let listing = client.fetch_posts(config.blog.page_size, 1)?;
    Ok(render_sitemap(
        &config.site.base_url,
        &posts,
        listing.total_pages,
        now,
    )?)
}

pub fn search_index_response<T: Transport>(client: &ContentClient<T>) -> EndpointResponse {
    match build_search_index_json(client) {
        Ok(body) => EndpointResponse::ok(JSON_CONTENT_TYPE, body),
        Err(err) => {
            tracing::warn!(error = %err, "search index failed");
            let body = serde_json::json!({ "error": SEARCH_INDEX_ERROR }).to_string();
            EndpointResponse::server_error(JSON_CONTENT_TYPE, body)
        }
    }
}

pub fn sitemap_response<T: Transport>(
    client: &ContentClient<T>,
    config: &SiteConfig,
    now: DateTime<Utc>,
) -> EndpointResponse {
    match build_sitemap_xml(client, config, now) {
        Ok(body) => EndpointResponse::ok(XML_CONTENT_TYPE, body),
        Err(err) => {
            tracing::warn!(error = %err, "error generating sitemap");
            EndpointResponse::server_error(TEXT_CONTENT_TYPE, SITEMAP_ERROR.to_string())
        }
    }
}

pub fn sitemap_index_response(config: &SiteConfig, now: DateTime<Utc>) -> EndpointResponse {
    EndpointResponse::ok(
        XML_CONTENT_TYPE,
        render_sitemap_index(&config.site.base_url, now),
    )
}

pub fn respond<T: Transport>(
    endpoint: Endpoint,
    client: &ContentClient<T>,
    config: &SiteConfig,
    now: DateTime<Utc>,
) -> EndpointResponse {
    match endpoint {
        Endpoint::SearchIndex => search_index_response(client),
        Endpoint::Sitemap => sitemap_response(client, config, now),
        Endpoint::SitemapIndex => sitemap_index_response(config, now),
    }
}
