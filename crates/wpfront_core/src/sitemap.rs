use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::InvalidPostDate;
use crate::model::Post;
use crate::text::escape_xml;
use crate::url::SiteUrls;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFreq {
    Daily,
    Weekly,
    Monthly,
}

impl ChangeFreq {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
        }
    }
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    /// Site-relative path, e.g. `/blog/hola/`.
    pub path: String,
    pub lastmod: String,
    pub changefreq: ChangeFreq,
    pub priority: f64,
}

/// ISO-8601 UTC with milliseconds, e.g. `2024-03-01T10:00:00.000Z`.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Home page, listing pages 2..=`total_pages`, then one entry per post in
/// the given order. Post dates carry no offset and are read as UTC.
pub fn sitemap_entries(
    urls: &SiteUrls,
    posts: &[Post],
    total_pages: u32,
    now: DateTime<Utc>,
) -> Result<Vec<SitemapEntry>, InvalidPostDate> {
    let now = iso_timestamp(now);
    let mut entries = vec![SitemapEntry {
        path: urls.home_path().to_string(),
        lastmod: now.clone(),
        changefreq: ChangeFreq::Daily,
        priority: 1.0,
    }];
    for page in 2..=total_pages {
        entries.push(SitemapEntry {
            path: urls.page_path(page),
            lastmod: now.clone(),
            changefreq: ChangeFreq::Weekly,
            priority: 0.8,
        });
    }
    for post in posts {
        let published = post.published_at().ok_or_else(|| InvalidPostDate {
            slug: post.slug.clone(),
            date: post.date.clone(),
        })?;
        entries.push(SitemapEntry {
            path: urls.post_path(&post.slug),
            lastmod: iso_timestamp(published.and_utc()),
            changefreq: ChangeFreq::Monthly,
            priority: 0.7,
        });
    }
    Ok(entries)
}

pub fn render_sitemap(
    base_url: &str,
    posts: &[Post],
    total_pages: u32,
    now: DateTime<Utc>,
) -> Result<String, InvalidPostDate> {
    let urls = SiteUrls::new(base_url);
    let entries = sitemap_entries(&urls, posts, total_pages, now)?;
    let body = entries
        .iter()
        .map(|entry| {
            format!(
                "  <url>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n    <changefreq>{}</changefreq>\n    <priority>{}</priority>\n  </url>",
                escape_xml(&urls.absolute(&entry.path)),
                entry.lastmod,
                entry.changefreq,
                entry.priority
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!("<urlset xmlns=\"{SITEMAP_NS}\">\n"));
    out.push_str(&body);
    out.push_str("\n</urlset>");
    Ok(out)
}

/// Sitemap index pointing at the single `sitemap.xml`.
pub fn render_sitemap_index(base_url: &str, now: DateTime<Utc>) -> String {
    let urls = SiteUrls::new(base_url);
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!("<sitemapindex xmlns=\"{SITEMAP_NS}\">\n"));
    out.push_str("  <sitemap>\n");
    out.push_str(&format!(
        "    <loc>{}</loc>\n",
        escape_xml(&urls.absolute("sitemap.xml"))
    ));
    out.push_str(&format!("    <lastmod>{}</lastmod>\n", iso_timestamp(now)));
    out.push_str("  </sitemap>\n");
    out.push_str("</sitemapindex>");
    out
}
