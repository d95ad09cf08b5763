//! schema.org structured data emitted as pretty-printed JSON-LD.

use serde_json::{Map, Value, json};

use crate::config::SiteMeta;
use crate::model::{Author, Post};
use crate::search::UNKNOWN_AUTHOR;
use crate::text::plain_text;
use crate::url::SiteUrls;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleSchema {
    pub headline: String,
    pub description: String,
    pub image: String,
    pub date_published: String,
    pub date_modified: String,
    pub author: SchemaAuthor,
    pub publisher: SchemaPublisher,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaAuthor {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaPublisher {
    pub name: String,
    pub logo: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub name: String,
    pub url: String,
}

impl Breadcrumb {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

impl ArticleSchema {
    /// Article fields for a post page. The image falls back to the site logo
    /// when the post has no featured media, and `dateModified` falls back to
    /// the publish date.
    pub fn from_post(post: &Post, author: Option<&Author>, site: &SiteMeta) -> Self {
        let urls = SiteUrls::new(&site.base_url);
        let image = post
            .featured_media()
            .map(|media| media.source_url.clone())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| site.logo_url());
        let author = match author {
            Some(author) => SchemaAuthor {
                name: author.name.clone(),
                url: author.url.clone().filter(|url| !url.is_empty()),
            },
            None => SchemaAuthor {
                name: UNKNOWN_AUTHOR.to_string(),
                url: None,
            },
        };
        Self {
            headline: plain_text(&post.title.rendered),
            description: plain_text(&post.excerpt.rendered),
            image,
            date_published: post.date.clone(),
            date_modified: post.modified.clone().unwrap_or_else(|| post.date.clone()),
            author,
            publisher: SchemaPublisher {
                name: site.title.clone(),
                logo: site.logo_url(),
            },
            url: urls.post_url(&post.slug),
        }
    }
}

pub fn article_schema(article: &ArticleSchema) -> String {
    let mut author = Map::new();
    author.insert("@type".to_string(), json!("Person"));
    author.insert("name".to_string(), json!(article.author.name));
    if let Some(url) = &article.author.url {
        author.insert("url".to_string(), json!(url));
    }

    let schema = json!({
        "@context": "https://schema.org",
        "@type": "Article",
        "headline": article.headline,
        "description": article.description,
        "image": article.image,
        "datePublished": article.date_published,
        "dateModified": article.date_modified,
        "author": Value::Object(author),
        "publisher": {
            "@type": "Organization",
            "name": article.publisher.name,
            "logo": {
                "@type": "ImageObject",
                "url": article.publisher.logo,
            },
        },
        "url": article.url,
        "mainEntityOfPage": {
            "@type": "WebPage",
            "@id": article.url,
        },
    });
    to_pretty(&schema)
}

pub fn breadcrumb_schema(breadcrumbs: &[Breadcrumb]) -> String {
    let items = breadcrumbs
        .iter()
        .enumerate()
        .map(|(index, crumb)| {
            json!({
                "@type": "ListItem",
                "position": index + 1,
                "name": crumb.name,
                "item": crumb.url,
            })
        })
        .collect::<Vec<_>>();
    let schema = json!({
        "@context": "https://schema.org",
        "@type": "BreadcrumbList",
        "itemListElement": items,
    });
    to_pretty(&schema)
}

pub fn website_schema(site: &SiteMeta) -> String {
    let urls = SiteUrls::new(&site.base_url);
    let search_template = format!(
        "{}{}?q={{search_term_string}}",
        urls.base(),
        urls.search_path()
    );
    let schema = json!({
        "@context": "https://schema.org",
        "@type": "WebSite",
        "name": site.title,
        "description": site.description,
        "url": urls.base(),
        "inLanguage": site.language,
        "potentialAction": {
            "@type": "SearchAction",
            "target": {
                "@type": "EntryPoint",
                "urlTemplate": search_template,
            },
            "query-input": "required name=search_term_string",
        },
    });
    to_pretty(&schema)
}

/// Two-space indented JSON.
fn to_pretty(value: &Value) -> String {
    format!("{value:#}")
}
