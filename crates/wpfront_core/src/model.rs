//! Content API records, decoded once at the HTTP boundary

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaSize {
    pub source_url: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeVariant {
    /// Size label as published by the CMS, e.g. "thumbnail" or "full".
    pub label: String,
    pub size: MediaSize,
}

/// Featured image of a post. Size variants keep the order of the response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "FeaturedMediaRaw")]
pub struct FeaturedMedia {
    pub alt_text: String,
    pub source_url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub sizes: Vec<SizeVariant>,
}

#[derive(Debug, Deserialize)]
struct FeaturedMediaRaw {
    #[serde(default)]
    alt_text: Option<String>,
    #[serde(default)]
    source_url: Option<String>,
    #[serde(default)]
    media_details: Option<MediaDetailsRaw>,
}

#[derive(Debug, Deserialize)]
struct MediaDetailsRaw {
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    sizes: Option<OrderedSizes>,
}

#[derive(Debug)]
struct OrderedSizes(Vec<SizeVariant>);

impl<'de> Deserialize<'de> for OrderedSizes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SizesVisitor;

        impl<'de> Visitor<'de> for SizesVisitor {
            type Value = OrderedSizes;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of media size variants")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut sizes = Vec::new();
                while let Some((label, size)) = map.next_entry::<String, MediaSize>()? {
                    sizes.push(SizeVariant { label, size });
                }
                Ok(OrderedSizes(sizes))
            }
        }

        deserializer.deserialize_map(SizesVisitor)
    }
}

impl From<FeaturedMediaRaw> for FeaturedMedia {
    fn from(raw: FeaturedMediaRaw) -> Self {
        let (width, height, sizes) = match raw.media_details {
            Some(details) => (
                details.width,
                details.height,
                details.sizes.map(|sizes| sizes.0).unwrap_or_default(),
            ),
            None => (None, None, Vec::new()),
        };
        Self {
            alt_text: raw.alt_text.unwrap_or_default(),
            source_url: raw.source_url.unwrap_or_default(),
            width,
            height,
            sizes,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub avatar_urls: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Embedded {
    #[serde(rename = "wp:featuredmedia", default)]
    pub featured_media: Vec<FeaturedMedia>,
    #[serde(default)]
    pub author: Vec<Author>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Post {
    pub id: u64,
    pub slug: String,
    pub date: String,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub author: u64,
    #[serde(default)]
    pub title: Rendered,
    #[serde(default)]
    pub excerpt: Rendered,
    #[serde(default)]
    pub content: Option<Rendered>,
    #[serde(default)]
    pub featured_media: Option<u64>,
    #[serde(rename = "_embedded", default)]
    pub embedded: Option<Embedded>,
}

impl Post {
    pub fn featured_media(&self) -> Option<&FeaturedMedia> {
        self.embedded.as_ref()?.featured_media.first()
    }

    pub fn embedded_author(&self) -> Option<&Author> {
        self.embedded.as_ref()?.author.first()
    }

    pub fn content_html(&self) -> &str {
        self.content
            .as_ref()
            .map(|content| content.rendered.as_str())
            .unwrap_or("")
    }

    pub fn published_at(&self) -> Option<NaiveDateTime> {
        parse_cms_date(&self.date)
    }
}

/// One page of posts together with the pagination totals reported by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostsPage {
    pub posts: Vec<Post>,
    pub total_posts: u64,
    pub total_pages: u32,
    pub current_page: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

/// Parses CMS dates, which come without an offset ("2024-03-01T10:00:00").
/// Values with an explicit offset are converted to UTC.
pub fn parse_cms_date(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(date);
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|date| date.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_json() -> &'static str {
        r#"{
            "id": 42,
            "slug": "hola-mundo",
            "date": "2024-03-01T10:00:00",
            "modified": "2024-03-02T08:30:00",
            "author": 7,
            "title": { "rendered": "Hola &#8220;mundo&#8221;" },
            "excerpt": { "rendered": "<p>Resumen</p>" },
            "content": { "rendered": "<p>Cuerpo</p>", "protected": false },
            "featured_media": 9,
            "_embedded": {
                "author": [{ "id": 7, "name": "Ana", "slug": "ana" }],
                "wp:featuredmedia": [{
                    "alt_text": "Portada",
                    "source_url": "https://cms.example.com/wp-content/uploads/2024/cover.jpg",
                    "media_details": {
                        "width": 1600,
                        "height": 900,
                        "sizes": {
                            "medium": { "source_url": "https://cms.example.com/m.jpg", "width": 300, "height": 169, "mime_type": "image/jpeg" },
                            "large": { "source_url": "https://cms.example.com/l.jpg", "width": 1024, "height": 576 },
                            "full": { "source_url": "https://cms.example.com/f.jpg", "width": 1600, "height": 900, "file": "f.jpg" }
                        }
                    }
                }]
            }
        }"#
    }

    #[test]
    fn decodes_post_with_embeds() {
        let post: Post = serde_json::from_str(post_json()).expect("decode post");
        assert_eq!(post.id, 42);
        assert_eq!(post.content_html(), "<p>Cuerpo</p>");
        assert_eq!(post.embedded_author().map(|a| a.name.as_str()), Some("Ana"));
        let media = post.featured_media().expect("featured media");
        assert_eq!(media.alt_text, "Portada");
        assert_eq!(media.width, Some(1600));
    }

    #[test]
    fn size_variants_keep_response_order() {
        let post: Post = serde_json::from_str(post_json()).expect("decode post");
        let media = post.featured_media().expect("featured media");
        let labels = media
            .sizes
            .iter()
            .map(|variant| variant.label.as_str())
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["medium", "large", "full"]);
        assert_eq!(media.sizes[0].size.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(media.sizes[1].size.mime_type, None);
    }

    #[test]
    fn media_without_details_has_no_sizes() {
        let media: FeaturedMedia =
            serde_json::from_str(r#"{ "source_url": "https://cms.example.com/a.png" }"#)
                .expect("decode media");
        assert!(media.sizes.is_empty());
        assert_eq!(media.alt_text, "");
    }

    #[test]
    fn media_with_null_sizes_decodes() {
        let media: FeaturedMedia = serde_json::from_str(
            r#"{ "source_url": "x", "media_details": { "sizes": null } }"#,
        )
        .expect("decode media");
        assert!(media.sizes.is_empty());
    }

    #[test]
    fn post_without_embeds_has_no_media_or_author() {
        let post: Post = serde_json::from_str(
            r#"{ "id": 1, "slug": "a", "date": "2024-01-01T00:00:00", "title": { "rendered": "A" } }"#,
        )
        .expect("decode post");
        assert!(post.featured_media().is_none());
        assert!(post.embedded_author().is_none());
        assert_eq!(post.author, 0);
        assert_eq!(post.content_html(), "");
    }

    #[test]
    fn parses_dates_with_and_without_offset() {
        let plain = parse_cms_date("2024-03-01T10:00:00").expect("plain date");
        assert_eq!(plain.to_string(), "2024-03-01 10:00:00");
        let offset = parse_cms_date("2024-03-01T10:00:00+02:00").expect("offset date");
        assert_eq!(offset.to_string(), "2024-03-01 08:00:00");
        assert!(parse_cms_date("not a date").is_none());
    }
}
