use std::fs;
use std::num::NonZeroU32;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::reading_time::DEFAULT_WORDS_PER_MINUTE;

/// Environment variable overriding `cms.url`.
pub const CMS_URL_ENV: &str = "PUBLIC_CMS_URL";

pub const DEFAULT_CMS_URL: &str = "https://cms.byteinnovalabs.xyz";
pub const DEFAULT_SITE_URL: &str = "https://headlesscms.byteinnovalabs.xyz";
pub const DEFAULT_SITE_TITLE: &str = "Aprende cada día más";
pub const DEFAULT_SITE_DESCRIPTION: &str = "Blog de tecnología y aprendizaje diario. Descubre artículos sobre desarrollo web, programación y las últimas tendencias tecnológicas.";
pub const DEFAULT_IMAGE_SIZES: &str = "(max-width: 768px) 100vw, 768px";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub site: SiteMeta,
    pub cms: CmsConfig,
    pub blog: BlogConfig,
    pub reading: ReadingConfig,
    pub images: ImageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteMeta {
    pub title: String,
    pub description: String,
    pub base_url: String,
    pub language: String,
    pub logo: Option<String>,
}

impl SiteMeta {
    pub fn logo_url(&self) -> String {
        match &self.logo {
            Some(logo) => logo.clone(),
            None => format!("{}/favicon.svg", self.base_url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmsConfig {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogConfig {
    /// Posts per listing page; drives the pagination entries of the sitemap.
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingConfig {
    pub words_per_minute: NonZeroU32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageConfig {
    pub max_width: u32,
    pub sizes: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site: SiteMeta {
                title: DEFAULT_SITE_TITLE.to_string(),
                description: DEFAULT_SITE_DESCRIPTION.to_string(),
                base_url: DEFAULT_SITE_URL.to_string(),
                language: "es".to_string(),
                logo: None,
            },
            cms: CmsConfig {
                url: DEFAULT_CMS_URL.to_string(),
            },
            blog: BlogConfig { page_size: 6 },
            reading: ReadingConfig {
                words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            },
            images: ImageConfig {
                max_width: 1200,
                sizes: DEFAULT_IMAGE_SIZES.to_string(),
            },
        }
    }
}

impl SiteConfig {
    /// Replaces the CMS URL with `value` when it is set and not blank.
    pub fn with_cms_override(mut self, value: Option<String>) -> Self {
        if let Some(url) = value.filter(|url| !url.trim().is_empty()) {
            self.cms.url = normalize_url(&url);
        }
        self
    }

    pub fn with_env_overrides(self) -> Self {
        let value = std::env::var(CMS_URL_ENV).ok();
        self.with_cms_override(value)
    }
}

#[derive(Debug, Default, Deserialize)]
struct SiteConfigRaw {
    site: Option<SiteMetaRaw>,
    cms: Option<CmsConfigRaw>,
    blog: Option<BlogConfigRaw>,
    reading: Option<ReadingConfigRaw>,
    images: Option<ImageConfigRaw>,
}

#[derive(Debug, Deserialize)]
struct SiteMetaRaw {
    title: Option<String>,
    description: Option<String>,
    base_url: Option<String>,
    language: Option<String>,
    logo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CmsConfigRaw {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BlogConfigRaw {
    page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ReadingConfigRaw {
    words_per_minute: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ImageConfigRaw {
    max_width: Option<u32>,
    sizes: Option<String>,
}

pub fn load_site_config(path: &Path) -> Result<SiteConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_site_config(&raw)
        .with_context(|| format!("failed to parse YAML config {}", path.display()))
}

pub fn parse_site_config(yaml: &str) -> Result<SiteConfig> {
    let parsed: SiteConfigRaw = if yaml.trim().is_empty() {
        SiteConfigRaw::default()
    } else {
        serde_yaml::from_str(yaml)?
    };
    let defaults = SiteConfig::default();

    let site = match parsed.site {
        None => defaults.site,
        Some(site_raw) => SiteMeta {
            title: non_empty_or_default(site_raw.title, &defaults.site.title, "site.title")?,
            description: site_raw.description.unwrap_or(defaults.site.description),
            base_url: normalize_url(&non_empty_or_default(
                site_raw.base_url,
                &defaults.site.base_url,
                "site.base_url",
            )?),
            language: non_empty_or_default(
                site_raw.language,
                &defaults.site.language,
                "site.language",
            )?,
            logo: site_raw.logo.filter(|logo| !logo.trim().is_empty()),
        },
    };

    let cms = CmsConfig {
        url: normalize_url(&non_empty_or_default(
            parsed.cms.and_then(|cms| cms.url),
            &defaults.cms.url,
            "cms.url",
        )?),
    };

    let page_size = parsed
        .blog
        .and_then(|blog| blog.page_size)
        .unwrap_or(defaults.blog.page_size);
    if page_size == 0 {
        bail!("blog.page_size must be > 0");
    }

    let words_per_minute = match parsed.reading.and_then(|reading| reading.words_per_minute) {
        None => defaults.reading.words_per_minute,
        Some(value) => match NonZeroU32::new(value) {
            Some(rate) => rate,
            None => bail!("reading.words_per_minute must be > 0"),
        },
    };

    let images = match parsed.images {
        None => defaults.images,
        Some(images_raw) => ImageConfig {
            max_width: images_raw.max_width.unwrap_or(defaults.images.max_width),
            sizes: images_raw.sizes.unwrap_or(defaults.images.sizes),
        },
    };

    Ok(SiteConfig {
        site,
        cms,
        blog: BlogConfig { page_size },
        reading: ReadingConfig { words_per_minute },
        images,
    })
}

fn non_empty_or_default(value: Option<String>, default: &str, field: &str) -> Result<String> {
    match value {
        Some(text) => {
            if text.trim().is_empty() {
                bail!("{field} must not be empty");
            }
            Ok(text)
        }
        None => Ok(default.to_string()),
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
