use crate::model::{FeaturedMedia, MediaSize};
use crate::text::escape_attr;

/// Path segment under which the CMS stores original uploads.
pub const UPLOADS_SEGMENT: &str = "/wp-content/uploads/";
/// Sibling directory holding the WebP copies of the uploads.
pub const WEBP_MIRROR_SEGMENT: &str = "/wp-content/uploads-webpc/uploads/";

pub const WEBP_MIME: &str = "image/webp";

pub fn is_uploads_url(url: &str) -> bool {
    url.contains(UPLOADS_SEGMENT)
}

/// WebP mirror of an uploads URL: the uploads prefix moves to the mirror
/// directory and `.webp` is appended to the full URL, keeping the original
/// extension (`photo.jpg` becomes `photo.jpg.webp`).
pub fn webp_mirror_url(url: &str) -> String {
    let mut mirrored = url.replacen(UPLOADS_SEGMENT, WEBP_MIRROR_SEGMENT, 1);
    mirrored.push_str(".webp");
    mirrored
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponsiveOptions<'a> {
    /// Carried for callers; variants are not clipped against it.
    pub max_width: u32,
    /// Raw value of the `sizes` attribute.
    pub sizes: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsiveImage {
    pub src: String,
    pub srcset: String,
    pub webp_srcset: String,
    pub sizes: String,
    pub alt: String,
    pub width: u32,
    pub height: u32,
}

/// Derives the responsive descriptor of a featured image. Returns `None` when
/// there is no media or the media has no size variants.
pub fn build_responsive(
    media: Option<&FeaturedMedia>,
    options: &ResponsiveOptions<'_>,
) -> Option<ResponsiveImage> {
    let media = media?;
    let mut sorted: Vec<&MediaSize> = media.sizes.iter().map(|variant| &variant.size).collect();
    // Stable: equal widths keep response order, so the last one wins.
    sorted.sort_by_key(|size| size.width);
    let largest = *sorted.last()?;

    let srcset = sorted
        .iter()
        .map(|size| format!("{} {}w", size.source_url, size.width))
        .collect::<Vec<_>>()
        .join(", ");
    let webp_srcset = sorted
        .iter()
        .map(|size| format!("{} {}w", webp_mirror_url(&size.source_url), size.width))
        .collect::<Vec<_>>()
        .join(", ");

    Some(ResponsiveImage {
        src: largest.source_url.clone(),
        srcset,
        webp_srcset,
        sizes: options.sizes.to_string(),
        alt: media.alt_text.clone(),
        width: largest.width,
        height: largest.height,
    })
}

impl ResponsiveImage {
    /// `<picture>` markup with the WebP source first and the original
    /// variants on the fallback `<img>`.
    pub fn to_picture_html(&self) -> String {
        let sizes = escape_attr(&self.sizes);
        let mut html = String::new();
        html.push_str("<picture>");
        html.push_str("<source type=\"");
        html.push_str(WEBP_MIME);
        html.push_str("\" srcset=\"");
        html.push_str(&escape_attr(&self.webp_srcset));
        html.push_str("\" sizes=\"");
        html.push_str(&sizes);
        html.push_str("\">");
        html.push_str("<img src=\"");
        html.push_str(&escape_attr(&self.src));
        html.push_str("\" srcset=\"");
        html.push_str(&escape_attr(&self.srcset));
        html.push_str("\" sizes=\"");
        html.push_str(&sizes);
        html.push_str("\" alt=\"");
        html.push_str(&escape_attr(&self.alt));
        html.push_str(&format!(
            "\" width=\"{}\" height=\"{}\"",
            self.width, self.height
        ));
        html.push_str(" loading=\"lazy\" decoding=\"async\">");
        html.push_str("</picture>");
        html
    }
}
