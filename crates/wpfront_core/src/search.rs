use serde::Serialize;

use crate::model::Post;
use crate::text::strip_tags;

/// Author shown when a post carries no embedded author record.
pub const UNKNOWN_AUTHOR: &str = "Autor desconocido";

/// Flattened post summary consumed by the client-side search page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchEntry {
    pub id: u64,
    /// Rendered title, entities untouched.
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub date: String,
    pub author: String,
}

pub fn search_entry(post: &Post) -> SearchEntry {
    let author = post
        .embedded_author()
        .map(|author| author.name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_AUTHOR);
    SearchEntry {
        id: post.id,
        title: post.title.rendered.clone(),
        slug: post.slug.clone(),
        excerpt: strip_tags(&post.excerpt.rendered),
        date: post.date.clone(),
        author: author.to_string(),
    }
}

pub fn build_search_index(posts: &[Post]) -> Vec<SearchEntry> {
    posts.iter().map(search_entry).collect()
}
