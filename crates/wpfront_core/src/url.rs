/// Maps site pages to paths and absolute URLs under the public base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrls {
    base: String,
}

impl SiteUrls {
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn home_path(&self) -> &'static str {
        "/"
    }

    pub fn post_path(&self, slug: &str) -> String {
        format!("/blog/{}/", slug.trim_matches('/'))
    }

    /// Listing page `n`. Page 1 is the home page itself.
    pub fn page_path(&self, page: u32) -> String {
        if page <= 1 {
            return self.home_path().to_string();
        }
        format!("/page/{page}/")
    }

    pub fn search_path(&self) -> &'static str {
        "/search"
    }

    pub fn absolute(&self, href: &str) -> String {
        let path = href.trim_start_matches('/');
        format!("{}/{path}", self.base)
    }

    pub fn post_url(&self, slug: &str) -> String {
        self.absolute(&self.post_path(slug))
    }
}
