//! Read-only client for the CMS REST API (`/wp-json/wp/v2`).
//!
//! Requests go through the [`Transport`] seam so that the client can be
//! driven by a canned transport in tests. Non-2xx answers are responses,
//! not transport errors; the client turns them into [`ApiError::Status`].

use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::model::{Author, Post, PostsPage};

pub use crate::config::DEFAULT_CMS_URL;

/// Page size used when walking every post.
pub const ALL_POSTS_PAGE_SIZE: u32 = 100;

const USER_AGENT: &str = concat!("wpfront/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// Header names are lowercased.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

pub trait Transport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<RawResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<RawResponse, ApiError> {
        (**self).get(url, query)
    }
}

/// Blocking HTTP transport backed by a `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<RawResponse, ApiError> {
        let mut request = self.agent.get(url);
        for (key, value) in query {
            request = request.query(key, value);
        }
        let response = match request.call() {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(err)) => return Err(ApiError::Transport(err.to_string())),
        };
        let status = response.status();
        let mut headers = BTreeMap::new();
        for name in response.headers_names() {
            if let Some(value) = response.header(&name) {
                headers.insert(name.to_ascii_lowercase(), value.to_string());
            }
        }
        let body = response
            .into_string()
            .map_err(|err| ApiError::Transport(format!("failed to read body of {url}: {err}")))?;
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ContentClient<T = UreqTransport> {
    api_base: String,
    transport: T,
}

impl ContentClient<UreqTransport> {
    pub fn new(cms_url: &str) -> Self {
        Self::with_transport(cms_url, UreqTransport::new())
    }
}

impl<T: Transport> ContentClient<T> {
    pub fn with_transport(cms_url: &str, transport: T) -> Self {
        let cms = cms_url.trim_end_matches('/');
        Self {
            api_base: format!("{cms}/wp-json/wp/v2"),
            transport,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// One page of posts, newest first, with author and media embedded.
    pub fn fetch_posts(&self, per_page: u32, page: u32) -> Result<PostsPage, ApiError> {
        let url = format!("{}/posts", self.api_base);
        let query = [
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
            ("orderby", "date".to_string()),
            ("order", "desc".to_string()),
            ("_embed", "1".to_string()),
        ];
        let response = self.request("posts", &url, &query)?;
        let total_posts = header_number(&response, "x-wp-total").unwrap_or(0);
        let total_pages = header_number(&response, "x-wp-totalpages").unwrap_or(1);
        let posts: Vec<Post> = decode("posts", &response)?;
        Ok(PostsPage {
            posts,
            total_posts,
            total_pages,
            current_page: page,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        })
    }

    pub fn fetch_posts_simple(&self, per_page: u32) -> Result<Vec<Post>, ApiError> {
        Ok(self.fetch_posts(per_page, 1)?.posts)
    }

    /// Every published post. Pages are requested one after another and
    /// concatenated in page order.
    pub fn fetch_all_posts(&self) -> Result<Vec<Post>, ApiError> {
        let first = self.fetch_posts(ALL_POSTS_PAGE_SIZE, 1)?;
        let total_pages = first.total_pages;
        let mut posts = first.posts;
        for page in 2..=total_pages {
            let next = self.fetch_posts(ALL_POSTS_PAGE_SIZE, page)?;
            posts.extend(next.posts);
        }
        Ok(posts)
    }

    pub fn fetch_post_by_slug(&self, slug: &str) -> Result<Option<Post>, ApiError> {
        let url = format!("{}/posts", self.api_base);
        let query = [("slug", slug.to_string()), ("_embed", "1".to_string())];
        let response = self.request("post", &url, &query)?;
        let posts: Vec<Post> = decode("post", &response)?;
        Ok(posts.into_iter().next())
    }

    /// Best effort: any failure is logged and reported as `None`.
    pub fn fetch_author_by_id(&self, id: u64) -> Option<Author> {
        let url = format!("{}/users/{id}", self.api_base);
        let result = self
            .request("author", &url, &[])
            .and_then(|response| decode::<Author>("author", &response));
        match result {
            Ok(author) => Some(author),
            Err(err) => {
                tracing::warn!(author_id = id, error = %err, "error fetching author");
                None
            }
        }
    }

    /// Author of `post`, preferring the embedded record over a lookup.
    pub fn post_author(&self, post: &Post) -> Option<Author> {
        if let Some(author) = post.embedded_author() {
            return Some(author.clone());
        }
        if post.author != 0 {
            return self.fetch_author_by_id(post.author);
        }
        None
    }

    fn request(
        &self,
        resource: &'static str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<RawResponse, ApiError> {
        tracing::debug!(%url, ?query, "GET {resource}");
        let response = self.transport.get(url, query)?;
        if !response.is_success() {
            return Err(ApiError::Status {
                resource,
                status: response.status,
            });
        }
        Ok(response)
    }
}

fn decode<D: DeserializeOwned>(
    resource: &'static str,
    response: &RawResponse,
) -> Result<D, ApiError> {
    serde_json::from_str(&response.body).map_err(|source| ApiError::Decode { resource, source })
}

fn header_number<N: std::str::FromStr>(response: &RawResponse, name: &str) -> Option<N> {
    response.header(name)?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Serves canned responses and records every requested URL and page.
    struct FakeTransport {
        responses: RefCell<Vec<Result<RawResponse, ApiError>>>,
        requests: RefCell<Vec<(String, Vec<(String, String)>)>>,
    }

    impl FakeTransport {
        fn new(responses: Vec<Result<RawResponse, ApiError>>) -> Self {
            Self {
                responses: RefCell::new(responses),
                requests: RefCell::new(Vec::new()),
            }
        }

        fn requested_pages(&self) -> Vec<String> {
            self.requests
                .borrow()
                .iter()
                .filter_map(|(_, query)| {
                    query
                        .iter()
                        .find(|(key, _)| key == "page")
                        .map(|(_, value)| value.clone())
                })
                .collect()
        }
    }

    impl Transport for FakeTransport {
        fn get(&self, url: &str, query: &[(&str, String)]) -> Result<RawResponse, ApiError> {
            self.requests.borrow_mut().push((
                url.to_string(),
                query
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.clone()))
                    .collect(),
            ));
            let mut responses = self.responses.borrow_mut();
            if responses.is_empty() {
                panic!("unexpected request to {url}");
            }
            responses.remove(0)
        }
    }

    fn posts_body(first_id: u64, count: u64) -> String {
        let posts = (first_id..first_id + count)
            .map(|id| {
                format!(
                    r#"{{"id":{id},"slug":"post-{id}","date":"2024-01-01T00:00:00","author":1,"title":{{"rendered":"Post {id}"}},"excerpt":{{"rendered":""}}}}"#
                )
            })
            .collect::<Vec<_>>();
        format!("[{}]", posts.join(","))
    }

    fn page(body: String, total: u64, pages: u32) -> Result<RawResponse, ApiError> {
        let mut headers = BTreeMap::new();
        headers.insert("x-wp-total".to_string(), total.to_string());
        headers.insert("x-wp-totalpages".to_string(), pages.to_string());
        Ok(RawResponse {
            status: 200,
            headers,
            body,
        })
    }

    fn status(code: u16) -> Result<RawResponse, ApiError> {
        Ok(RawResponse {
            status: code,
            headers: BTreeMap::new(),
            body: r#"{"code":"rest_error"}"#.to_string(),
        })
    }

    #[test]
    fn api_base_strips_trailing_slashes() {
        let client =
            ContentClient::with_transport("https://cms.example.com//", FakeTransport::new(vec![]));
        assert_eq!(client.api_base(), "https://cms.example.com/wp-json/wp/v2");
    }

    #[test]
    fn fetch_posts_reads_pagination_headers() {
        let transport = FakeTransport::new(vec![page(posts_body(1, 6), 14, 3)]);
        let client = ContentClient::with_transport("https://cms.example.com", transport);
        let result = client.fetch_posts(6, 2).expect("posts page");
        assert_eq!(result.posts.len(), 6);
        assert_eq!(result.total_posts, 14);
        assert_eq!(result.total_pages, 3);
        assert_eq!(result.current_page, 2);
        assert!(result.has_next_page);
        assert!(result.has_prev_page);

        let requests = client.transport().requests.borrow();
        let (url, query) = &requests[0];
        assert_eq!(url, "https://cms.example.com/wp-json/wp/v2/posts");
        let query = query
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>();
        assert_eq!(
            query,
            vec!["per_page=6", "page=2", "orderby=date", "order=desc", "_embed=1"]
        );
    }

    #[test]
    fn missing_pagination_headers_use_defaults() {
        let transport = FakeTransport::new(vec![Ok(RawResponse {
            status: 200,
            headers: BTreeMap::new(),
            body: posts_body(1, 2),
        })]);
        let client = ContentClient::with_transport("https://cms.example.com", transport);
        let result = client.fetch_posts(10, 1).expect("posts page");
        assert_eq!(result.total_posts, 0);
        assert_eq!(result.total_pages, 1);
        assert!(!result.has_next_page);
        assert!(!result.has_prev_page);
    }

    #[test]
    fn simple_posts_are_the_first_page_only() {
        let transport = FakeTransport::new(vec![page(posts_body(1, 3), 40, 14)]);
        let client = ContentClient::with_transport("https://cms.example.com", transport);
        let posts = client.fetch_posts_simple(3).expect("posts");
        assert_eq!(posts.iter().map(|post| post.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(client.transport().requested_pages(), vec!["1"]);
        let requests = client.transport().requests.borrow();
        assert_eq!(requests[0].1[0], ("per_page".to_string(), "3".to_string()));
    }

    #[test]
    fn fetch_all_posts_concatenates_pages_in_order() {
        let transport = FakeTransport::new(vec![
            page(posts_body(1, 100), 237, 3),
            page(posts_body(101, 100), 237, 3),
            page(posts_body(201, 37), 237, 3),
        ]);
        let client = ContentClient::with_transport("https://cms.example.com", transport);
        let posts = client.fetch_all_posts().expect("all posts");
        assert_eq!(posts.len(), 237);
        assert_eq!(posts[0].id, 1);
        assert_eq!(posts[100].id, 101);
        assert_eq!(posts[236].id, 237);
        assert!(posts.windows(2).all(|pair| pair[0].id < pair[1].id));
        assert_eq!(client.transport().requested_pages(), vec!["1", "2", "3"]);
    }

    #[test]
    fn fetch_all_posts_stops_at_first_failing_page() {
        let transport = FakeTransport::new(vec![page(posts_body(1, 100), 150, 2), status(502)]);
        let client = ContentClient::with_transport("https://cms.example.com", transport);
        let err = client.fetch_all_posts().expect_err("second page fails");
        assert_eq!(err.status(), Some(502));
    }

    #[test]
    fn non_success_status_is_an_error() {
        let transport = FakeTransport::new(vec![status(500)]);
        let client = ContentClient::with_transport("https://cms.example.com", transport);
        let err = client.fetch_posts(10, 1).expect_err("status error");
        assert_eq!(err.status(), Some(500));
        assert!(matches!(err, ApiError::Status { resource: "posts", .. }));
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let transport = FakeTransport::new(vec![page("{not json".to_string(), 0, 1)]);
        let client = ContentClient::with_transport("https://cms.example.com", transport);
        let err = client.fetch_posts(10, 1).expect_err("decode error");
        assert!(matches!(err, ApiError::Decode { .. }));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn post_by_slug_returns_first_match_or_none() {
        let transport = FakeTransport::new(vec![
            page(posts_body(5, 2), 2, 1),
            page("[]".to_string(), 0, 1),
        ]);
        let client = ContentClient::with_transport("https://cms.example.com", transport);
        let post = client.fetch_post_by_slug("post-5").expect("lookup");
        assert_eq!(post.map(|post| post.id), Some(5));
        assert!(client.fetch_post_by_slug("missing").expect("lookup").is_none());

        let requests = client.transport().requests.borrow();
        assert_eq!(requests[0].1[0], ("slug".to_string(), "post-5".to_string()));
        assert_eq!(requests[0].1[1], ("_embed".to_string(), "1".to_string()));
    }

    #[test]
    fn post_by_slug_propagates_status() {
        let transport = FakeTransport::new(vec![status(404)]);
        let client = ContentClient::with_transport("https://cms.example.com", transport);
        let err = client.fetch_post_by_slug("x").expect_err("status error");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn author_failures_become_none() {
        let transport = FakeTransport::new(vec![
            status(404),
            Err(ApiError::Transport("connection refused".to_string())),
            page("<html>".to_string(), 0, 1),
        ]);
        let client = ContentClient::with_transport("https://cms.example.com", transport);
        assert!(client.fetch_author_by_id(3).is_none());
        assert!(client.fetch_author_by_id(3).is_none());
        assert!(client.fetch_author_by_id(3).is_none());
        let requests = client.transport().requests.borrow();
        assert_eq!(requests[0].0, "https://cms.example.com/wp-json/wp/v2/users/3");
    }

    #[test]
    fn post_author_prefers_embedded_record() {
        let client =
            ContentClient::with_transport("https://cms.example.com", FakeTransport::new(vec![]));
        let post: Post = serde_json::from_str(
            r#"{"id":1,"slug":"a","date":"2024-01-01T00:00:00","author":9,
                "_embedded":{"author":[{"id":9,"name":"Ana","slug":"ana"}]}}"#,
        )
        .expect("decode post");
        let author = client.post_author(&post).expect("embedded author");
        assert_eq!(author.name, "Ana");
        assert!(client.transport().requests.borrow().is_empty());
    }

    #[test]
    fn post_author_falls_back_to_lookup() {
        let transport = FakeTransport::new(vec![Ok(RawResponse {
            status: 200,
            headers: BTreeMap::new(),
            body: r#"{"id":9,"name":"Luis","slug":"luis"}"#.to_string(),
        })]);
        let client = ContentClient::with_transport("https://cms.example.com", transport);
        let post: Post = serde_json::from_str(
            r#"{"id":1,"slug":"a","date":"2024-01-01T00:00:00","author":9}"#,
        )
        .expect("decode post");
        assert_eq!(client.post_author(&post).map(|a| a.name), Some("Luis".to_string()));
    }

    #[test]
    fn post_author_without_reference_is_none() {
        let client =
            ContentClient::with_transport("https://cms.example.com", FakeTransport::new(vec![]));
        let post: Post = serde_json::from_str(
            r#"{"id":1,"slug":"a","date":"2024-01-01T00:00:00","author":0}"#,
        )
        .expect("decode post");
        assert!(client.post_author(&post).is_none());
        assert!(client.transport().requests.borrow().is_empty());
    }
}
