use std::net::TcpListener;
use std::sync::Arc;
use std::thread::JoinHandle;

use tiny_http::{Header, Response, Server, StatusCode};
use wpfront_core::api::{ContentClient, Transport, UreqTransport};
use wpfront_core::error::ApiError;

struct MockReply {
    status: u16,
    headers: Vec<(&'static str, String)>,
    body: String,
}

impl MockReply {
    fn json(body: String) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body,
        }
    }

    fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: r#"{"code":"rest_no_route"}"#.to_string(),
        }
    }

    fn with_header(mut self, name: &'static str, value: impl ToString) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }
}

struct MockCms {
    url: String,
    server: Arc<Server>,
    thread: Option<JoinHandle<Vec<String>>>,
}

impl MockCms {
    fn spawn<F>(handler: F) -> Self
    where
        F: Fn(&str) -> MockReply + Send + 'static,
    {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("bind mock cms"));
        let port = server
            .server_addr()
            .to_ip()
            .expect("ip listener")
            .port();
        let worker = Arc::clone(&server);
        let thread = std::thread::spawn(move || {
            let mut seen = Vec::new();
            for request in worker.incoming_requests() {
                let url = request.url().to_string();
                let reply = handler(&url);
                seen.push(url);
                let mut response =
                    Response::from_string(reply.body).with_status_code(StatusCode(reply.status));
                for (name, value) in reply.headers {
                    response.add_header(
                        Header::from_bytes(name.as_bytes(), value.as_bytes()).expect("header"),
                    );
                }
                let _ = request.respond(response);
            }
            seen
        });
        Self {
            url: format!("http://127.0.0.1:{port}"),
            server,
            thread: Some(thread),
        }
    }

    /// Stops the server and returns the request URLs it saw, in order.
    fn finish(mut self) -> Vec<String> {
        self.server.unblock();
        self.thread
            .take()
            .expect("mock thread")
            .join()
            .expect("join mock thread")
    }
}

fn query_value<'a>(url: &'a str, key: &str) -> Option<&'a str> {
    let query = url.split_once('?')?.1;
    query.split('&').find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        (name == key).then_some(value)
    })
}

fn posts_json(first_id: u64, count: u64) -> String {
    let posts = (first_id..first_id + count)
        .map(|id| {
            format!(
                r#"{{"id":{id},"slug":"post-{id}","date":"2024-01-01T00:00:00","author":1,"title":{{"rendered":"Post {id}"}},"excerpt":{{"rendered":"<p>{id}</p>"}}}}"#
            )
        })
        .collect::<Vec<_>>();
    format!("[{}]", posts.join(","))
}

#[test]
fn fetch_all_posts_walks_pages_sequentially() {
    let cms = MockCms::spawn(|url| {
        let page: u64 = query_value(url, "page")
            .and_then(|value| value.parse().ok())
            .unwrap_or(1);
        let count = if page < 3 { 100 } else { 37 };
        MockReply::json(posts_json((page - 1) * 100 + 1, count))
            .with_header("X-WP-Total", 237)
            .with_header("X-WP-TotalPages", 3)
    });
    let client = ContentClient::new(&cms.url);
    let posts = client.fetch_all_posts();
    let seen = cms.finish();

    let posts = posts.expect("all posts");
    assert_eq!(posts.len(), 237);
    assert_eq!(posts[0].slug, "post-1");
    assert_eq!(posts[236].slug, "post-237");
    let pages = seen
        .iter()
        .filter_map(|url| query_value(url, "page"))
        .collect::<Vec<_>>();
    assert_eq!(pages, vec!["1", "2", "3"]);
    assert!(seen.iter().all(|url| url.starts_with("/wp-json/wp/v2/posts?")));
    assert!(seen.iter().all(|url| query_value(url, "per_page") == Some("100")));
}

#[test]
fn pagination_headers_are_read() {
    let cms = MockCms::spawn(|_| {
        MockReply::json(posts_json(1, 6))
            .with_header("X-WP-Total", 20)
            .with_header("X-WP-TotalPages", 4)
    });
    let client = ContentClient::new(&format!("{}/", cms.url));
    let page = client.fetch_posts(6, 4);
    cms.finish();

    let page = page.expect("posts page");
    assert_eq!(page.total_posts, 20);
    assert_eq!(page.total_pages, 4);
    assert!(!page.has_next_page);
    assert!(page.has_prev_page);
}

#[test]
fn error_status_is_reported_with_code() {
    let cms = MockCms::spawn(|_| MockReply::status(404));
    let client = ContentClient::new(&cms.url);
    let posts = client.fetch_posts(10, 1);
    let post = client.fetch_post_by_slug("missing");
    let author = client.fetch_author_by_id(12);
    let seen = cms.finish();

    assert_eq!(posts.expect_err("posts error").status(), Some(404));
    assert_eq!(post.expect_err("post error").status(), Some(404));
    assert!(author.is_none());
    assert_eq!(seen.last().map(String::as_str), Some("/wp-json/wp/v2/users/12"));
}

#[test]
fn post_by_slug_sends_slug_and_embed() {
    let cms = MockCms::spawn(|url| {
        if query_value(url, "slug") == Some("hola-mundo") {
            MockReply::json(posts_json(5, 1))
        } else {
            MockReply::json("[]".to_string())
        }
    });
    let client = ContentClient::new(&cms.url);
    let found = client.fetch_post_by_slug("hola-mundo");
    let missing = client.fetch_post_by_slug("otro");
    let seen = cms.finish();

    assert_eq!(found.expect("lookup").map(|post| post.id), Some(5));
    assert!(missing.expect("lookup").is_none());
    assert_eq!(query_value(&seen[0], "_embed"), Some("1"));
}

#[test]
fn author_lookup_decodes_user() {
    let cms = MockCms::spawn(|_| {
        MockReply::json(
            r#"{"id":3,"name":"Ana","slug":"ana","description":"Dev","url":"https://ana.dev","avatar_urls":{"24":"https://a/24.png"}}"#
                .to_string(),
        )
    });
    let client = ContentClient::new(&cms.url);
    let author = client.fetch_author_by_id(3);
    cms.finish();

    let author = author.expect("author");
    assert_eq!(author.name, "Ana");
    assert_eq!(author.url.as_deref(), Some("https://ana.dev"));
    assert_eq!(
        author
            .avatar_urls
            .as_ref()
            .and_then(|urls| urls.get("24"))
            .map(String::as_str),
        Some("https://a/24.png")
    );
}

#[test]
fn unreachable_cms_is_a_transport_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let url = format!("http://127.0.0.1:{port}");
    let transport = UreqTransport::new();
    let err = transport
        .get(&format!("{url}/wp-json/wp/v2/posts"), &[])
        .expect_err("connection refused");
    assert!(matches!(err, ApiError::Transport(_)));

    let client = ContentClient::new(&url);
    assert!(client.fetch_author_by_id(1).is_none());
    assert_eq!(client.fetch_posts(10, 1).expect_err("transport").status(), None);
}
