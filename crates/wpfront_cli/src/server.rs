//! Blocking HTTP server for the generated endpoints.
//!
//! Every other path is a 404; pages belong to the site generator.

use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Result, anyhow};
use chrono::Utc;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use wpfront_core::api::{ContentClient, Transport};
use wpfront_core::config::SiteConfig;
use wpfront_core::endpoints::{Endpoint, EndpointResponse, respond};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

type BoxedResponse = Response<Box<dyn Read + Send>>;

pub struct ServeOpts {
    pub host: String,
    pub port: u16,
    pub open: bool,
}

pub struct ServerHandle {
    pub url: String,
    shutdown: Arc<AtomicBool>,
    join: JoinHandle<Result<()>>,
}

impl ServerHandle {
    pub fn stop(self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        self.join
            .join()
            .map_err(|_| anyhow!("server thread panicked"))?
    }
}

struct EndpointServer<T> {
    server: Server,
    client: ContentClient<T>,
    config: SiteConfig,
}

impl<T: Transport> EndpointServer<T> {
    fn bind(
        opts: &ServeOpts,
        client: ContentClient<T>,
        config: SiteConfig,
    ) -> Result<(Self, String)> {
        let addr = format!("{}:{}", opts.host, opts.port);
        let server =
            Server::http(&addr).map_err(|err| anyhow!("failed to bind to {addr}: {err}"))?;
        let bound: SocketAddr = server
            .server_addr()
            .to_ip()
            .ok_or_else(|| anyhow!("{addr} is not an IP listener"))?;
        let url = format!("http://{}:{}/", opts.host, bound.port());
        let server = Self {
            server,
            client,
            config,
        };
        Ok((server, url))
    }

    /// Answers requests until `shutdown` is raised, or forever without one.
    fn run(self, shutdown: Option<Arc<AtomicBool>>) -> Result<()> {
        while !shutdown
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
        {
            let Some(request) = self.server.recv_timeout(POLL_INTERVAL)? else {
                continue;
            };
            let response = self.answer(&request);
            if let Err(err) = request.respond(response) {
                tracing::warn!(error = %err, "failed to send response");
            }
        }
        Ok(())
    }

    fn answer(&self, request: &Request) -> BoxedResponse {
        if !matches!(request.method(), Method::Get | Method::Head) {
            return plain(405, "Method Not Allowed");
        }
        let path = request.url().split('?').next().unwrap_or("/");
        let Some(endpoint) = Endpoint::from_path(path) else {
            return plain(404, "Not Found");
        };
        tracing::debug!(path, "endpoint request");
        endpoint_response(respond(endpoint, &self.client, &self.config, Utc::now()))
    }
}

pub fn run_server<T: Transport>(
    opts: ServeOpts,
    client: ContentClient<T>,
    config: SiteConfig,
) -> Result<()> {
    let (server, url) = EndpointServer::bind(&opts, client, config)?;
    println!("Serving: {url}");
    println!("CMS: {}", server.client.api_base());
    for endpoint in Endpoint::ALL {
        println!("  {}", endpoint.path());
    }

    if opts.open {
        if let Err(err) = webbrowser::open(&url) {
            tracing::warn!(error = %err, "failed to open browser");
        }
    }
    server.run(None)
}

pub fn spawn_server<T>(
    opts: ServeOpts,
    client: ContentClient<T>,
    config: SiteConfig,
) -> Result<ServerHandle>
where
    T: Transport + Send + 'static,
{
    let (server, url) = EndpointServer::bind(&opts, client, config)?;
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    let join = thread::spawn(move || server.run(Some(flag)));
    Ok(ServerHandle {
        url,
        shutdown,
        join,
    })
}

fn endpoint_response(response: EndpointResponse) -> BoxedResponse {
    let mut out = Response::from_string(response.body)
        .with_status_code(StatusCode(response.status))
        .with_header(header("Content-Type", response.content_type));
    if let Some(cache_control) = response.cache_control {
        out.add_header(header("Cache-Control", cache_control));
    }
    out.boxed()
}

fn plain(status: u16, body: &str) -> BoxedResponse {
    Response::from_string(body)
        .with_status_code(StatusCode(status))
        .with_header(header("Content-Type", "text/plain; charset=utf-8"))
        .boxed()
}

fn header(name: &str, value: &str) -> Header {
    // Names and values here are ASCII literals or fixed content types.
    Header::from_bytes(name.as_bytes(), value.as_bytes()).expect("valid header")
}
