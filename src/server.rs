//! HTTP server exposing the radar graph.
//!
//! - `GET /status?window=<minutes>&method=min` - graph JSON
//! - `GET /health` (or `/healthz`) - liveness
//!
//! Each request runs on its own task with its own graph state; the
//! collector is shared read-only. When a client disconnects, hyper drops
//! the in-flight request future, which cancels the upstream query.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use radar_collector::{Aggregation, ProbeCollector, DEFAULT_WINDOW};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Path serving the graph.
pub const STATUS_PATH: &str = "/status";

/// HTTP front for a [`ProbeCollector`].
#[derive(Debug, Clone)]
pub struct RadarServer {
    listen_addr: String,
    collector: Arc<ProbeCollector>,
}

impl RadarServer {
    /// Create a server for a collector.
    pub fn new(listen_addr: impl Into<String>, collector: ProbeCollector) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            collector: Arc::new(collector),
        }
    }

    /// Bind the listen address and serve until the runtime shuts down.
    pub async fn run(self) -> Result<()> {
        let addr: SocketAddr = self
            .listen_addr
            .parse()
            .with_context(|| format!("Invalid listen address {}", self.listen_addr))?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        info!(%addr, "radar listening");
        serve(listener, self.collector).await
    }
}

/// Accept connections on `listener` forever.
pub async fn serve(listener: TcpListener, collector: Arc<ProbeCollector>) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let collector = collector.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                let collector = collector.clone();
                async move { handle_request(req, &collector).await }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!(%peer, error = %e, "connection error");
            }
        });
    }
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    collector: &ProbeCollector,
) -> Result<Response<Full<Bytes>>, Infallible> {
    Ok(respond(req.uri().path(), req.uri().query(), collector).await)
}

/// Route one request by path and query string.
pub async fn respond(
    path: &str,
    query: Option<&str>,
    collector: &ProbeCollector,
) -> Response<Full<Bytes>> {
    match path {
        STATUS_PATH => status(query, collector).await,
        "/health" | "/healthz" => text(StatusCode::OK, "OK"),
        _ => text(StatusCode::NOT_FOUND, "Not Found"),
    }
}

async fn status(query: Option<&str>, collector: &ProbeCollector) -> Response<Full<Bytes>> {
    let (window, aggregation) = match graph_params(query) {
        Ok(params) => params,
        Err(msg) => return text(StatusCode::BAD_REQUEST, msg),
    };

    let graph = match collector.collect(window, aggregation).await {
        Ok(graph) => graph,
        Err(e) if e.is_client_error() => return text(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => {
            warn!(window, %aggregation, error = %e, "failed to get data");
            return text(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to get data: {}", e),
            );
        }
    };

    match serde_json::to_vec(&graph) {
        Ok(body) => {
            let mut response = Response::new(Full::new(Bytes::from(body)));
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(e) => text(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode response: {}", e),
        ),
    }
}

/// Read `window` and `method` from a query string.
///
/// An absent or empty `window` means the default; only the first
/// occurrence of each parameter counts.
pub fn graph_params(query: Option<&str>) -> Result<(i64, Aggregation), String> {
    let mut window = None;
    let mut method = None;
    for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        match key.as_ref() {
            "window" if window.is_none() => window = Some(value.into_owned()),
            "method" if method.is_none() => method = Some(value.into_owned()),
            _ => {}
        }
    }

    let window = match window.as_deref() {
        None | Some("") => DEFAULT_WINDOW,
        Some(w) => w
            .parse()
            .map_err(|_| format!("Failed to parse request: invalid window {:?}", w))?,
    };
    Ok((window, Aggregation::from_method(method.as_deref())))
}

fn text(status: StatusCode, body: impl Into<String>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.into())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}
