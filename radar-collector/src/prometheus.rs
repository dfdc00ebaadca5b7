//! Prometheus collector using the instant-query HTTP API.
//!
//! Each call to [`ProbeCollector::collect`] issues one
//! `GET <target>/api/v1/query` and turns the answer into a [`Graph`]. The
//! collector holds no per-request state, so one instance can serve any
//! number of concurrent requests. Dropping the returned future cancels the
//! upstream call.
//!
//! ## Example
//!
//! ```rust,no_run
//! use radar_collector::{Aggregation, ProbeCollector, ReshapeRule};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let collector = ProbeCollector::builder()
//!         .target("http://prometheus:9090".parse()?)
//!         .rules(vec![ReshapeRule::new("10.0.0.1").to("edge-router")])
//!         .timeout(Duration::from_secs(5))
//!         .build()?;
//!
//!     let graph = collector.collect(15, Aggregation::Average).await?;
//!     for node in &graph.nodes {
//!         println!("{}: {}", node.id, node.name);
//!     }
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use radar_types::{Graph, ReshapeRules};

use crate::query::{build_query, Aggregation};
use crate::{build_graph, parse_response, CollectorError, Propagation};

/// Upper bound on a single upstream call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Collector that queries a Prometheus-compatible store for probe results.
#[derive(Debug, Clone)]
pub struct ProbeCollector {
    client: Client,
    target: Url,
    filter: String,
    rules: ReshapeRules,
    propagation: Propagation,
}

impl ProbeCollector {
    /// Create a new builder for configuring the collector.
    pub fn builder() -> ProbeCollectorBuilder {
        ProbeCollectorBuilder::default()
    }

    /// Reshape rules applied to every graph.
    pub fn rules(&self) -> &ReshapeRules {
        &self.rules
    }

    /// Query the store and build the propagated graph.
    pub async fn collect(
        &self,
        window: i64,
        aggregation: Aggregation,
    ) -> Result<Graph, CollectorError> {
        let query = build_query(window, aggregation, &self.target, &self.filter)?;
        debug!(query = %query.query, url = %query.url, "querying metrics store");

        let mut request = self.client.get(query.url.clone());
        if let Some(creds) = &query.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = request.send().await.inspect_err(|e| {
            warn!(error = %e, "metrics store request failed");
        })?;
        let status = response.status();
        let body = response.bytes().await?;

        // Error envelopes come with 4xx/5xx, so parse before looking at the status.
        let samples = match parse_response(&body) {
            Ok(samples) => samples,
            Err(CollectorError::Parse(_)) if !status.is_success() => {
                warn!(%status, "metrics store returned an error status");
                return Err(CollectorError::Transport(format!(
                    "metrics store returned status {}",
                    status
                )));
            }
            Err(e) => {
                warn!(error = %e, "unusable metrics store response");
                return Err(e);
            }
        };

        let graph = build_graph(&samples, &self.rules, self.propagation);
        debug!(
            window,
            %aggregation,
            samples = samples.len(),
            nodes = graph.nodes.len(),
            connections = graph.connections.len(),
            "built graph"
        );
        Ok(graph)
    }
}

/// Builder for ProbeCollector.
#[derive(Debug, Default)]
pub struct ProbeCollectorBuilder {
    target: Option<Url>,
    filter: Option<String>,
    rules: Option<ReshapeRules>,
    propagation: Option<Propagation>,
    timeout: Option<Duration>,
}

impl ProbeCollectorBuilder {
    /// Set the store's base URL. User info becomes HTTP Basic auth.
    pub fn target(mut self, target: Url) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the label-selector fragment appended to `probe_success`.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Set the reshape rules.
    pub fn rules(mut self, rules: impl Into<ReshapeRules>) -> Self {
        self.rules = Some(rules.into());
        self
    }

    /// Set the propagation variant (default: sequential).
    pub fn propagation(mut self, propagation: Propagation) -> Self {
        self.propagation = Some(propagation);
        self
    }

    /// Set the request timeout (default: 20 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the collector.
    pub fn build(self) -> Result<ProbeCollector, CollectorError> {
        let target = self
            .target
            .ok_or_else(|| CollectorError::InvalidTarget("no target configured".to_string()))?;
        if target.cannot_be_a_base() {
            return Err(CollectorError::InvalidTarget(format!(
                "{}: not a base URL",
                target.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(|e| CollectorError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(ProbeCollector {
            client,
            target,
            filter: self.filter.unwrap_or_default(),
            rules: self.rules.unwrap_or_default(),
            propagation: self.propagation.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use http_body_util::Full;
    use hyper::body::Bytes;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::{Request, Response, StatusCode};
    use hyper_util::rt::TokioIo;
    use radar_types::ReshapeRule;
    use tokio::net::TcpListener;

    /// Request line and Authorization header seen by the fake store.
    type Seen = Arc<Mutex<Vec<(String, Option<String>)>>>;

    /// Serve a fixed response on a random local port.
    async fn fake_store(status: StatusCode, body: &'static str) -> (SocketAddr, Seen) {
        slow_store(status, body, Duration::ZERO).await
    }

    /// Like `fake_store`, but waits `delay` before answering.
    async fn slow_store(
        status: StatusCode,
        body: &'static str,
        delay: Duration,
    ) -> (SocketAddr, Seen) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let seen_server = seen.clone();

        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let seen = seen_server.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                        let auth = req
                            .headers()
                            .get("authorization")
                            .map(|v| v.to_str().unwrap().to_string());
                        seen.lock().unwrap().push((req.uri().to_string(), auth));
                        async move {
                            tokio::time::sleep(delay).await;
                            let mut response = Response::new(Full::new(Bytes::from(body)));
                            *response.status_mut() = status;
                            Ok::<_, Infallible>(response)
                        }
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        (addr, seen)
    }

    fn collector(target: &str) -> ProbeCollector {
        ProbeCollector::builder()
            .target(Url::parse(target).unwrap())
            .build()
            .unwrap()
    }

    const ONE_RESULT: &str = r#"{"status":"success","data":{"resultType":"vector","result":[
        {"metric":{"hostname":"h1","target":"h2"},"value":[0,"1"]}]}}"#;

    #[test]
    fn test_builder_defaults() {
        let collector = collector("http://localhost:9090");
        assert_eq!(collector.filter, "");
        assert!(collector.rules().is_empty());
        assert_eq!(collector.propagation, Propagation::Sequential);
    }

    #[test]
    fn test_builder_requires_target() {
        let err = ProbeCollector::builder().build().unwrap_err();
        assert!(matches!(err, CollectorError::InvalidTarget(_)));
    }

    #[test]
    fn test_builder_custom() {
        let collector = ProbeCollector::builder()
            .target(Url::parse("http://prom:9090").unwrap())
            .filter("{job=\"icmp\"}")
            .rules(vec![ReshapeRule::new("a").to("A")])
            .propagation(Propagation::Snapshot)
            .timeout(Duration::from_secs(1))
            .build()
            .unwrap();

        assert_eq!(collector.filter, "{job=\"icmp\"}");
        assert_eq!(collector.rules().shape("a"), "A");
        assert_eq!(collector.propagation, Propagation::Snapshot);
    }

    #[tokio::test]
    async fn test_collect_end_to_end() {
        let (addr, seen) = fake_store(StatusCode::OK, ONE_RESULT).await;
        let collector = collector(&format!("http://{}", addr));

        let graph = collector.collect(10, Aggregation::Average).await.unwrap();
        assert_eq!(
            serde_json::to_value(&graph).unwrap(),
            serde_json::json!({
                "nodes": [
                    {"id": 0, "name": "h1", "attrs": [], "size": 15},
                    {"id": 1, "name": "h2", "attrs": [], "size": 15}
                ],
                "connections": [{"source": 0, "target": 1, "strength": 1.0}]
            })
        );

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let uri = Url::parse(&format!("http://{}{}", addr, seen[0].0)).unwrap();
        assert_eq!(uri.path(), "/api/v1/query");
        let query: Vec<_> = uri.query_pairs().collect();
        assert_eq!(query.len(), 1);
        assert_eq!(query[0].1, "avg_over_time(probe_success[10m])");
        assert_eq!(seen[0].1, None);
    }

    #[tokio::test]
    async fn test_collect_sends_basic_auth() {
        let (addr, seen) = fake_store(StatusCode::OK, ONE_RESULT).await;
        let collector = ProbeCollector::builder()
            .target(Url::parse(&format!("http://user:pass@{}", addr)).unwrap())
            .filter("{job=\"x\"}")
            .build()
            .unwrap();

        collector.collect(5, Aggregation::Minimum).await.unwrap();

        let seen = seen.lock().unwrap();
        // base64("user:pass")
        assert_eq!(seen[0].1.as_deref(), Some("Basic dXNlcjpwYXNz"));
        let uri = Url::parse(&format!("http://{}{}", addr, seen[0].0)).unwrap();
        let (_, query) = uri.query_pairs().next().unwrap();
        assert_eq!(query, "min_over_time(probe_success{job=\"x\"}[5m])");
    }

    #[tokio::test]
    async fn test_collect_query_failed() {
        let (addr, _) = fake_store(
            StatusCode::BAD_REQUEST,
            r#"{"status":"error","errorType":"bad_data","error":"parse error"}"#,
        )
        .await;
        let err = collector(&format!("http://{}", addr))
            .collect(10, Aggregation::Average)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectorError::QueryFailed { .. }));
    }

    #[tokio::test]
    async fn test_collect_http_error_without_envelope() {
        let (addr, _) = fake_store(StatusCode::BAD_GATEWAY, "upstream down").await;
        let err = collector(&format!("http://{}", addr))
            .collect(10, Aggregation::Average)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectorError::Transport(ref m) if m.contains("502")));
    }

    #[tokio::test]
    async fn test_collect_garbage_body() {
        let (addr, _) = fake_store(StatusCode::OK, "<html>").await;
        let err = collector(&format!("http://{}", addr))
            .collect(10, Aggregation::Average)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectorError::Parse(_)));
    }

    #[tokio::test]
    async fn test_collect_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = collector(&format!("http://{}", addr))
            .collect(10, Aggregation::Average)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectorError::Transport(_)));
    }

    #[tokio::test]
    async fn test_collect_times_out() {
        let (addr, seen) = slow_store(StatusCode::OK, ONE_RESULT, Duration::from_secs(5)).await;
        let collector = ProbeCollector::builder()
            .target(Url::parse(&format!("http://{}", addr)).unwrap())
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();

        let started = std::time::Instant::now();
        let err = collector
            .collect(10, Aggregation::Average)
            .await
            .unwrap_err();

        assert!(matches!(err, CollectorError::Transport(ref m) if m.contains("timed out")));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_collect_decodes_basic_auth() {
        let (addr, seen) = fake_store(StatusCode::OK, ONE_RESULT).await;
        let collector = ProbeCollector::builder()
            .target(Url::parse(&format!("http://admin:p%40ss@{}", addr)).unwrap())
            .build()
            .unwrap();

        collector.collect(10, Aggregation::Average).await.unwrap();

        // base64("admin:p@ss")
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].1.as_deref(), Some("Basic YWRtaW46cEBzcw=="));
    }

    #[tokio::test]
    async fn test_invalid_window_skips_network() {
        let (addr, seen) = fake_store(StatusCode::OK, ONE_RESULT).await;
        let collector = collector(&format!("http://{}", addr));

        let err = collector.collect(61, Aggregation::Average).await.unwrap_err();
        assert!(matches!(err, CollectorError::InvalidWindow(61)));
        assert!(seen.lock().unwrap().is_empty());
    }
}
