//! Query builder for the Prometheus instant-query API.
//!
//! Builds the `probe_success` aggregation over a window and the request
//! descriptor for `<target>/api/v1/query`. Nothing here touches the network.

use std::fmt;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::CollectorError;

/// Smallest accepted window, in minutes.
pub const MIN_WINDOW: i64 = 1;

/// Largest accepted window, in minutes.
pub const MAX_WINDOW: i64 = 60;

/// Window used when the caller does not pick one.
pub const DEFAULT_WINDOW: i64 = 10;

/// Metric every query aggregates.
pub const PROBE_METRIC: &str = "probe_success";

/// How samples are aggregated over the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregation {
    /// `avg_over_time`
    #[default]
    Average,
    /// `min_over_time`
    Minimum,
}

impl Aggregation {
    /// Pick the aggregation from a request's `method` parameter.
    ///
    /// Only `min` selects the minimum, everything else averages.
    pub fn from_method(method: Option<&str>) -> Self {
        match method {
            Some("min") => Aggregation::Minimum,
            _ => Aggregation::Average,
        }
    }

    /// PromQL range function name.
    pub fn function(self) -> &'static str {
        match self {
            Aggregation::Average => "avg_over_time",
            Aggregation::Minimum => "min_over_time",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function())
    }
}

/// HTTP Basic credentials taken from the target URL.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// User info of `url`, percent-decoded.
    fn from_url(url: &Url) -> Result<Option<Self>, CollectorError> {
        if url.username().is_empty() && url.password().is_none() {
            return Ok(None);
        }
        Ok(Some(Self {
            username: decode_userinfo(url.username())?,
            password: decode_userinfo(url.password().unwrap_or_default())?,
        }))
    }
}

fn decode_userinfo(raw: &str) -> Result<String, CollectorError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| CollectorError::InvalidTarget("credentials are not valid UTF-8".to_string()))
}

// Keep the password out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// A fully built, validated request against the metrics store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeQuery {
    /// Request URL, credentials stripped, `query` parameter appended.
    pub url: Url,
    /// The PromQL expression.
    pub query: String,
    /// Basic auth to attach, if the target carried any.
    pub credentials: Option<Credentials>,
}

/// Render the PromQL expression for a window.
///
/// `filter` is a label-selector fragment such as `{job="blackbox"}` and is
/// inserted verbatim.
pub fn expression(window: i64, aggregation: Aggregation, filter: &str) -> String {
    format!(
        "{}({}{}[{}m])",
        aggregation.function(),
        PROBE_METRIC,
        filter,
        window
    )
}

/// Validate the window and build the request for it.
pub fn build_query(
    window: i64,
    aggregation: Aggregation,
    target: &Url,
    filter: &str,
) -> Result<ProbeQuery, CollectorError> {
    if !(MIN_WINDOW..=MAX_WINDOW).contains(&window) {
        return Err(CollectorError::InvalidWindow(window));
    }

    let query = expression(window, aggregation, filter);
    let credentials = Credentials::from_url(target)?;
    let url = query_url(target, &query)?;

    Ok(ProbeQuery {
        url,
        query,
        credentials,
    })
}

fn query_url(target: &Url, query: &str) -> Result<Url, CollectorError> {
    let mut url = target.clone();
    if url.cannot_be_a_base() {
        return Err(CollectorError::InvalidTarget(format!(
            "{}: not a base URL",
            url.scheme()
        )));
    }

    // Both only fail for cannot-be-a-base URLs, ruled out above.
    let _ = url.set_username("");
    let _ = url.set_password(None);

    url.path_segments_mut()
        .map_err(|_| CollectorError::InvalidTarget("not a base URL".to_string()))?
        .pop_if_empty()
        .extend(["api", "v1", "query"]);
    url.query_pairs_mut().append_pair("query", query);

    Ok(url)
}
