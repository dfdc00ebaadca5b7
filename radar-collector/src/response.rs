//! Response parser for Prometheus instant-query results.

use std::collections::HashMap;

use radar_types::Sample;
use serde::Deserialize;

use crate::CollectorError;

/// Label carrying the probing endpoint.
pub const SOURCE_LABEL: &str = "hostname";

/// Label carrying the probed endpoint.
pub const TARGET_LABEL: &str = "target";

const SUCCESS: &str = "success";

/// Decode a query response into samples, in result order.
///
/// Any value that is not a number fails the whole response.
pub fn parse_response(body: &[u8]) -> Result<Vec<Sample>, CollectorError> {
    let response: QueryResponse =
        serde_json::from_slice(body).map_err(|e| CollectorError::Parse(e.to_string()))?;

    if response.status != SUCCESS {
        return Err(CollectorError::QueryFailed {
            status: response.status,
            error_type: response.error_type,
            error: response.error,
        });
    }

    response
        .data
        .result
        .into_iter()
        .map(VectorResult::into_sample)
        .collect()
}

/// Envelope returned by `/api/v1/query`.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: QueryData,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryData {
    #[serde(default, rename = "resultType")]
    #[allow(dead_code)]
    result_type: String,
    #[serde(default)]
    result: Vec<VectorResult>,
}

#[derive(Debug, Deserialize)]
struct VectorResult {
    #[serde(default)]
    metric: HashMap<String, String>,
    /// `[unix_time, "value"]`
    value: (f64, String),
}

impl VectorResult {
    fn into_sample(mut self) -> Result<Sample, CollectorError> {
        let (_, value) = self.value;
        let raw_value = value
            .parse::<f64>()
            .map_err(|e| CollectorError::ValueFormat {
                reason: e.to_string(),
                value: value.clone(),
            })?;

        // A missing label shows up as an empty endpoint name.
        let source = self.metric.remove(SOURCE_LABEL).unwrap_or_default();
        let target = self.metric.remove(TARGET_LABEL).unwrap_or_default();

        Ok(Sample::new(source, target, raw_value))
    }
}
