//! Sample - one probe observation between two endpoints.

/// One reliability observation read from the metrics store.
///
/// `source_label` is the probing endpoint (the `hostname` label) and
/// `target_label` the probed one (the `target` label). The value is the
/// aggregated `probe_success` over the requested window, so it is usually
/// in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Raw label of the probing endpoint.
    pub source_label: String,

    /// Raw label of the probed endpoint.
    pub target_label: String,

    /// Aggregated probe success.
    pub raw_value: f64,
}

impl Sample {
    /// Create a sample.
    pub fn new(source: impl Into<String>, target: impl Into<String>, raw_value: f64) -> Self {
        Self {
            source_label: source.into(),
            target_label: target.into(),
            raw_value,
        }
    }
}
