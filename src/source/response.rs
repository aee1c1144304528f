//! Prometheus instant-query envelope.
//!
//! Only the parts of the `/api/v1/query` response the monitor needs are
//! modelled. Error envelopes omit `data`, and an empty vector may come back
//! as `"result": null`; both decode as an empty set.

use serde::Deserialize;
use serde_json::Value;

use super::QueryError;

/// Status string the backend uses for a successful query.
const STATUS_SUCCESS: &str = "success";

/// Top-level response body of an instant query.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    pub status: String,
    #[serde(default)]
    pub data: Option<QueryData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryData {
    #[serde(default)]
    pub result: Option<Vec<Series>>,
}

/// One returned series: `value` is `[timestamp, "number"]`.
#[derive(Debug, Clone, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub value: Option<Vec<Value>>,
}

impl Series {
    /// Instantaneous value of the series, if it carries a number.
    ///
    /// `NaN` and `-Inf` never win a maximum and are treated as absent.
    /// `+Inf` is kept: it is above any threshold.
    pub fn sample(&self) -> Option<f64> {
        match self.value.as_deref() {
            Some([_, Value::String(raw)]) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| !v.is_nan() && *v != f64::NEG_INFINITY),
            _ => None,
        }
    }
}

impl QueryResponse {
    pub fn series(&self) -> &[Series] {
        self.data
            .as_ref()
            .and_then(|d| d.result.as_deref())
            .unwrap_or_default()
    }

    /// Reduce the envelope to a single value, the maximum across series.
    pub fn into_value(self) -> Result<f64, QueryError> {
        if self.status != STATUS_SUCCESS || self.series().is_empty() {
            return Err(QueryError::NoData);
        }
        max_value(self.series()).ok_or(QueryError::NoValidValue)
    }
}

/// Largest usable value across `series`; unusable series are ignored.
pub fn max_value(series: &[Series]) -> Option<f64> {
    series
        .iter()
        .filter_map(Series::sample)
        .fold(None, |max: Option<f64>, v| Some(max.map_or(v, |m| m.max(v))))
}
