//! The aggregate state of one in-flight or completed query.
//!
//! [`QueryResult`] is owned by the orchestrator for the duration of a single
//! submission and replaced wholesale when a new one starts. Its JSON form is
//! the debug view shown to the user, so the wire names (`"network data"` with
//! a space, the `"loading..."` sentinel, `"jobID"`) are load-bearing.

use serde::de::Error as DeError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::location::{Endpoint, ResolvedLocation};

/// The string the backend (and the original dashboard) uses as a
/// "results not here yet" placeholder for network data.
pub const LOADING_SENTINEL: &str = "loading...";

/// Per-metric aggregate reported by the backend: a mean and a standard
/// deviation over the sampled measurements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricStats {
    pub average: f64,
    pub stdev: f64,
}

/// The completed statistics payload of a query.
///
/// The backend reports one aggregate row: a `"sample size"` count plus a
/// `{ "average": ..., "stdev": ... }` object per metric field. Numeric values
/// arrive as JSON numbers or as strings depending on the data source, so the
/// raw object is kept verbatim (it is what round-trips through the debug
/// view) and typed views are derived on read.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkStats {
    raw: Map<String, Value>,
}

impl NetworkStats {
    #[must_use]
    pub fn from_object(raw: Map<String, Value>) -> Self {
        Self { raw }
    }

    #[must_use]
    pub fn as_object(&self) -> &Map<String, Value> {
        &self.raw
    }

    #[must_use]
    pub fn into_object(self) -> Map<String, Value> {
        self.raw
    }

    /// Number of measurements aggregated into this payload.
    #[must_use]
    pub fn sample_size(&self) -> Option<u64> {
        self.raw.get("sample size").and_then(as_u64_lenient)
    }

    /// Mean and standard deviation for a metric field, e.g. `"SampleRTT"`.
    #[must_use]
    pub fn metric(&self, field: &str) -> Option<MetricStats> {
        let entry = self.raw.get(field)?.as_object()?;
        Some(MetricStats {
            average: as_f64_lenient(entry.get("average")?)?,
            stdev: as_f64_lenient(entry.get("stdev")?)?,
        })
    }
}

fn as_f64_lenient(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

fn as_u64_lenient(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// Network-data slot of a [`QueryResult`].
///
/// `Loading` only exists between submission and the first backend response;
/// once a poll cycle has started the slot moves between `Partial` and
/// `Complete` and the presentation layer never observes the sentinel again.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum NetworkData {
    #[default]
    Absent,
    Loading,
    Partial {
        job_id: String,
    },
    Complete(NetworkStats),
}

impl NetworkData {
    /// Interprets the wire form: `null`, the `"loading..."` sentinel, or an
    /// object with a boolean `complete` (and a `jobID` while incomplete).
    ///
    /// # Errors
    ///
    /// Returns a description of the shape mismatch when `value` is none of
    /// the recognized forms.
    pub fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(NetworkData::Absent),
            Value::String(s) if s == LOADING_SENTINEL => Ok(NetworkData::Loading),
            Value::String(s) => Err(format!("unexpected network data sentinel {s:?}")),
            Value::Object(map) => {
                let complete = map
                    .get("complete")
                    .and_then(Value::as_bool)
                    .ok_or_else(|| "network data object lacks a boolean \"complete\"".to_owned())?;
                if complete {
                    Ok(NetworkData::Complete(NetworkStats::from_object(map)))
                } else {
                    let job_id = map
                        .get("jobID")
                        .and_then(Value::as_str)
                        .ok_or_else(|| "incomplete network data lacks a \"jobID\"".to_owned())?
                        .to_owned();
                    Ok(NetworkData::Partial { job_id })
                }
            }
            other => Err(format!(
                "network data must be null, the loading sentinel, or an object; got {other}"
            )),
        }
    }
}

impl Serialize for NetworkData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NetworkData::Absent => serializer.serialize_none(),
            NetworkData::Loading => serializer.serialize_str(LOADING_SENTINEL),
            NetworkData::Partial { job_id } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("complete", &false)?;
                map.serialize_entry("jobID", job_id)?;
                map.end()
            }
            NetworkData::Complete(stats) => stats.as_object().serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for NetworkData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        NetworkData::from_value(value).map_err(D::Error::custom)
    }
}

/// Why a query submission ended without network data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "lowercase")]
pub enum QueryFailure {
    /// Geocoding failed for one endpoint; `status` is the service's failure
    /// status (e.g. `ZERO_RESULTS`).
    Geocode { endpoint: Endpoint, status: String },
    /// The initial backend query failed or returned an unusable body.
    Query { message: String },
    /// Polling ended without a completed job.
    Poll { message: String },
}

impl std::fmt::Display for QueryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryFailure::Geocode { endpoint, status } => {
                write!(f, "{endpoint} geocode failed: {status}")
            }
            QueryFailure::Query { message } => write!(f, "query failed: {message}"),
            QueryFailure::Poll { message } => write!(f, "poll failed: {message}"),
        }
    }
}

/// Everything known about one query submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<ResolvedLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ResolvedLocation>,
    #[serde(rename = "network data", default)]
    pub network_data: NetworkData,
    #[serde(rename = "err", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryFailure>,
}

impl QueryResult {
    /// A fresh result for a just-submitted query: nothing resolved yet and
    /// network data in the loading placeholder state.
    #[must_use]
    pub fn loading() -> Self {
        Self {
            network_data: NetworkData::Loading,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
