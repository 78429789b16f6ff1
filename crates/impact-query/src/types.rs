//! Backend response types.

use serde::Deserialize;
use serde_json::Value;

use impact_core::NetworkData;

/// Body of a `/query` response.
///
/// The backend echoes the location pair it resolved and attaches
/// `"network data"`: the `"loading..."` sentinel, an incomplete job
/// reference, or the completed statistics. A backend-side failure arrives as
/// an `err`/`error` message instead of network data.
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub client: Option<Value>,
    #[serde(default)]
    pub server: Option<Value>,
    #[serde(rename = "network data", default)]
    pub network_data: NetworkData,
    #[serde(default, alias = "error")]
    pub err: Option<String>,
}
