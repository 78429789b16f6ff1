//! Geocoding service response types.
//!
//! Models the JSON the mapping service returns for both forward (address)
//! and reverse (`latlng`) lookups: a `status` string plus a list of results,
//! each carrying address components and a geometry.

use serde::Deserialize;

/// Top-level geocoding response. `status` is `"OK"` on success; failure
/// statuses (`ZERO_RESULTS`, `OVER_QUERY_LIMIT`, ...) are surfaced verbatim.
#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

/// One candidate location in a geocoding response.
#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
    pub geometry: Geometry,
}

/// A named piece of a result's address. `types` is ordered most- to
/// least-specific; only the first entry is used for classification.
#[derive(Debug, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: Coordinate,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}
