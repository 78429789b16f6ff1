//! HTTP client for the external geocoding service.
//!
//! One lookup per call, no retries at this layer: a global spec resolves
//! locally, a coordinate pair becomes a reverse lookup, and a
//! city/region/country triple becomes a single free-text forward lookup.

use std::time::Duration;

use reqwest::{Client, Url};

use impact_core::{AdminLabel, AdminLabels, Endpoint, LocationSpec, ResolvedLocation};

use crate::error::GeocodeError;
use crate::types::{GeocodeResponse, GeocodeResult};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Client for the geocoding service.
///
/// Use [`GeocoderClient::new`] for production or
/// [`GeocoderClient::with_base_url`] to point at a mock server in tests.
pub struct GeocoderClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl GeocoderClient {
    /// Creates a client pointed at the production geocoding endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Setup`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        api_key: Option<&str>,
    ) -> Result<Self, GeocodeError> {
        Self::with_base_url(timeout_secs, user_agent, api_key, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Setup`] if the underlying `reqwest::Client`
    /// cannot be constructed or `base_url` is not a valid URL.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        api_key: Option<&str>,
        base_url: &str,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()
            .map_err(|e| GeocodeError::Setup(e.to_string()))?;

        let base_url = Url::parse(base_url)
            .map_err(|e| GeocodeError::Setup(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.map(str::to_owned),
        })
    }

    /// Resolves one endpoint's location spec.
    ///
    /// A `Global` spec completes immediately without any network call.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::Failed`] if the service reports a non-OK status or
    ///   zero results.
    /// - [`GeocodeError::Transport`] on network failure or a non-2xx status.
    /// - [`GeocodeError::Deserialize`] if the body is not the expected shape.
    pub async fn resolve(
        &self,
        endpoint: Endpoint,
        spec: &LocationSpec,
    ) -> Result<ResolvedLocation, GeocodeError> {
        match spec {
            LocationSpec::Global => Ok(ResolvedLocation::Global),
            LocationSpec::LatLng {
                latitude,
                longitude,
            } => self.resolve_latlng(endpoint, *latitude, *longitude).await,
            LocationSpec::CityRegionCountry {
                city,
                region,
                country,
            } => {
                let address = free_text_address(city, region, country);
                self.resolve_address(endpoint, &address).await
            }
        }
    }

    /// Reverse lookup: the resolved coordinate is the service's normalized
    /// one, not the input, and no administrative labels are attached.
    async fn resolve_latlng(
        &self,
        endpoint: Endpoint,
        latitude: f64,
        longitude: f64,
    ) -> Result<ResolvedLocation, GeocodeError> {
        let latlng = format!("{latitude},{longitude}");
        let results = self.fetch(endpoint, &[("latlng", &latlng)]).await?;
        let (lat, lng, _) = merge_results(&results);
        Ok(ResolvedLocation::Resolved {
            latitude: lat,
            longitude: lng,
            labels: AdminLabels::new(),
        })
    }

    async fn resolve_address(
        &self,
        endpoint: Endpoint,
        address: &str,
    ) -> Result<ResolvedLocation, GeocodeError> {
        let results = self.fetch(endpoint, &[("address", address)]).await?;
        let (latitude, longitude, labels) = merge_results(&results);
        tracing::info!(%endpoint, labels = labels.len(), "geocode resolved");
        Ok(ResolvedLocation::Resolved {
            latitude,
            longitude,
            labels,
        })
    }

    /// Sends one GET request and returns the non-empty result list.
    async fn fetch(
        &self,
        endpoint: Endpoint,
        params: &[(&str, &str)],
    ) -> Result<Vec<GeocodeResult>, GeocodeError> {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
            if let Some(key) = &self.api_key {
                pairs.append_pair("key", key);
            }
        }

        let transport = |source| GeocodeError::Transport { endpoint, source };
        let response = self.client.get(url).send().await.map_err(transport)?;
        let response = response.error_for_status().map_err(transport)?;
        let body = response.text().await.map_err(transport)?;

        let parsed: GeocodeResponse = serde_json::from_str(&body)
            .map_err(|source| GeocodeError::Deserialize { endpoint, source })?;

        if parsed.status != "OK" {
            return Err(GeocodeError::Failed {
                endpoint,
                status: parsed.status,
            });
        }
        if parsed.results.is_empty() {
            return Err(GeocodeError::Failed {
                endpoint,
                status: "ZERO_RESULTS".to_owned(),
            });
        }
        Ok(parsed.results)
    }
}

/// Builds the free-text lookup string from the form fields. Every populated
/// field except the country is followed by `", "` — including the trailing
/// separator when the country is empty, which is the request shape the
/// service has always been sent.
fn free_text_address(city: &str, region: &str, country: &str) -> String {
    let mut address = String::new();
    if !city.is_empty() {
        address.push_str(city);
        address.push_str(", ");
    }
    if !region.is_empty() {
        address.push_str(region);
        address.push_str(", ");
    }
    if !country.is_empty() {
        address.push_str(country);
    }
    address
}

/// Folds a result list into one location.
///
/// Labels are collected across all results, first occurrence winning; each
/// component is classified by the first entry of its `types` list only. The
/// coordinate comes from the last result's geometry — later results
/// overwrite earlier ones, which is the dashboard's longstanding behavior
/// and is kept intentionally.
fn merge_results(results: &[GeocodeResult]) -> (f64, f64, AdminLabels) {
    let mut labels = AdminLabels::new();
    let mut coordinate = (0.0, 0.0);

    for result in results {
        for component in &result.address_components {
            let Some(tag) = component.types.first() else {
                continue;
            };
            if let Some(label) = admin_label_for(tag) {
                labels.insert(label, component.long_name.clone());
            }
        }
        coordinate = (result.geometry.location.lat, result.geometry.location.lng);
    }

    (coordinate.0, coordinate.1, labels)
}

/// Fixed classification table from component type tags to label categories.
fn admin_label_for(tag: &str) -> Option<AdminLabel> {
    match tag {
        "country" => Some(AdminLabel::Country),
        "administrative_area_level_1" => Some(AdminLabel::StateRegion),
        "administrative_area_level_2" => Some(AdminLabel::County),
        "locality" => Some(AdminLabel::City),
        "postal_code" => Some(AdminLabel::Zip),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AddressComponent, Coordinate, Geometry};

    fn component(long_name: &str, types: &[&str]) -> AddressComponent {
        AddressComponent {
            long_name: long_name.to_owned(),
            types: types.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    fn result(components: Vec<AddressComponent>, lat: f64, lng: f64) -> GeocodeResult {
        GeocodeResult {
            address_components: components,
            geometry: Geometry {
                location: Coordinate { lat, lng },
            },
        }
    }

    #[test]
    fn address_joins_populated_fields_with_comma_space() {
        assert_eq!(
            free_text_address("Durham", "North Carolina", "United States"),
            "Durham, North Carolina, United States"
        );
        assert_eq!(free_text_address("", "", "France"), "France");
        assert_eq!(free_text_address("Paris", "", "France"), "Paris, France");
    }

    #[test]
    fn address_keeps_trailing_separator_without_country() {
        assert_eq!(
            free_text_address("Durham", "North Carolina", ""),
            "Durham, North Carolina, "
        );
    }

    #[test]
    fn merge_takes_coordinate_from_last_result() {
        let results = vec![
            result(vec![component("Durham", &["locality"])], 35.99, -78.9),
            result(vec![], 36.1, -79.2),
        ];
        let (lat, lng, labels) = merge_results(&results);
        assert!((lat - 36.1).abs() < f64::EPSILON);
        assert!((lng - (-79.2)).abs() < f64::EPSILON);
        assert_eq!(labels.get(AdminLabel::City), Some("Durham"));
    }

    #[test]
    fn merge_keeps_first_occurrence_of_each_label() {
        let results = vec![
            result(vec![component("United States", &["country"])], 1.0, 1.0),
            result(vec![component("Canada", &["country"])], 2.0, 2.0),
        ];
        let (_, _, labels) = merge_results(&results);
        assert_eq!(labels.get(AdminLabel::Country), Some("United States"));
    }

    #[test]
    fn merge_classifies_by_first_type_tag_only() {
        // "country" is present but not first, so the component is skipped.
        let results = vec![result(
            vec![component("United States", &["political", "country"])],
            1.0,
            1.0,
        )];
        let (_, _, labels) = merge_results(&results);
        assert!(labels.get(AdminLabel::Country).is_none());
    }

    #[test]
    fn merge_ignores_unrecognized_tags() {
        let results = vec![result(
            vec![
                component("Some Route", &["route"]),
                component("27701", &["postal_code"]),
            ],
            1.0,
            1.0,
        )];
        let (_, _, labels) = merge_results(&results);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels.get(AdminLabel::Zip), Some("27701"));
    }

    #[test]
    fn label_table_matches_service_tags() {
        assert_eq!(admin_label_for("locality"), Some(AdminLabel::City));
        assert_eq!(
            admin_label_for("administrative_area_level_1"),
            Some(AdminLabel::StateRegion)
        );
        assert_eq!(
            admin_label_for("administrative_area_level_2"),
            Some(AdminLabel::County)
        );
        assert_eq!(admin_label_for("country"), Some(AdminLabel::Country));
        assert_eq!(admin_label_for("postal_code"), Some(AdminLabel::Zip));
        assert_eq!(admin_label_for("sublocality"), None);
    }
}
