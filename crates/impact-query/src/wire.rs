//! Backend query-string construction.
//!
//! The parameter names and value encoding are the backend's wire contract:
//! `{prefix}Type` is `global` or `cityregioncountry` (a `latlng` spec only
//! exists client-side, during geocoding), label values travel with spaces
//! replaced by `+`, and fields appear in a fixed order.

use impact_core::{AdminLabel, Endpoint, ResolvedLocation};

/// Labels sent to the backend, in wire order. `State/Region` travels as the
/// `Region` parameter; `Zip` is resolved for display but never sent.
const SENT_FIELDS: [(AdminLabel, &str); 4] = [
    (AdminLabel::City, "City"),
    (AdminLabel::County, "County"),
    (AdminLabel::StateRegion, "Region"),
    (AdminLabel::Country, "Country"),
];

fn prefix(endpoint: Endpoint) -> &'static str {
    match endpoint {
        Endpoint::Client => "c",
        Endpoint::Server => "s",
    }
}

/// Renders one endpoint's portion of the query string.
#[must_use]
pub fn location_params(endpoint: Endpoint, location: &ResolvedLocation) -> String {
    let p = prefix(endpoint);
    match location {
        ResolvedLocation::Global => format!("{p}Type=global"),
        ResolvedLocation::Resolved { labels, .. } => {
            let mut params = format!("{p}Type=cityregioncountry");
            for (label, field) in SENT_FIELDS {
                if let Some(value) = labels.get(label) {
                    params.push('&');
                    params.push_str(p);
                    params.push_str(field);
                    params.push('=');
                    params.push_str(&value.replace(' ', "+"));
                }
            }
            params
        }
    }
}

/// Renders the full query string for a client/server location pair.
#[must_use]
pub fn query_params(client: &ResolvedLocation, server: &ResolvedLocation) -> String {
    format!(
        "{}&{}",
        location_params(Endpoint::Client, client),
        location_params(Endpoint::Server, server)
    )
}
