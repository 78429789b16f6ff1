//! Endpoint location types.
//!
//! A query compares two endpoints (client and server). Each starts as a
//! [`LocationSpec`] describing how the user identified it, and becomes a
//! [`ResolvedLocation`] once geocoding has run. The serialized field names
//! (`"lat"`, `"lng"`, `"State/Region"`, ...) are part of the debug-view
//! contract and must not change.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One of the two parties being compared in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Client,
    Server,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Client => write!(f, "client"),
            Endpoint::Server => write!(f, "server"),
        }
    }
}

/// How the user identified one endpoint in the query form.
///
/// The variant determines which payload is meaningful; there is no way to
/// carry a partially-populated payload from another kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LocationSpec {
    Global,
    LatLng {
        latitude: f64,
        longitude: f64,
    },
    CityRegionCountry {
        city: String,
        region: String,
        country: String,
    },
}

/// Administrative category attached to a geocoded location.
///
/// Declaration order is the order labels appear in backend query strings
/// (`Zip` is resolved for display but never sent).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum AdminLabel {
    City,
    County,
    #[serde(rename = "State/Region")]
    StateRegion,
    Country,
    Zip,
}

impl AdminLabel {
    /// The key the geocoded value is stored and displayed under.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AdminLabel::City => "City",
            AdminLabel::County => "County",
            AdminLabel::StateRegion => "State/Region",
            AdminLabel::Country => "Country",
            AdminLabel::Zip => "Zip",
        }
    }
}

/// Administrative labels for a resolved location, at most one value per
/// category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdminLabels(BTreeMap<AdminLabel, String>);

impl AdminLabels {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a label value. The first occurrence wins: inserting into an
    /// already-set category is a no-op and returns `false`.
    pub fn insert(&mut self, label: AdminLabel, name: String) -> bool {
        match self.0.entry(label) {
            Entry::Vacant(slot) => {
                slot.insert(name);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    #[must_use]
    pub fn get(&self, label: AdminLabel) -> Option<&str> {
        self.0.get(&label).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates labels in their fixed category order.
    pub fn iter(&self) -> impl Iterator<Item = (AdminLabel, &str)> {
        self.0.iter().map(|(label, name)| (*label, name.as_str()))
    }
}

/// A geocoded endpoint.
///
/// Produced once per query submission and immutable afterwards; a new
/// submission replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResolvedLocation {
    Global,
    Resolved {
        #[serde(rename = "lat")]
        latitude: f64,
        #[serde(rename = "lng")]
        longitude: f64,
        #[serde(default, skip_serializing_if = "AdminLabels::is_empty")]
        labels: AdminLabels,
    },
}

impl ResolvedLocation {
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, ResolvedLocation::Global)
    }

    /// The labels of a resolved (non-global) location, if any.
    #[must_use]
    pub fn labels(&self) -> Option<&AdminLabels> {
        match self {
            ResolvedLocation::Global => None,
            ResolvedLocation::Resolved { labels, .. } => Some(labels),
        }
    }
}
