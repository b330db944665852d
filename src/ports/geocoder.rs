//! Geocoder Port - Interface for place name resolution.

use async_trait::async_trait;
use serde::Serialize;

/// Port for forward geocoding of place names and addresses.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Look up candidates for a free-text place query.
    ///
    /// `city` and `country` bias the search toward a region. An empty result
    /// vector means no match; callers decide how to present that.
    async fn search(
        &self,
        query: &str,
        city: Option<&str>,
        country: Option<&str>,
    ) -> Result<Vec<PlaceCandidate>, GeocodingError>;
}

/// A geocoding result, compacted to the fields the agent needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceCandidate {
    /// Human-readable full name.
    pub display_name: String,
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
    /// Canonical OpenStreetMap URL for the matched object.
    pub osm_url: Option<String>,
    /// Relative importance ranking from the geocoder.
    pub importance: Option<f64>,
    /// Structured address parts.
    pub address: PlaceAddress,
    /// Object class (e.g. "highway", "amenity").
    pub place_class: Option<String>,
    /// Object type within the class (e.g. "residential", "school").
    pub place_type: Option<String>,
}

/// Structured address components of a place candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaceAddress {
    /// Street name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road: Option<String>,
    /// City or town.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Postal code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    /// Country name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// ISO country code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

/// Geocoding errors.
#[derive(Debug, thiserror::Error)]
pub enum GeocodingError {
    /// Service unreachable or returned a server error.
    #[error("geocoding service unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Rate limited by the service's usage policy.
    #[error("geocoding rate limited")]
    RateLimited,

    /// Malformed service response.
    #[error("geocoding response error: {0}")]
    InvalidResponse(String),
}

impl GeocodingError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}
