//! Nominatim geocoder - forward geocoding against OpenStreetMap.
//!
//! Nominatim's usage policy caps clients at one request per second, so the
//! adapter throttles itself across concurrent callers. Results are compacted
//! to the fields the agent actually reasons about.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::ports::{Geocoder, GeocodingError, PlaceAddress, PlaceCandidate};

const USER_AGENT: &str = concat!("decide-linker/", env!("CARGO_PKG_VERSION"));
const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for the Nominatim geocoder.
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// Base URL of the Nominatim instance.
    pub endpoint: String,
    /// Maximum candidates per lookup.
    pub limit: usize,
    /// Request timeout.
    pub timeout: Duration,
}

impl NominatimConfig {
    /// Creates a configuration for the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            limit: 5,
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the candidate limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Geocoder backed by a Nominatim instance.
pub struct NominatimGeocoder {
    config: NominatimConfig,
    client: Client,
    last_request: Mutex<Option<Instant>>,
}

impl NominatimGeocoder {
    /// Creates a new Nominatim geocoder.
    pub fn new(config: NominatimConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            client,
            last_request: Mutex::new(None),
        }
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.config.endpoint.trim_end_matches('/'))
    }

    /// Waits out the usage-policy interval since the previous request.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < MIN_REQUEST_INTERVAL {
                tokio::time::sleep(MIN_REQUEST_INTERVAL - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn search(
        &self,
        query: &str,
        city: Option<&str>,
        country: Option<&str>,
    ) -> Result<Vec<PlaceCandidate>, GeocodingError> {
        self.throttle().await;

        let mut full_query = query.trim().to_string();
        if let Some(city) = city.filter(|c| !c.trim().is_empty()) {
            full_query.push_str(", ");
            full_query.push_str(city.trim());
        }

        let mut request = self.client.get(self.search_url()).query(&[
            ("q", full_query.as_str()),
            ("format", "jsonv2"),
            ("addressdetails", "1"),
            ("limit", &self.config.limit.to_string()),
        ]);
        if let Some(country) = country.filter(|c| !c.trim().is_empty()) {
            request = request.query(&[("countrycodes", country.trim().to_lowercase())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GeocodingError::unavailable(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(GeocodingError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodingError::unavailable(format!(
                "search returned {}: {}",
                status, body
            )));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| GeocodingError::InvalidResponse(e.to_string()))?;

        places.into_iter().map(compact_place).collect()
    }
}

/// Compacts a raw Nominatim result into a `PlaceCandidate`.
fn compact_place(place: NominatimPlace) -> Result<PlaceCandidate, GeocodingError> {
    let lat = place
        .lat
        .parse::<f64>()
        .map_err(|_| GeocodingError::InvalidResponse(format!("bad latitude '{}'", place.lat)))?;
    let lon = place
        .lon
        .parse::<f64>()
        .map_err(|_| GeocodingError::InvalidResponse(format!("bad longitude '{}'", place.lon)))?;

    let osm_url = match (place.osm_type.as_deref(), place.osm_id) {
        (Some(osm_type), Some(osm_id)) => Some(format!(
            "https://www.openstreetmap.org/{}/{}",
            osm_type, osm_id
        )),
        _ => None,
    };

    let address = place.address.unwrap_or_default();
    Ok(PlaceCandidate {
        display_name: place.display_name,
        lat,
        lon,
        osm_url,
        importance: place.importance,
        address: PlaceAddress {
            road: address.road,
            // Nominatim uses different keys depending on settlement size.
            city: address.city.or(address.town).or(address.village),
            postcode: address.postcode,
            country: address.country,
            country_code: address.country_code,
        },
        place_class: place.category,
        place_type: place.place_type,
    })
}

// ----- Wire Types -----

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: String,
    lat: String,
    lon: String,
    importance: Option<f64>,
    category: Option<String>,
    #[serde(rename = "type")]
    place_type: Option<String>,
    osm_type: Option<String>,
    osm_id: Option<u64>,
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    road: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_place() -> NominatimPlace {
        serde_json::from_str(
            r#"{
                "display_name": "Veldstraat, Gent, Oost-Vlaanderen, 9000, Belgium",
                "lat": "51.0520",
                "lon": "3.7217",
                "importance": 0.53,
                "category": "highway",
                "type": "pedestrian",
                "osm_type": "way",
                "osm_id": 24739038,
                "address": {
                    "road": "Veldstraat",
                    "city": "Gent",
                    "postcode": "9000",
                    "country": "Belgium",
                    "country_code": "be"
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn compact_place_builds_osm_url() {
        let candidate = compact_place(sample_place()).unwrap();
        assert_eq!(
            candidate.osm_url.as_deref(),
            Some("https://www.openstreetmap.org/way/24739038")
        );
        assert_eq!(candidate.address.city.as_deref(), Some("Gent"));
        assert!((candidate.lat - 51.0520).abs() < 1e-9);
    }

    #[test]
    fn compact_place_rejects_bad_coordinates() {
        let mut place = sample_place();
        place.lat = "not-a-number".to_string();
        assert!(matches!(
            compact_place(place),
            Err(GeocodingError::InvalidResponse(_))
        ));
    }

    #[test]
    fn town_falls_back_when_city_missing() {
        let place: NominatimPlace = serde_json::from_str(
            r#"{
                "display_name": "Zottegem",
                "lat": "50.87",
                "lon": "3.81",
                "address": {"town": "Zottegem", "country_code": "be"}
            }"#,
        )
        .unwrap();
        let candidate = compact_place(place).unwrap();
        assert_eq!(candidate.address.city.as_deref(), Some("Zottegem"));
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_spaces_requests_one_second_apart() {
        let geocoder = NominatimGeocoder::new(NominatimConfig::new("http://localhost:8088"));

        let start = Instant::now();
        geocoder.throttle().await;
        geocoder.throttle().await;
        assert!(start.elapsed() >= MIN_REQUEST_INTERVAL);
    }
}
