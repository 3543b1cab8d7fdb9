//! POI enrichment: nearby places used as risk and traffic signals
//!
//! Each segment coordinate is looked up against one or more providers.
//! Provider failures never fail the pipeline: they are logged and
//! contribute an empty set. Results from different providers are kept
//! distinct (no cross-provider deduplication) and merged for scoring.

use tracing::{debug, instrument, warn};

use crate::config::SafeRouteConfig;
use crate::error::SafeRouteError;
use crate::models::{Coordinate, Poi, PoiCategory, TrafficLevel};

/// Provider abstraction for nearby-place lookups
pub trait PoiProvider {
    /// Provider name, used in logs
    fn name(&self) -> &str;

    /// Places within `radius_m` meters of `coord`, already mapped into
    /// the closed category set with risk assigned at fetch time
    fn nearby(&self, coord: Coordinate, radius_m: u32) -> Result<Vec<Poi>, SafeRouteError>;
}

/// Merges nearby-place results from independent providers
pub struct PoiEnricher {
    providers: Vec<Box<dyn PoiProvider>>,
    radius_m: u32,
}

impl PoiEnricher {
    /// Create an enricher over the given providers
    pub fn new(providers: Vec<Box<dyn PoiProvider>>, config: &SafeRouteConfig) -> Self {
        Self {
            providers,
            radius_m: config.scoring.radius_meters,
        }
    }

    /// Collect POIs around a coordinate from every provider.
    ///
    /// Never fails: a provider error is logged at warn level and that
    /// provider contributes nothing.
    pub fn nearby(&self, coord: Coordinate) -> Vec<Poi> {
        let mut merged = Vec::new();

        for provider in &self.providers {
            match provider.nearby(coord, self.radius_m) {
                Ok(pois) => {
                    debug!(
                        "{} returned {} POIs near {}",
                        provider.name(),
                        pois.len(),
                        coord.format()
                    );
                    merged.extend(pois);
                }
                Err(err) => {
                    warn!(
                        "{} lookup failed near {}, treating as empty: {err}",
                        provider.name(),
                        coord.format()
                    );
                }
            }
        }

        merged
    }
}

/// Overpass API client querying bar, nightclub, and public-transport nodes
pub struct OverpassProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl OverpassProvider {
    /// Build a client from configuration
    pub fn new(config: &SafeRouteConfig) -> Result<Self, SafeRouteError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("saferoute/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SafeRouteError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.provider.overpass_url.clone(),
        })
    }
}

impl PoiProvider for OverpassProvider {
    fn name(&self) -> &str {
        "overpass"
    }

    #[instrument(skip(self))]
    fn nearby(&self, coord: Coordinate, radius_m: u32) -> Result<Vec<Poi>, SafeRouteError> {
        let query = format!(
            r#"[out:json];
(
  node["amenity"="bar"](around:{radius_m},{lat},{lon});
  node["amenity"="nightclub"](around:{radius_m},{lat},{lon});
  node["public_transport"](around:{radius_m},{lat},{lon});
);
out body;"#,
            lat = coord.latitude,
            lon = coord.longitude,
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("data", query.as_str())])
            .send()
            .map_err(|e| SafeRouteError::provider(format!("overpass request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SafeRouteError::provider(format!(
                "overpass request failed with HTTP {status}"
            )));
        }

        let body: overpass::Response = response.json().map_err(|e| {
            SafeRouteError::provider(format!("invalid overpass response body: {e}"))
        })?;

        let pois = body
            .elements
            .into_iter()
            .map(|element| {
                let label = element
                    .tags
                    .amenity
                    .as_deref()
                    .unwrap_or("public_transport");
                Poi::new(
                    Coordinate::new(element.lat, element.lon),
                    PoiCategory::from_label(label),
                    TrafficLevel::Low,
                )
            })
            .collect();

        Ok(pois)
    }
}

/// Places API client returning categorized POIs with a foot-traffic tag
pub struct PlacesProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
}

impl PlacesProvider {
    /// Build a client from configuration
    pub fn new(config: &SafeRouteConfig) -> Result<Self, SafeRouteError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("saferoute/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SafeRouteError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.provider.places_url.clone(),
            api_key: config.provider.places_api_key.clone(),
        })
    }
}

impl PoiProvider for PlacesProvider {
    fn name(&self) -> &str {
        "places"
    }

    #[instrument(skip(self))]
    fn nearby(&self, coord: Coordinate, radius_m: u32) -> Result<Vec<Poi>, SafeRouteError> {
        let url = format!("{}/places", self.base_url);
        let mut request = self.client.get(&url).query(&[
            ("latitude", coord.latitude.to_string()),
            ("longitude", coord.longitude.to_string()),
            ("radius", radius_m.to_string()),
            ("categories", "food,nightlife,entertainment".to_string()),
        ]);

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| SafeRouteError::provider(format!("places request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SafeRouteError::provider(format!(
                "places request failed with HTTP {status}"
            )));
        }

        let body: places::Response = response
            .json()
            .map_err(|e| SafeRouteError::provider(format!("invalid places response body: {e}")))?;

        let pois = body
            .places
            .into_iter()
            .map(|place| {
                let traffic = place
                    .foot_traffic
                    .as_deref()
                    .map_or(TrafficLevel::Low, TrafficLevel::from_label);
                Poi::new(
                    Coordinate::new(place.location.latitude, place.location.longitude),
                    PoiCategory::from_label(&place.category),
                    traffic,
                )
            })
            .collect();

        Ok(pois)
    }
}

/// Overpass API response structures
mod overpass {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct Response {
        #[serde(default)]
        pub elements: Vec<Element>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Element {
        pub lat: f64,
        pub lon: f64,
        #[serde(default)]
        pub tags: Tags,
    }

    #[derive(Debug, Deserialize, Default)]
    pub struct Tags {
        pub amenity: Option<String>,
    }
}

/// Places API response structures
mod places {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct Response {
        #[serde(default)]
        pub places: Vec<Place>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Place {
        pub location: PlaceLocation,
        pub category: String,
        pub foot_traffic: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct PlaceLocation {
        pub latitude: f64,
        pub longitude: f64,
    }
}
