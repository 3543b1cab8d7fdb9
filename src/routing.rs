//! Route fetching: a start/end coordinate pair to an ordered segment list
//!
//! Single request per call; a timeout is reported as a failure rather
//! than retried. Malformed coordinate entries in the provider geometry
//! are dropped instead of failing the whole route, and provider order
//! is preserved as-is.

use haversine::{Units, distance};
use tracing::{debug, info, instrument, warn};

use crate::config::SafeRouteConfig;
use crate::error::SafeRouteError;
use crate::models::{Coordinate, Segment};

/// Raw route geometry as returned by a routing provider: an ordered
/// list of coordinate entries in (longitude, latitude) order, possibly
/// containing malformed entries with fewer than 2 components.
#[derive(Debug, Clone)]
pub struct RouteGeometry {
    pub coordinates: Vec<Vec<f64>>,
}

/// Provider abstraction for route lookups
pub trait RouteProvider {
    /// Fetch a path between two coordinates for the given travel mode
    fn route(
        &self,
        start: Coordinate,
        end: Coordinate,
        mode: &str,
    ) -> Result<RouteGeometry, SafeRouteError>;
}

/// Retrieves routes and extracts well-formed waypoint segments
pub struct RouteFetcher {
    provider: Box<dyn RouteProvider>,
    travel_mode: String,
}

impl RouteFetcher {
    /// Create a fetcher configured from `config`
    pub fn new(provider: Box<dyn RouteProvider>, config: &SafeRouteConfig) -> Self {
        Self {
            provider,
            travel_mode: config.defaults.travel_mode.clone(),
        }
    }

    /// Fetch the route between `start` and `end` as an ordered segment
    /// list. Returns [`SafeRouteError::NoRoute`] when the provider has
    /// no candidate paths or nothing well-formed survives filtering.
    pub fn fetch_route(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<Vec<Segment>, SafeRouteError> {
        info!(
            "Fetching {} route from {} to {}",
            self.travel_mode,
            start.format(),
            end.format()
        );

        let geometry = self.provider.route(start, end, &self.travel_mode)?;
        let total_entries = geometry.coordinates.len();

        let segments: Vec<Segment> = geometry
            .coordinates
            .into_iter()
            .filter(|entry| {
                if entry.len() < 2 {
                    warn!("Dropping malformed coordinate entry: {entry:?}");
                    false
                } else {
                    true
                }
            })
            .enumerate()
            .map(|(index, entry)| Segment::new(Coordinate::from_lon_lat(entry[0], entry[1]), index))
            .collect();

        if segments.is_empty() {
            return Err(SafeRouteError::no_route(format!(
                "no usable waypoints between {} and {} ({total_entries} raw entries)",
                start.format(),
                end.format()
            )));
        }

        debug!(
            "Extracted {} segments ({} raw entries), route length {:.1} km",
            segments.len(),
            total_entries,
            route_length_km(&segments)
        );

        Ok(segments)
    }
}

/// Total great-circle length of a segment sequence in kilometers
#[must_use]
pub fn route_length_km(segments: &[Segment]) -> f64 {
    segments
        .windows(2)
        .map(|pair| {
            distance(
                haversine::Location {
                    latitude: pair[0].coordinate.latitude,
                    longitude: pair[0].coordinate.longitude,
                },
                haversine::Location {
                    latitude: pair[1].coordinate.latitude,
                    longitude: pair[1].coordinate.longitude,
                },
                Units::Kilometers,
            )
        })
        .sum()
}

/// Geoapify routing client
pub struct GeoapifyRouting {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl GeoapifyRouting {
    /// Build a client from configuration. Fails when the API key is missing.
    pub fn new(config: &SafeRouteConfig) -> Result<Self, SafeRouteError> {
        let api_key = config
            .provider
            .geoapify_api_key
            .clone()
            .ok_or_else(|| SafeRouteError::config("Missing Geoapify API key"))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("saferoute/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SafeRouteError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.provider.routing_url.clone(),
            api_key,
        })
    }
}

impl RouteProvider for GeoapifyRouting {
    #[instrument(skip(self), fields(mode))]
    fn route(
        &self,
        start: Coordinate,
        end: Coordinate,
        mode: &str,
    ) -> Result<RouteGeometry, SafeRouteError> {
        // Geoapify waypoints are lat,lon pairs separated by '|'
        let waypoints = format!(
            "{},{}|{},{}",
            start.latitude, start.longitude, end.latitude, end.longitude
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("waypoints", waypoints.as_str()),
                ("mode", mode),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    SafeRouteError::no_route(format!("routing request timed out: {e}"))
                } else {
                    SafeRouteError::provider(format!("routing request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SafeRouteError::provider(format!(
                "routing request failed with HTTP {status}"
            )));
        }

        let body: geoapify::RoutingResponse = response.json().map_err(|e| {
            SafeRouteError::provider(format!("invalid routing response body: {e}"))
        })?;

        let feature = body.features.into_iter().next().ok_or_else(|| {
            SafeRouteError::no_route("provider reported zero candidate paths".to_string())
        })?;

        // MultiLineString geometries carry one coordinate list per leg;
        // flatten them while preserving order.
        let coordinates = feature.geometry.coordinates.into_iter().flatten().collect();

        Ok(RouteGeometry { coordinates })
    }
}

/// Geoapify routing response structures
mod geoapify {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct RoutingResponse {
        #[serde(default)]
        pub features: Vec<Feature>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Feature {
        pub geometry: Geometry,
    }

    #[derive(Debug, Deserialize)]
    pub struct Geometry {
        #[serde(default)]
        pub coordinates: Vec<Vec<Vec<f64>>>,
    }
}
