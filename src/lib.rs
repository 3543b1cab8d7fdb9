//! `SafeRoute` - route risk assessment and safest-route planning
//!
//! This library provides the core functionality for resolving
//! locations, fetching routes, scoring route segments for
//! personal-safety risk, and rendering color-coded safety maps.

pub mod config;
pub mod error;
pub mod geocode;
pub mod inference;
pub mod models;
pub mod pipeline;
pub mod poi;
pub mod render;
pub mod retry;
pub mod routing;
pub mod score;

// Re-export core types for public API
pub use config::SafeRouteConfig;
pub use error::{RenderFailure, SafeRouteError};
pub use geocode::{GeoapifyGeocoder, GeocodeProvider, Geocoder};
pub use inference::{Classification, HttpRiskInference, RiskClassifier, RiskInference};
pub use models::{
    Coordinate, LocationQuery, Poi, PoiCategory, RiskLevel, RouteScoreResult, ScoredSegment,
    Segment, TrafficLevel,
};
pub use pipeline::{PlanOutcome, SafeRoutePlanner, ScoringStrategy};
pub use poi::{OverpassProvider, PlacesProvider, PoiEnricher, PoiProvider};
pub use render::MapRenderer;
pub use retry::{RetryPolicy, Sleep, ThreadSleep};
pub use routing::{GeoapifyRouting, RouteFetcher, RouteProvider};
pub use score::{LabelWeights, heuristic_score, pick_safest, risk_from_score, score_route, safest};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SafeRouteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
