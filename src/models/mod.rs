//! Data models for the safe-route pipeline

pub mod location;
pub mod poi;
pub mod route;

pub use location::{Coordinate, LocationQuery};
pub use poi::{Poi, PoiCategory, TrafficLevel};
pub use route::{RiskLevel, RouteScoreResult, ScoredSegment, Segment};
