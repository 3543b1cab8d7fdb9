//! Points of interest used as risk and traffic signals

use serde::{Deserialize, Serialize};

use crate::models::{Coordinate, RiskLevel};

/// Closed set of POI categories the scorer understands.
///
/// Provider vocabularies (amenity tags, place categories) are mapped
/// into this set at fetch time; adding a category means one new variant
/// and one row in [`PoiCategory::risk`], not scattered string checks.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PoiCategory {
    Bar,
    Nightclub,
    PublicTransport,
    Food,
    Nightlife,
    Entertainment,
    Other,
}

impl PoiCategory {
    /// Map a provider-specific label into the closed category set
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "bar" | "pub" => PoiCategory::Bar,
            "nightclub" => PoiCategory::Nightclub,
            "public_transport" => PoiCategory::PublicTransport,
            "food" | "restaurant" | "cafe" => PoiCategory::Food,
            "nightlife" => PoiCategory::Nightlife,
            "entertainment" => PoiCategory::Entertainment,
            _ => PoiCategory::Other,
        }
    }

    /// Static category-to-risk table: nightlife venues are high risk,
    /// any unlisted category defaults to medium.
    #[must_use]
    pub fn risk(&self) -> RiskLevel {
        match self {
            PoiCategory::Bar | PoiCategory::Nightclub | PoiCategory::Nightlife => RiskLevel::High,
            PoiCategory::PublicTransport
            | PoiCategory::Food
            | PoiCategory::Entertainment
            | PoiCategory::Other => RiskLevel::Medium,
        }
    }
}

/// Coarse foot-traffic indicator attached by places providers
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrafficLevel {
    Low,
    Medium,
    High,
}

impl TrafficLevel {
    /// Parse a provider traffic tag; unknown values read as low
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "high" => TrafficLevel::High,
            "medium" => TrafficLevel::Medium,
            _ => TrafficLevel::Low,
        }
    }
}

/// A nearby place used as a scoring input for one segment.
///
/// Ephemeral: consumed during scoring of the segment it was fetched
/// for and never persisted.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Poi {
    /// Place coordinate
    pub coordinate: Coordinate,
    /// Mapped category
    pub category: PoiCategory,
    /// Risk derived from the category table at fetch time
    pub risk: RiskLevel,
    /// Foot-traffic indicator, low when the provider has none
    pub traffic: TrafficLevel,
}

impl Poi {
    /// Create a POI, deriving risk from the category table
    #[must_use]
    pub fn new(coordinate: Coordinate, category: PoiCategory, traffic: TrafficLevel) -> Self {
        Self {
            coordinate,
            category,
            risk: category.risk(),
            traffic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("bar", PoiCategory::Bar, RiskLevel::High)]
    #[case("nightclub", PoiCategory::Nightclub, RiskLevel::High)]
    #[case("public_transport", PoiCategory::PublicTransport, RiskLevel::Medium)]
    #[case("food", PoiCategory::Food, RiskLevel::Medium)]
    #[case("bowling_alley", PoiCategory::Other, RiskLevel::Medium)]
    fn test_category_mapping(
        #[case] label: &str,
        #[case] category: PoiCategory,
        #[case] risk: RiskLevel,
    ) {
        let mapped = PoiCategory::from_label(label);
        assert_eq!(mapped, category);
        assert_eq!(mapped.risk(), risk);
    }

    #[test]
    fn test_poi_risk_assigned_at_construction() {
        let poi = Poi::new(
            Coordinate::new(40.7128, -74.006),
            PoiCategory::Bar,
            TrafficLevel::Low,
        );
        assert_eq!(poi.risk, RiskLevel::High);
    }

    #[rstest]
    #[case("high", TrafficLevel::High)]
    #[case("Medium", TrafficLevel::Medium)]
    #[case("none", TrafficLevel::Low)]
    fn test_traffic_parse(#[case] label: &str, #[case] expected: TrafficLevel) {
        assert_eq!(TrafficLevel::from_label(label), expected);
    }
}
