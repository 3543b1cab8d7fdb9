//! Route segments, risk levels, and scored route results

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::Coordinate;

/// Three-level risk classification for a route segment
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Hex color used by the map renderer for this level
    #[must_use]
    pub fn color(&self) -> &'static str {
        match self {
            RiskLevel::Low => "#00ff00",
            RiskLevel::Medium => "#ffff00",
            RiskLevel::High => "#ff0000",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        write!(f, "{label}")
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    /// Parse a provider label; anything outside the three accepted
    /// labels is an error so the classifier can retry on it.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(format!("unrecognized risk label: '{other}'")),
        }
    }
}

/// One coordinate waypoint along a route, the unit of risk assessment.
///
/// Immutable; scoring produces a separate [`ScoredSegment`] rather than
/// mutating in place.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Waypoint coordinate
    pub coordinate: Coordinate,
    /// Ordered position within the route, 0 = start
    pub index: usize,
}

impl Segment {
    /// Create a new segment
    #[must_use]
    pub fn new(coordinate: Coordinate, index: usize) -> Self {
        Self { coordinate, index }
    }
}

/// A segment after scoring: the immutable waypoint plus its risk verdict
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ScoredSegment {
    /// The underlying waypoint
    pub segment: Segment,
    /// Numeric risk score, higher is riskier
    pub score: u32,
    /// Classified or derived risk level
    pub risk_level: RiskLevel,
    /// True when the level is the safe default assigned after the
    /// inference call exhausted its retries, not a genuine classification
    pub fallback: bool,
}

impl ScoredSegment {
    /// Create a genuinely classified scored segment
    #[must_use]
    pub fn new(segment: Segment, score: u32, risk_level: RiskLevel) -> Self {
        Self {
            segment,
            score,
            risk_level,
            fallback: false,
        }
    }

    /// Mark this verdict as a default assigned after failed inference
    #[must_use]
    pub fn as_fallback(mut self) -> Self {
        self.fallback = true;
        self
    }
}

/// Scored segments of one candidate route plus the aggregate score.
///
/// Candidates are compared by `overall_score` ascending; lower is safer.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RouteScoreResult {
    /// Per-segment scores in route order
    pub segments: Vec<ScoredSegment>,
    /// Sum of the segment scores
    pub overall_score: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("low", RiskLevel::Low)]
    #[case(" Medium ", RiskLevel::Medium)]
    #[case("HIGH", RiskLevel::High)]
    fn test_risk_level_parse(#[case] input: &str, #[case] expected: RiskLevel) {
        assert_eq!(input.parse::<RiskLevel>().unwrap(), expected);
    }

    #[rstest]
    #[case("unknown")]
    #[case("")]
    #[case("low risk")]
    fn test_risk_level_rejects_unlisted_labels(#[case] input: &str) {
        assert!(input.parse::<RiskLevel>().is_err());
    }

    #[test]
    fn test_risk_colors_match_palette() {
        assert_eq!(RiskLevel::Low.color(), "#00ff00");
        assert_eq!(RiskLevel::Medium.color(), "#ffff00");
        assert_eq!(RiskLevel::High.color(), "#ff0000");
    }

    #[test]
    fn test_scored_segment_fallback_flag() {
        let segment = Segment::new(Coordinate::new(28.63, 77.22), 0);
        let scored = ScoredSegment::new(segment, 1, RiskLevel::Medium);
        assert!(!scored.fallback);
        assert!(scored.as_fallback().fallback);
    }
}
