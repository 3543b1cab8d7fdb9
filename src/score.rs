//! Segment scoring and route aggregation
//!
//! Everything in this module is a pure function of its inputs; all
//! I/O (POI lookups, inference calls) happens upstream. The heuristic
//! and the inference labels are two alternative strategies and are
//! never mixed within a single route.

use crate::models::{Poi, RiskLevel, RouteScoreResult, ScoredSegment, TrafficLevel};

/// Heuristic risk score for one segment:
/// `poi_count + high_traffic_count + high_risk_count`.
///
/// Monotonic: adding a POI can only raise the score.
#[must_use]
pub fn heuristic_score(pois: &[Poi]) -> u32 {
    let poi_count = pois.len();
    let high_traffic = pois
        .iter()
        .filter(|poi| poi.traffic == TrafficLevel::High)
        .count();
    let high_risk = pois
        .iter()
        .filter(|poi| poi.risk == RiskLevel::High)
        .count();

    u32::try_from(poi_count + high_traffic + high_risk).unwrap_or(u32::MAX)
}

/// Risk level a heuristic score maps to for visualization:
/// below 2 is low, below 5 medium, anything else high.
#[must_use]
pub fn risk_from_score(score: u32) -> RiskLevel {
    match score {
        0..=1 => RiskLevel::Low,
        2..=4 => RiskLevel::Medium,
        _ => RiskLevel::High,
    }
}

/// Numeric weights for converting classification labels into scores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelWeights {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
}

impl Default for LabelWeights {
    fn default() -> Self {
        Self {
            low: 0,
            medium: 1,
            high: 2,
        }
    }
}

impl LabelWeights {
    /// Weight for a given risk level
    #[must_use]
    pub fn weight(&self, level: RiskLevel) -> u32 {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
        }
    }
}

/// Aggregate scored segments into a route result; the overall score is
/// the sum of the segment scores.
#[must_use]
pub fn score_route(segments: Vec<ScoredSegment>) -> RouteScoreResult {
    let overall_score = segments.iter().map(|s| s.score).sum();
    RouteScoreResult {
        segments,
        overall_score,
    }
}

/// Pick the candidate with the minimum overall score.
///
/// Each candidate is evaluated independently; ties go to the
/// first-encountered candidate and the winner is returned unchanged.
#[must_use]
pub fn pick_safest(candidates: Vec<RouteScoreResult>) -> Option<RouteScoreResult> {
    candidates
        .into_iter()
        .reduce(|best, candidate| {
            if candidate.overall_score < best.overall_score {
                candidate
            } else {
                best
            }
        })
}

/// Score each candidate route and pick the safest
#[must_use]
pub fn safest(routes: Vec<Vec<ScoredSegment>>) -> Option<RouteScoreResult> {
    pick_safest(routes.into_iter().map(score_route).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, Poi, PoiCategory, Segment};
    use rstest::rstest;

    fn poi(category: PoiCategory, traffic: TrafficLevel) -> Poi {
        Poi::new(Coordinate::new(40.7128, -74.006), category, traffic)
    }

    fn scored(index: usize, score: u32) -> ScoredSegment {
        ScoredSegment::new(
            Segment::new(Coordinate::new(28.63 + index as f64 * 0.001, 77.22), index),
            score,
            risk_from_score(score),
        )
    }

    #[test]
    fn test_heuristic_score_counts_all_three_terms() {
        let pois = vec![
            poi(PoiCategory::Bar, TrafficLevel::Low), // count + high risk
            poi(PoiCategory::Food, TrafficLevel::High), // count + high traffic
            poi(PoiCategory::PublicTransport, TrafficLevel::Low), // count only
        ];
        // 3 POIs + 1 high traffic + 1 high risk
        assert_eq!(heuristic_score(&pois), 5);
    }

    #[test]
    fn test_heuristic_score_empty_is_zero() {
        assert_eq!(heuristic_score(&[]), 0);
    }

    #[test]
    fn test_adding_high_risk_poi_never_decreases_score() {
        let mut pois = vec![poi(PoiCategory::Food, TrafficLevel::Low)];
        let before = heuristic_score(&pois);
        pois.push(poi(PoiCategory::Nightclub, TrafficLevel::High));
        let after = heuristic_score(&pois);
        assert!(after > before);
    }

    #[rstest]
    #[case(0, RiskLevel::Low)]
    #[case(1, RiskLevel::Low)]
    #[case(2, RiskLevel::Medium)]
    #[case(4, RiskLevel::Medium)]
    #[case(5, RiskLevel::High)]
    #[case(12, RiskLevel::High)]
    fn test_risk_from_score_thresholds(#[case] score: u32, #[case] expected: RiskLevel) {
        assert_eq!(risk_from_score(score), expected);
    }

    #[test]
    fn test_default_label_weights() {
        let weights = LabelWeights::default();
        assert_eq!(weights.weight(RiskLevel::Low), 0);
        assert_eq!(weights.weight(RiskLevel::Medium), 1);
        assert_eq!(weights.weight(RiskLevel::High), 2);
    }

    #[test]
    fn test_score_route_sums_segments() {
        let result = score_route(vec![scored(0, 2), scored(1, 1), scored(2, 4)]);
        assert_eq!(result.overall_score, 7);
        assert_eq!(result.segments.len(), 3);
    }

    #[test]
    fn test_safest_returns_minimum_unchanged() {
        let risky = score_route(vec![scored(0, 3), scored(1, 4)]);
        let safe = score_route(vec![scored(0, 1), scored(1, 2)]);
        assert_eq!(risky.overall_score, 7);
        assert_eq!(safe.overall_score, 3);

        let expected = safe.clone();
        let winner = pick_safest(vec![risky, safe]).unwrap();
        assert_eq!(winner, expected);
    }

    #[test]
    fn test_safest_is_idempotent_and_stable() {
        let first = score_route(vec![scored(0, 2)]);
        let second = score_route(vec![scored(5, 2)]);

        // Tie: first-encountered candidate wins
        let winner = pick_safest(vec![first.clone(), second.clone()]).unwrap();
        assert_eq!(winner, first);

        // Re-running on the same inputs gives the same result
        let again = pick_safest(vec![first.clone(), second]).unwrap();
        assert_eq!(again, winner);
    }

    #[test]
    fn test_safest_single_candidate_equals_score() {
        let segments = vec![scored(0, 1), scored(1, 0)];
        let direct = score_route(segments.clone());
        let via_safest = safest(vec![segments]).unwrap();
        assert_eq!(via_safest, direct);
    }

    #[test]
    fn test_safest_empty_is_none() {
        assert!(pick_safest(vec![]).is_none());
        assert!(safest(vec![]).is_none());
    }
}
