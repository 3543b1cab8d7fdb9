//! Safe-route planning pipeline
//!
//! Wires the geocoder, route fetcher, POI enricher, risk scorer, and
//! map renderer into a single entry point. Segments are enriched and
//! scored one at a time; provider failures at the scoring stage
//! degrade to conservative defaults and never abort rendering.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::SafeRouteConfig;
use crate::error::SafeRouteError;
use crate::geocode::Geocoder;
use crate::inference::RiskClassifier;
use crate::models::{LocationQuery, RouteScoreResult, ScoredSegment, Segment};
use crate::poi::PoiEnricher;
use crate::render::MapRenderer;
use crate::routing::{RouteFetcher, route_length_km};
use crate::score::{self, LabelWeights, heuristic_score, risk_from_score};

/// How segment risk is determined
pub enum ScoringStrategy {
    /// Count POIs, high-traffic POIs, and high-risk POIs around each segment
    Heuristic(PoiEnricher),
    /// Ask the risk-inference provider for a label per segment,
    /// converted to a score via [`LabelWeights`]
    Inference(RiskClassifier, LabelWeights),
}

impl ScoringStrategy {
    /// Build the configured strategy from config
    #[must_use]
    pub fn from_config(config: &SafeRouteConfig, enricher: PoiEnricher, classifier: RiskClassifier) -> Self {
        if config.scoring.strategy == "inference" {
            let weights = LabelWeights {
                low: config.scoring.weight_low,
                medium: config.scoring.weight_medium,
                high: config.scoring.weight_high,
            };
            ScoringStrategy::Inference(classifier, weights)
        } else {
            ScoringStrategy::Heuristic(enricher)
        }
    }

    /// Score one segment; never fails
    fn score_segment(&self, segment: Segment) -> ScoredSegment {
        match self {
            ScoringStrategy::Heuristic(enricher) => {
                let pois = enricher.nearby(segment.coordinate);
                let score = heuristic_score(&pois);
                ScoredSegment::new(segment, score, risk_from_score(score))
            }
            ScoringStrategy::Inference(classifier, weights) => {
                let classification = classifier.classify(&segment);
                let scored = ScoredSegment::new(
                    segment,
                    weights.weight(classification.level),
                    classification.level,
                );
                if classification.fallback {
                    scored.as_fallback()
                } else {
                    scored
                }
            }
        }
    }
}

/// Result of a successful planning run
#[derive(Debug)]
pub struct PlanOutcome {
    /// Path of the rendered map artifact
    pub artifact_path: PathBuf,
    /// Scored segments and the aggregate route score
    pub result: RouteScoreResult,
    /// Total route length in kilometers
    pub length_km: f64,
}

/// End-to-end safe-route planner
pub struct SafeRoutePlanner {
    geocoder: Geocoder,
    fetcher: RouteFetcher,
    strategy: ScoringStrategy,
    renderer: MapRenderer,
}

impl SafeRoutePlanner {
    /// Assemble a planner from its components
    #[must_use]
    pub fn new(
        geocoder: Geocoder,
        fetcher: RouteFetcher,
        strategy: ScoringStrategy,
        renderer: MapRenderer,
    ) -> Self {
        Self {
            geocoder,
            fetcher,
            strategy,
            renderer,
        }
    }

    /// Plan the route between two free-text locations, score it, and
    /// render the safety map.
    ///
    /// The error names the stage that failed: geocoding yields
    /// [`SafeRouteError::NotFound`], routing [`SafeRouteError::NoRoute`],
    /// rendering [`SafeRouteError::Render`]. Scoring never fails.
    pub fn plan_safe_route(
        &self,
        start_text: &str,
        end_text: &str,
    ) -> Result<PlanOutcome, SafeRouteError> {
        let start_query = LocationQuery::new(start_text);
        let end_query = LocationQuery::new(end_text);

        let start = self.geocoder.resolve(&start_query)?;
        let end = self.geocoder.resolve(&end_query)?;

        let segments = self.fetcher.fetch_route(start, end)?;
        let length_km = route_length_km(&segments);
        info!(
            "Scoring {} segments over {:.1} km from '{}' to '{}'",
            segments.len(),
            length_km,
            start_query.text,
            end_query.text
        );

        let total = segments.len();
        let mut scored = Vec::with_capacity(total);
        for segment in segments {
            debug!("Assessing segment {}/{total}", segment.index + 1);
            scored.push(self.strategy.score_segment(segment));
        }

        let result = score::score_route(scored);
        info!(
            "Route scored: overall {} across {} segments",
            result.overall_score,
            result.segments.len()
        );

        let artifact_path =
            self.renderer
                .render(&result.segments, &start_query.text, &end_query.text)?;

        Ok(PlanOutcome {
            artifact_path,
            result,
            length_km,
        })
    }

    /// Compare already-scored candidate routes and return the safest
    #[must_use]
    pub fn pick_safest(candidates: Vec<RouteScoreResult>) -> Option<RouteScoreResult> {
        score::pick_safest(candidates)
    }
}
