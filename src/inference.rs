//! Inference-based segment risk classification
//!
//! Asks an external risk-inference service for a single-word label
//! given only a segment's coordinates. The call is retried on failure
//! and on any response outside the three accepted labels; once retries
//! are exhausted the segment gets the safe `medium` default, flagged
//! so it is distinguishable from a genuine classification.

use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::config::SafeRouteConfig;
use crate::error::SafeRouteError;
use crate::models::{RiskLevel, Segment};
use crate::retry::{RetryPolicy, Sleep, ThreadSleep};

/// Outcome of classifying one segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// The assigned risk level
    pub level: RiskLevel,
    /// True when the level is the default assigned after all attempts
    /// failed, not an answer from the inference provider
    pub fallback: bool,
}

/// Provider abstraction for the risk-inference call
pub trait RiskInference {
    /// Return the raw label for a segment coordinate; the classifier
    /// validates it against the accepted set
    fn assess(&self, segment: &Segment) -> Result<String, SafeRouteError>;
}

/// Classifies segments with bounded retry and a safe default
pub struct RiskClassifier {
    provider: Box<dyn RiskInference>,
    retry: RetryPolicy,
    sleep: Box<dyn Sleep>,
}

impl RiskClassifier {
    /// Create a classifier configured from `config`
    pub fn new(provider: Box<dyn RiskInference>, config: &SafeRouteConfig) -> Self {
        Self {
            provider,
            retry: RetryPolicy::new(config.provider.max_retries, config.retry_delay()),
            sleep: Box::new(ThreadSleep),
        }
    }

    /// Replace the sleep implementation (used by tests to avoid delays)
    #[must_use]
    pub fn with_sleep(mut self, sleep: Box<dyn Sleep>) -> Self {
        self.sleep = sleep;
        self
    }

    /// Classify a segment. Never fails: exhausted retries degrade to
    /// [`RiskLevel::Medium`] with the fallback flag set and a warning
    /// logged, so one bad segment cannot abort the route.
    pub fn classify(&self, segment: &Segment) -> Classification {
        let result = self.retry.run(
            self.sleep.as_ref(),
            "risk inference",
            |attempt| {
                debug!(
                    "Classifying segment {} at {} (attempt {attempt})",
                    segment.index,
                    segment.coordinate.format()
                );
                let label = self.provider.assess(segment)?;
                label.parse::<RiskLevel>().map_err(SafeRouteError::provider)
            },
            SafeRouteError::is_transient,
        );

        match result {
            Ok(level) => Classification {
                level,
                fallback: false,
            },
            Err(err) => {
                warn!(
                    "Risk inference for segment {} failed, defaulting to medium: {err}",
                    segment.index
                );
                Classification {
                    level: RiskLevel::Medium,
                    fallback: true,
                }
            }
        }
    }
}

/// HTTP risk-inference client posting a coordinate prompt
pub struct HttpRiskInference {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpRiskInference {
    /// Build a client from configuration
    pub fn new(config: &SafeRouteConfig) -> Result<Self, SafeRouteError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("saferoute/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SafeRouteError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.provider.inference_url.clone(),
            api_key: config.provider.inference_api_key.clone(),
        })
    }
}

impl RiskInference for HttpRiskInference {
    #[instrument(skip(self), fields(index = segment.index))]
    fn assess(&self, segment: &Segment) -> Result<String, SafeRouteError> {
        let prompt = format!(
            "Assess the safety risk level for a route segment at coordinates:\n\
             Latitude: {}, Longitude: {}\n\n\
             Respond with exactly one word (low, medium, or high):",
            segment.coordinate.latitude, segment.coordinate.longitude
        );

        let mut request = self.client.post(&self.base_url).json(&json!({
            "prompt": prompt,
        }));

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| SafeRouteError::provider(format!("inference request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SafeRouteError::provider(format!(
                "inference request failed with HTTP {status}"
            )));
        }

        let body: serde_json::Value = response.json().map_err(|e| {
            SafeRouteError::provider(format!("invalid inference response body: {e}"))
        })?;

        body.get("label")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| SafeRouteError::provider("inference response missing label"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    struct NoSleep;

    impl Sleep for NoSleep {
        fn sleep(&self, _: Duration) {}
    }

    struct ScriptedInference {
        responses: RefCell<Vec<Result<String, SafeRouteError>>>,
        calls: RefCell<u32>,
    }

    impl ScriptedInference {
        fn new(responses: Vec<Result<String, SafeRouteError>>) -> Self {
            Self {
                responses: RefCell::new(responses),
                calls: RefCell::new(0),
            }
        }
    }

    impl RiskInference for Rc<ScriptedInference> {
        fn assess(&self, _segment: &Segment) -> Result<String, SafeRouteError> {
            *self.calls.borrow_mut() += 1;
            self.responses.borrow_mut().remove(0)
        }
    }

    fn classifier(provider: Rc<ScriptedInference>) -> RiskClassifier {
        let mut config = SafeRouteConfig::default();
        config.provider.retry_delay_ms = 0;
        RiskClassifier::new(Box::new(provider), &config).with_sleep(Box::new(NoSleep))
    }

    fn segment() -> Segment {
        Segment::new(Coordinate::new(28.6315, 77.2195), 0)
    }

    #[test]
    fn test_accepts_valid_label() {
        let provider = Rc::new(ScriptedInference::new(vec![Ok("High".to_string())]));
        let classifier = classifier(Rc::clone(&provider));

        let classification = classifier.classify(&segment());

        assert_eq!(classification.level, RiskLevel::High);
        assert!(!classification.fallback);
        assert_eq!(*provider.calls.borrow(), 1);
    }

    #[test]
    fn test_retries_unlisted_label_then_accepts() {
        let provider = Rc::new(ScriptedInference::new(vec![
            Ok("very dangerous".to_string()),
            Ok("low".to_string()),
        ]));
        let classifier = classifier(Rc::clone(&provider));

        let classification = classifier.classify(&segment());

        assert_eq!(classification.level, RiskLevel::Low);
        assert!(!classification.fallback);
        assert_eq!(*provider.calls.borrow(), 2);
    }

    #[test]
    fn test_three_failures_default_to_flagged_medium() {
        let provider = Rc::new(ScriptedInference::new(vec![
            Err(SafeRouteError::provider("timeout")),
            Ok("unknown".to_string()),
            Err(SafeRouteError::provider("timeout")),
        ]));
        let classifier = classifier(Rc::clone(&provider));

        let classification = classifier.classify(&segment());

        // Exactly medium, flagged as a fallback, after exactly 3 attempts
        assert_eq!(classification.level, RiskLevel::Medium);
        assert!(classification.fallback);
        assert_eq!(*provider.calls.borrow(), 3);
    }
}
