//! Geocoding: free-text place descriptions to coordinates
//!
//! The [`Geocoder`] owns the retry and normalization logic; the actual
//! HTTP call lives behind the [`GeocodeProvider`] trait so tests can
//! substitute a stub. The concrete provider is Geoapify's geocode
//! search endpoint.

use tracing::{debug, info, instrument, warn};

use crate::config::SafeRouteConfig;
use crate::error::SafeRouteError;
use crate::models::{Coordinate, LocationQuery};
use crate::retry::{RetryPolicy, Sleep, ThreadSleep};

/// One candidate feature returned by a geocoding provider.
///
/// `lon_lat` keeps the provider's (longitude, latitude) ordering; the
/// [`Geocoder`] is responsible for normalizing it.
#[derive(Debug, Clone)]
pub struct GeocodeCandidate {
    /// Raw geometry in provider order: longitude first
    pub lon_lat: [f64; 2],
    /// Formatted address, when the provider supplies one
    pub formatted: Option<String>,
}

/// Provider abstraction for geocoding lookups
pub trait GeocodeProvider {
    /// Search for candidate features. `bias` is a list of country codes
    /// to favor; it is empty whenever the query carries an explicit
    /// country filter.
    fn search(
        &self,
        query: &LocationQuery,
        bias: &[String],
        fuzziness: f64,
    ) -> Result<Vec<GeocodeCandidate>, SafeRouteError>;
}

/// Resolves free-text locations to validated coordinates with bounded retry
pub struct Geocoder {
    provider: Box<dyn GeocodeProvider>,
    bias: Vec<String>,
    fuzziness: f64,
    retry: RetryPolicy,
    sleep: Box<dyn Sleep>,
}

impl Geocoder {
    /// Create a geocoder configured from `config`
    pub fn new(provider: Box<dyn GeocodeProvider>, config: &SafeRouteConfig) -> Self {
        Self {
            provider,
            bias: config.defaults.region_bias.clone(),
            fuzziness: config.defaults.fuzziness,
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

    /// Resolve a location query to a coordinate.
    ///
    /// Retries on empty result sets, timeouts, and transient provider
    /// errors; malformed-request errors are returned immediately. After
    /// exhausting retries the result is [`SafeRouteError::NotFound`] so
    /// the caller decides the next step.
    pub fn resolve(&self, query: &LocationQuery) -> Result<Coordinate, SafeRouteError> {
        info!("Geocoding location: '{}'", query.text);

        // An explicit country filter replaces the region bias
        let bias: &[String] = if query.country.is_some() {
            &[]
        } else {
            &self.bias
        };

        let result = self.retry.run(
            self.sleep.as_ref(),
            "geocode",
            |attempt| {
                debug!(
                    "Geocode attempt {attempt} for '{}' (bias: {:?})",
                    query.text, bias
                );
                let candidates = self.provider.search(query, bias, self.fuzziness)?;
                let candidate = candidates.into_iter().next().ok_or_else(|| {
                    SafeRouteError::provider(format!("empty result set for '{}'", query.text))
                })?;

                let coordinate =
                    Coordinate::from_lon_lat(candidate.lon_lat[0], candidate.lon_lat[1]);
                if !coordinate.is_valid() {
                    return Err(SafeRouteError::provider(format!(
                        "coordinate out of range: {}",
                        coordinate.format()
                    )));
                }

                if let Some(formatted) = &candidate.formatted {
                    debug!("Matched '{}' to '{}'", query.text, formatted);
                }
                Ok(coordinate)
            },
            SafeRouteError::is_transient,
        );

        match result {
            Ok(coordinate) => {
                info!("Resolved '{}' to {}", query.text, coordinate.format());
                Ok(coordinate)
            }
            // Exhausted retries on transient failures reads as not-found
            Err(err) if err.is_transient() => {
                warn!("Geocoding '{}' exhausted retries: {err}", query.text);
                Err(SafeRouteError::not_found(query.text.clone()))
            }
            Err(err) => Err(err),
        }
    }
}

/// Geoapify geocode search client
pub struct GeoapifyGeocoder {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl GeoapifyGeocoder {
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
            base_url: config.provider.geocode_url.clone(),
            api_key,
        })
    }
}

impl GeocodeProvider for GeoapifyGeocoder {
    #[instrument(skip(self, fuzziness), fields(location = %query.text))]
    fn search(
        &self,
        query: &LocationQuery,
        bias: &[String],
        fuzziness: f64,
    ) -> Result<Vec<GeocodeCandidate>, SafeRouteError> {
        let mut params = vec![
            ("text".to_string(), query.text.clone()),
            ("format".to_string(), "json".to_string()),
            ("limit".to_string(), "5".to_string()),
            ("fuzzy".to_string(), fuzziness.to_string()),
            ("apiKey".to_string(), self.api_key.clone()),
        ];

        if let Some(country) = &query.country {
            params.push(("filter".to_string(), format!("country:{country}")));
        } else if !bias.is_empty() {
            let bias_value = bias
                .iter()
                .map(|code| format!("countrycode:{code}"))
                .collect::<Vec<_>>()
                .join(",");
            params.push(("bias".to_string(), bias_value));
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    SafeRouteError::provider(format!("geocode request timed out: {e}"))
                } else {
                    SafeRouteError::provider(format!("geocode request failed: {e}"))
                }
            })?;

        let status = response.status();
        if status.is_client_error() {
            // Malformed request or bad credentials; retrying won't help
            return Err(SafeRouteError::provider_fatal(format!(
                "geocode request rejected with HTTP {status}"
            )));
        }
        if !status.is_success() {
            return Err(SafeRouteError::provider(format!(
                "geocode request failed with HTTP {status}"
            )));
        }

        let body: geoapify::GeocodeResponse = response.json().map_err(|e| {
            SafeRouteError::provider(format!("invalid geocode response body: {e}"))
        })?;

        let candidates = body
            .features
            .into_iter()
            .filter(|feature| feature.geometry.coordinates.len() >= 2)
            .map(|feature| GeocodeCandidate {
                lon_lat: [
                    feature.geometry.coordinates[0],
                    feature.geometry.coordinates[1],
                ],
                formatted: feature.properties.and_then(|p| p.formatted),
            })
            .collect();

        Ok(candidates)
    }
}

/// Geoapify geocoding response structures
mod geoapify {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct GeocodeResponse {
        #[serde(default)]
        pub features: Vec<Feature>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Feature {
        pub geometry: Geometry,
        pub properties: Option<Properties>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Geometry {
        #[serde(default)]
        pub coordinates: Vec<f64>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Properties {
        pub formatted: Option<String>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    struct NoSleep;

    impl Sleep for NoSleep {
        fn sleep(&self, _: Duration) {}
    }

    /// Scripted provider that records how it was called
    struct StubProvider {
        responses: RefCell<Vec<Result<Vec<GeocodeCandidate>, SafeRouteError>>>,
        seen_bias: RefCell<Vec<Vec<String>>>,
    }

    impl StubProvider {
        fn new(responses: Vec<Result<Vec<GeocodeCandidate>, SafeRouteError>>) -> Self {
            Self {
                responses: RefCell::new(responses),
                seen_bias: RefCell::new(Vec::new()),
            }
        }
    }

    impl GeocodeProvider for StubProvider {
        fn search(
            &self,
            _query: &LocationQuery,
            bias: &[String],
            _fuzziness: f64,
        ) -> Result<Vec<GeocodeCandidate>, SafeRouteError> {
            self.seen_bias.borrow_mut().push(bias.to_vec());
            self.responses.borrow_mut().remove(0)
        }
    }

    // The geocoder takes ownership of its provider, so tests that need
    // to inspect recorded calls hold a second Rc handle.
    impl GeocodeProvider for Rc<StubProvider> {
        fn search(
            &self,
            query: &LocationQuery,
            bias: &[String],
            fuzziness: f64,
        ) -> Result<Vec<GeocodeCandidate>, SafeRouteError> {
            self.as_ref().search(query, bias, fuzziness)
        }
    }

    fn geocoder(provider: Rc<StubProvider>) -> Geocoder {
        let mut config = SafeRouteConfig::default();
        config.provider.retry_delay_ms = 0;
        Geocoder::new(Box::new(provider), &config).with_sleep(Box::new(NoSleep))
    }

    fn connaught_place() -> Vec<GeocodeCandidate> {
        // Geoapify order: longitude first
        vec![GeocodeCandidate {
            lon_lat: [77.2195, 28.6315],
            formatted: Some("Connaught Place, New Delhi, Delhi, India".to_string()),
        }]
    }

    #[test]
    fn test_resolves_with_south_asian_bias() {
        let provider = Rc::new(StubProvider::new(vec![Ok(connaught_place())]));
        let geocoder = geocoder(Rc::clone(&provider));

        let coord = geocoder
            .resolve(&LocationQuery::new("Connaught Place, Delhi"))
            .unwrap();

        assert!((coord.latitude - 28.63).abs() < 0.01);
        assert!((coord.longitude - 77.22).abs() < 0.01);
        assert!(coord.is_valid());

        // Without a country filter the configured bias is forwarded
        let seen = provider.seen_bias.borrow();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains(&"in".to_string()));
        assert!(seen[0].contains(&"bd".to_string()));
    }

    #[test]
    fn test_country_filter_suppresses_bias() {
        let provider = Rc::new(StubProvider::new(vec![Ok(connaught_place())]));
        let geocoder = geocoder(Rc::clone(&provider));
        let query = LocationQuery::new("Connaught Place").with_country("in");

        geocoder.resolve(&query).unwrap();

        // Filter and bias are mutually exclusive per call
        assert_eq!(*provider.seen_bias.borrow(), vec![Vec::<String>::new()]);
    }

    #[test]
    fn test_retries_empty_result_then_succeeds() {
        let provider = Rc::new(StubProvider::new(vec![Ok(vec![]), Ok(connaught_place())]));
        let geocoder = geocoder(provider);

        let coord = geocoder
            .resolve(&LocationQuery::new("Connaught Place, Delhi"))
            .unwrap();
        assert!(coord.is_valid());
    }

    #[test]
    fn test_exhausted_retries_become_not_found() {
        let provider = Rc::new(StubProvider::new(vec![
            Err(SafeRouteError::provider("timeout")),
            Ok(vec![]),
            Err(SafeRouteError::provider("timeout")),
        ]));
        let geocoder = geocoder(provider);

        let err = geocoder
            .resolve(&LocationQuery::new("Nowhere Special"))
            .unwrap_err();
        assert!(matches!(err, SafeRouteError::NotFound { .. }));
    }

    #[test]
    fn test_malformed_request_is_not_retried() {
        let provider = Rc::new(StubProvider::new(vec![Err(SafeRouteError::provider_fatal(
            "HTTP 400 Bad Request",
        ))]));
        let geocoder = geocoder(Rc::clone(&provider));

        let err = geocoder
            .resolve(&LocationQuery::new("Connaught Place"))
            .unwrap_err();
        assert!(matches!(
            err,
            SafeRouteError::Provider {
                transient: false,
                ..
            }
        ));
        // Only one call was made
        assert_eq!(provider.seen_bias.borrow().len(), 1);
    }

    #[test]
    fn test_out_of_range_coordinate_is_rejected() {
        let bad = || {
            Ok(vec![GeocodeCandidate {
                lon_lat: [200.0, 95.0],
                formatted: None,
            }])
        };
        let provider = Rc::new(StubProvider::new(vec![bad(), bad(), bad()]));
        let geocoder = geocoder(provider);

        let err = geocoder
            .resolve(&LocationQuery::new("Broken Feature"))
            .unwrap_err();
        assert!(matches!(err, SafeRouteError::NotFound { .. }));
    }
}
