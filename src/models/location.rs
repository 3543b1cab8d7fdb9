//! Geographic coordinates and geocoding queries

use serde::{Deserialize, Serialize};

/// A (latitude, longitude) pair in signed decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees, [-90, 90]
    pub latitude: f64,
    /// Longitude in decimal degrees, [-180, 180]
    pub longitude: f64,
}

impl Coordinate {
    /// Create a new coordinate
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build a coordinate from provider (longitude, latitude) ordering.
    ///
    /// Geoapify and GeoJSON geometries put longitude first; this is the
    /// single place where that ordering gets swapped.
    #[must_use]
    pub fn from_lon_lat(longitude: f64, latitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and within valid degree ranges
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Format as a "lat, lon" string
    #[must_use]
    pub fn format(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// A free-text geocoding query with an optional country-code filter.
///
/// When `country` is set the Geocoder applies it as a hard filter and
/// skips the configured region bias; the two are mutually exclusive
/// per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery {
    /// Free-text place description, trimmed
    pub text: String,
    /// Optional ISO 3166-1 alpha-2 country code filter
    pub country: Option<String>,
}

impl LocationQuery {
    /// Create a query from free text, collapsing stray whitespace
    #[must_use]
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into().trim().replace("  ", " "),
            country: None,
        }
    }

    /// Restrict the query to a single country
    #[must_use]
    pub fn with_country<S: Into<String>>(mut self, country: S) -> Self {
        self.country = Some(country.into().trim().to_lowercase());
        self
    }
}
