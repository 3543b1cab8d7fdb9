//! Error types and handling for the `SafeRoute` pipeline

use thiserror::Error;

/// Main error type for the `SafeRoute` pipeline
#[derive(Error, Debug)]
pub enum SafeRouteError {
    /// Configuration-related errors (fatal at startup)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A location could not be geocoded after exhausting retries
    #[error("Location not found: {query}")]
    NotFound { query: String },

    /// The routing provider returned no usable path
    #[error("No route found: {message}")]
    NoRoute { message: String },

    /// Provider communication errors; `transient` marks errors worth retrying
    #[error("Provider error: {message}")]
    Provider { message: String, transient: bool },

    /// Map rendering errors
    #[error("Map rendering failed: {reason}")]
    Render { reason: RenderFailure },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Reasons the map renderer can fail
#[derive(Error, Debug)]
pub enum RenderFailure {
    /// No segments were supplied to draw
    #[error("no segments to draw")]
    NoSegments,

    /// The output directory could not be created
    #[error("could not create output directory {path}: {source}")]
    OutputDir {
        path: String,
        source: std::io::Error,
    },

    /// The map file could not be written
    #[error("could not write map file {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

impl SafeRouteError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new not-found error for a geocoding query
    pub fn not_found<S: Into<String>>(query: S) -> Self {
        Self::NotFound {
            query: query.into(),
        }
    }

    /// Create a new no-route error
    pub fn no_route<S: Into<String>>(message: S) -> Self {
        Self::NoRoute {
            message: message.into(),
        }
    }

    /// Create a transient provider error (timeouts, 5xx, empty responses)
    pub fn provider<S: Into<String>>(message: S) -> Self {
        Self::Provider {
            message: message.into(),
            transient: true,
        }
    }

    /// Create a permanent provider error (malformed request, bad credentials)
    pub fn provider_fatal<S: Into<String>>(message: S) -> Self {
        Self::Provider {
            message: message.into(),
            transient: false,
        }
    }

    /// Whether a retry policy may re-attempt the operation that produced this error
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, SafeRouteError::Provider { transient: true, .. })
    }

    /// Get a user-friendly error message naming the failed stage
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SafeRouteError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            SafeRouteError::NotFound { query } => {
                format!(
                    "Could not find '{query}'. Try adding more detail (city, state, country) or checking the spelling."
                )
            }
            SafeRouteError::NoRoute { .. } => {
                "Could not find a route between the specified locations. They may not be connected by road."
                    .to_string()
            }
            SafeRouteError::Provider { .. } => {
                "Unable to reach external services. Please check your internet connection."
                    .to_string()
            }
            SafeRouteError::Render { reason } => {
                format!("Failed to create the safety map: {reason}")
            }
            SafeRouteError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = SafeRouteError::config("missing API key");
        assert!(matches!(config_err, SafeRouteError::Config { .. }));

        let not_found = SafeRouteError::not_found("Atlantis");
        assert!(matches!(not_found, SafeRouteError::NotFound { .. }));

        let provider_err = SafeRouteError::provider("connection reset");
        assert!(provider_err.is_transient());

        let fatal_err = SafeRouteError::provider_fatal("bad request");
        assert!(!fatal_err.is_transient());
    }

    #[test]
    fn test_render_no_segments_is_matchable() {
        let err = SafeRouteError::Render {
            reason: RenderFailure::NoSegments,
        };
        assert!(matches!(
            err,
            SafeRouteError::Render {
                reason: RenderFailure::NoSegments
            }
        ));
    }

    #[test]
    fn test_user_messages() {
        let config_err = SafeRouteError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let not_found = SafeRouteError::not_found("Connaught Place");
        assert!(not_found.user_message().contains("Connaught Place"));

        let no_route = SafeRouteError::no_route("zero paths");
        assert!(no_route.user_message().contains("route"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let route_err: SafeRouteError = io_err.into();
        assert!(matches!(route_err, SafeRouteError::Io { .. }));
    }
}
