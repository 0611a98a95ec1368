//! Unified error handling for the heatmap pipeline.
//!
//! Four failure classes exist:
//! - [`HeatmapError::Validation`] for malformed numeric input (client error)
//! - [`HeatmapError::Configuration`] for invalid clustering/resolver settings
//! - [`HeatmapError::Resolution`] for remote locality lookup failures (request-fatal)
//! - [`HeatmapError::Store`] when the ping source cannot be materialized
//!
//! An unknown locality is not an error: it resolves to an empty [`crate::Geocode`].

use std::fmt;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HeatmapError>;

/// Which remote lookup a resolution failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStage {
    /// Reverse geocoding restricted to sublocality results.
    Geocode,
    /// Nearby-places fallback search.
    Nearby,
}

impl fmt::Display for ResolutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionStage::Geocode => write!(f, "geocode"),
            ResolutionStage::Nearby => write!(f, "nearby"),
        }
    }
}

#[derive(Debug, Error)]
pub enum HeatmapError {
    #[error("invalid {field} '{value}': {reason}")]
    Validation {
        field: String,
        value: String,
        reason: String,
    },

    #[error("invalid configuration: {parameter} = {value} ({reason})")]
    Configuration {
        parameter: &'static str,
        value: String,
        reason: String,
    },

    #[error("locality resolution failed during {stage} lookup: {message}")]
    Resolution {
        stage: ResolutionStage,
        message: String,
    },

    #[error("ping store unavailable: {message}")]
    Store { message: String },
}

impl HeatmapError {
    pub fn validation(
        field: impl Into<String>,
        value: impl fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        HeatmapError::Validation {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn configuration(
        parameter: &'static str,
        value: impl fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        HeatmapError::Configuration {
            parameter,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn resolution(stage: ResolutionStage, message: impl fmt::Display) -> Self {
        HeatmapError::Resolution {
            stage,
            message: message.to_string(),
        }
    }

    pub fn store(message: impl fmt::Display) -> Self {
        HeatmapError::Store {
            message: message.to_string(),
        }
    }

    /// True for errors caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, HeatmapError::Validation { .. })
    }
}

/// Convert missing parse results into validation errors.
pub trait OptionExt<T> {
    fn ok_or_validation(self, field: &str, value: &str, reason: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_validation(self, field: &str, value: &str, reason: &str) -> Result<T> {
        self.ok_or_else(|| HeatmapError::validation(field, value, reason))
    }
}
