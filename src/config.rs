//! Pipeline configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dbscan::{DbscanConfig, DEFAULT_EPS, DEFAULT_MIN_PTS};
use crate::error::{HeatmapError, Result};
use crate::locality::{ResolverConfig, DEFAULT_NEARBY_RADIUS_METERS, DEFAULT_RESULT_TYPE};
use crate::partition::DEFAULT_PREDICTION_LAG_SECS;

/// Configuration for a heatmap pipeline.
///
/// Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    /// DBSCAN neighborhood radius in degrees.
    /// Default: 1.5
    pub eps: f64,

    /// Minimum neighborhood size for a core point.
    /// Default: 10
    pub min_pts: usize,

    /// Pings older than `now - prediction_lag_secs` are "current".
    /// Default: 7200 (2 hours)
    pub prediction_lag_secs: i64,

    /// Reverse geocoding result type filter.
    /// Default: "sublocality"
    pub geocode_result_type: String,

    /// Radius for the nearby-places fallback in meters.
    /// Default: 100
    pub nearby_radius_meters: u32,

    /// Timeout for each remote lookup in seconds.
    /// Default: 10
    pub request_timeout_secs: u64,

    /// Attempts per remote lookup, including the first (1 = no retry).
    /// Default: 1
    pub max_attempts: u32,

    /// Backoff before the first retry, doubled per retry.
    /// Default: 250ms
    pub retry_backoff_ms: u64,

    /// Concurrent locality lookups per window (with the `parallel` feature).
    /// Default: 4
    pub resolver_workers: usize,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            eps: DEFAULT_EPS,
            min_pts: DEFAULT_MIN_PTS,
            prediction_lag_secs: DEFAULT_PREDICTION_LAG_SECS,
            geocode_result_type: DEFAULT_RESULT_TYPE.to_string(),
            nearby_radius_meters: DEFAULT_NEARBY_RADIUS_METERS,
            request_timeout_secs: 10,
            max_attempts: 1,
            retry_backoff_ms: 250,
            resolver_workers: 4,
        }
    }
}

impl HeatmapConfig {
    /// Load a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            HeatmapError::configuration("config_file", path.display(), e.to_string())
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            HeatmapError::configuration("config_file", path.display(), e.to_string())
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.dbscan().validate()?;

        if self.prediction_lag_secs < 0 {
            return Err(HeatmapError::configuration(
                "prediction_lag_secs",
                self.prediction_lag_secs,
                "must not be negative",
            ));
        }
        if self.geocode_result_type.trim().is_empty() {
            return Err(HeatmapError::configuration(
                "geocode_result_type",
                "\"\"",
                "must not be empty",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(HeatmapError::configuration(
                "request_timeout_secs",
                0,
                "must be at least 1",
            ));
        }
        if self.max_attempts == 0 {
            return Err(HeatmapError::configuration(
                "max_attempts",
                0,
                "must be at least 1",
            ));
        }
        if self.resolver_workers == 0 {
            return Err(HeatmapError::configuration(
                "resolver_workers",
                0,
                "must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn dbscan(&self) -> DbscanConfig {
        DbscanConfig {
            eps: self.eps,
            min_pts: self.min_pts,
        }
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            result_type: self.geocode_result_type.clone(),
            nearby_radius_meters: self.nearby_radius_meters,
            max_attempts: self.max_attempts,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
