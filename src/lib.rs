//! # Heatcluster
//!
//! Density-based clustering of timestamped geolocation pings for heatmap
//! visualization.
//!
//! This library provides:
//! - Temporal partitioning of pings into "current" and "predicted" windows
//! - DBSCAN clustering per window with R-tree neighborhood search
//! - Cluster centroids, head counts and distance from a query origin
//! - Locality resolution with a reverse-geocode / nearby-search fallback chain
//! - Deterministic grouping of clusters by locality, ordered by distance
//!
//! ## Features
//!
//! - **`parallel`** - Cluster both windows and resolve localities concurrently with rayon
//! - **`http`** - Google Maps backed locality provider (blocking reqwest)
//! - **`cli`** - Build the `heatcluster-cli` binary
//!
//! ## Quick Start
//!
//! ```rust
//! use heatcluster::{
//!     Coordinate, GeoPoint, HeatmapConfig, HeatmapPipeline, InMemoryStore, UnavailableProvider,
//! };
//!
//! let now = 1_700_000_000;
//! let pings: Vec<GeoPoint> = (0..12)
//!     .map(|i| GeoPoint::new(1.0 + i as f64 * 1e-4, 1.0, now - 3 * 3600))
//!     .collect();
//!
//! let config = HeatmapConfig::default();
//! let store = InMemoryStore::new(pings);
//! let pipeline =
//!     HeatmapPipeline::new(store, UnavailableProvider, UnavailableProvider, config).unwrap();
//!
//! let response = pipeline.run(now, Coordinate::origin_or_unset(1.5, 1.5)).unwrap();
//! assert_eq!(response.current.entry_count(), 1);
//! assert!(response.predict.is_empty());
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{HeatmapError, OptionExt, ResolutionStage, Result};

// Geographic utilities (planar + haversine distance, means)
pub mod geo_utils;

// Temporal partitioning into current / predicted windows
pub mod partition;
pub use partition::{partition_by_age, Partitions, TimeWindow, DEFAULT_PREDICTION_LAG_SECS};

// Density-based clustering
pub mod dbscan;
pub use dbscan::{dbscan, Cluster, Clustering, DbscanConfig, PointStatus};

// Centroids, head counts and distance annotation
pub mod aggregate;
pub use aggregate::{distance_from_origin, summarize_cluster, summarize_clusters, ClusterSummary};

// Locality resolution against remote geocoding providers
pub mod locality;
pub use locality::{
    Geocode, GeocodingProvider, LocalityResolver, PlacesProvider, ResolverConfig,
    UnavailableProvider,
};
#[cfg(feature = "http")]
pub use locality::http::GoogleMapsClient;

// Distance sort + locality grouping
pub mod organize;
pub use organize::{organize, LocalityGroup, LocalityGroups};

// Ping sources
pub mod store;
pub use store::{GeoPointStore, InMemoryStore, JsonFileStore};

// Inbound query parameter validation
pub mod query;
pub use query::parse_origin;

// Configuration
pub mod config;
pub use config::HeatmapConfig;

// End-to-end pipeline
pub mod pipeline;
pub use pipeline::{HeatmapPipeline, HeatmapResponse, PipelineStats};

// Synthetic ping generation for tests, benchmarks and demos
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A single timestamped geolocation ping.
///
/// # Example
/// ```
/// use heatcluster::GeoPoint;
/// let ping = GeoPoint::new(-6.2088, 106.8456, 1_700_000_000); // Jakarta
/// assert!(ping.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Unix timestamp (seconds since epoch)
    pub timestamp: i64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64, timestamp: i64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
        }
    }

    /// Check if the point has finite, in-range coordinates.
    pub fn is_valid(&self) -> bool {
        geo_utils::is_valid_coordinate(self.latitude, self.longitude)
    }

    /// Position without the timestamp.
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// A bare latitude/longitude pair (query origins and cluster centroids).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Interpret a raw query origin, treating `(0, 0)` as "no origin supplied".
    ///
    /// `(0, 0)` is also a real coordinate in the Gulf of Guinea; a request made
    /// from there is indistinguishable from one without an origin.
    pub fn origin_or_unset(latitude: f64, longitude: f64) -> Option<Self> {
        if latitude == 0.0 && longitude == 0.0 {
            None
        } else {
            Some(Self::new(latitude, longitude))
        }
    }
}

/// A clustered heatmap hotspot, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapEntry {
    /// Great-circle distance from the query origin in kilometers (0 without origin)
    pub distance: f64,
    /// Centroid latitude
    pub latitude: f64,
    /// Centroid longitude
    pub longitude: f64,
    /// Human readable place name (may be empty)
    pub estimate_location: String,
    /// Locality label used for grouping (empty for unknown)
    pub locality: String,
    /// Number of pings in the originating cluster
    pub pax_count: usize,
}

impl HeatmapEntry {
    /// Build an entry from an aggregated cluster, its resolved place and distance.
    pub fn new(summary: &ClusterSummary, geocode: Geocode, distance: f64) -> Self {
        Self {
            distance,
            latitude: summary.centroid.latitude,
            longitude: summary.centroid.longitude,
            estimate_location: geocode.estimate_location,
            locality: geocode.locality,
            pax_count: summary.pax_count,
        }
    }

    pub fn centroid(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}
