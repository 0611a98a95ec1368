//! # Heatmap Pipeline
//!
//! Store → partition → DBSCAN per window → centroids → locality + distance →
//! sort and group.
//!
//! A run is a stateless batch transform. Any resolution failure aborts the
//! whole run; no partial response is produced.
//!
//! With the `parallel` feature the two windows are processed concurrently and
//! each window's clusters are resolved on a bounded worker pool. Results are
//! collected per cluster slot, so ordering never depends on completion order.

use std::time::Instant;

use log::{debug, info};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;

use crate::aggregate::{distance_from_origin, summarize_clusters, ClusterSummary};
use crate::config::HeatmapConfig;
use crate::dbscan::dbscan;
use crate::error::Result;
use crate::locality::{Geocode, GeocodingProvider, LocalityResolver, PlacesProvider};
use crate::organize::{organize, LocalityGroups};
use crate::partition::{partition_by_age, TimeWindow};
use crate::store::GeoPointStore;
use crate::{Coordinate, GeoPoint, HeatmapEntry};

/// Response payload: locality-grouped hotspots for both windows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeatmapResponse {
    pub current: LocalityGroups,
    pub predict: LocalityGroups,
}

impl HeatmapResponse {
    pub fn window(&self, window: TimeWindow) -> &LocalityGroups {
        match window {
            TimeWindow::Current => &self.current,
            TimeWindow::Predicted => &self.predict,
        }
    }
}

/// Counters for one window of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WindowStats {
    pub points: usize,
    pub clusters: usize,
    pub noise: usize,
    /// Clusters that landed in the unknown-locality bucket
    pub unresolved: usize,
}

/// Counters and timing for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PipelineStats {
    pub current: WindowStats,
    pub predict: WindowStats,
    pub elapsed_ms: f64,
}

pub struct HeatmapPipeline<S, G, P> {
    store: S,
    resolver: LocalityResolver<G, P>,
    config: HeatmapConfig,
    #[cfg(feature = "parallel")]
    pool: rayon::ThreadPool,
}

impl<S, G, P> HeatmapPipeline<S, G, P>
where
    S: GeoPointStore,
    G: GeocodingProvider,
    P: PlacesProvider,
{
    /// Create a pipeline, failing fast on invalid configuration.
    ///
    /// The locality resolver is built from `config`, so lookup settings
    /// (result type, nearby radius, retries) always match the validated config.
    pub fn new(store: S, geocoder: G, places: P, config: HeatmapConfig) -> Result<Self> {
        config.validate()?;
        let resolver = LocalityResolver::new(geocoder, places, config.resolver_config());

        #[cfg(feature = "parallel")]
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.resolver_workers)
            .thread_name(|i| format!("heatcluster-resolver-{}", i))
            .build()
            .map_err(|e| {
                crate::HeatmapError::configuration(
                    "resolver_workers",
                    config.resolver_workers,
                    e.to_string(),
                )
            })?;

        Ok(Self {
            store,
            resolver,
            config,
            #[cfg(feature = "parallel")]
            pool,
        })
    }

    pub fn config(&self) -> &HeatmapConfig {
        &self.config
    }

    pub fn resolver(&self) -> &LocalityResolver<G, P> {
        &self.resolver
    }

    /// Build the heatmap for query time `now` (unix seconds).
    pub fn run(&self, now: i64, origin: Option<Coordinate>) -> Result<HeatmapResponse> {
        self.run_with_stats(now, origin).map(|(response, _)| response)
    }

    /// Same as [`run`](Self::run), also reporting per-window counters.
    pub fn run_with_stats(
        &self,
        now: i64,
        origin: Option<Coordinate>,
    ) -> Result<(HeatmapResponse, PipelineStats)> {
        let start = Instant::now();

        let points = self.store.fetch_all()?;
        let partitions = partition_by_age(&points, now, self.config.prediction_lag_secs);
        debug!(
            "[pipeline] {} pings: {} current, {} predicted",
            points.len(),
            partitions.current.len(),
            partitions.predicted.len()
        );

        #[cfg(feature = "parallel")]
        let (current, predict) = rayon::join(
            || self.process_window(TimeWindow::Current, &partitions.current, origin.as_ref()),
            || self.process_window(TimeWindow::Predicted, &partitions.predicted, origin.as_ref()),
        );

        // A failed current window aborts before any predict-window lookups
        #[cfg(not(feature = "parallel"))]
        let (current, predict) = {
            let current =
                self.process_window(TimeWindow::Current, &partitions.current, origin.as_ref())?;
            let predict =
                self.process_window(TimeWindow::Predicted, &partitions.predicted, origin.as_ref());
            (Ok::<_, crate::HeatmapError>(current), predict)
        };

        let (current, current_stats) = current?;
        let (predict, predict_stats) = predict?;

        let stats = PipelineStats {
            current: current_stats,
            predict: predict_stats,
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        };

        info!(
            "[pipeline] current: {} clusters in {} localities, \
             predict: {} clusters in {} localities ({:.1}ms)",
            stats.current.clusters,
            current.len(),
            stats.predict.clusters,
            predict.len(),
            stats.elapsed_ms
        );

        Ok((HeatmapResponse { current, predict }, stats))
    }

    fn process_window(
        &self,
        window: TimeWindow,
        points: &[GeoPoint],
        origin: Option<&Coordinate>,
    ) -> Result<(LocalityGroups, WindowStats)> {
        let clustering = dbscan(points, &self.config.dbscan())?;
        let summaries = summarize_clusters(points, &clustering);
        let geocodes = self.resolve_all(&summaries)?;

        let unresolved = geocodes.iter().filter(|g| g.is_unknown()).count();
        let entries: Vec<HeatmapEntry> = summaries
            .iter()
            .zip(geocodes)
            .map(|(summary, geocode)| {
                let distance = distance_from_origin(origin, &summary.centroid);
                HeatmapEntry::new(summary, geocode, distance)
            })
            .collect();

        debug!(
            "[pipeline] {}: {} clusters, {} noise, {} unresolved",
            window,
            clustering.len(),
            clustering.noise.len(),
            unresolved
        );

        let stats = WindowStats {
            points: points.len(),
            clusters: clustering.len(),
            noise: clustering.noise.len(),
            unresolved,
        };

        Ok((organize(entries), stats))
    }

    /// Resolve every centroid, one geocode per summary in summary order.
    fn resolve_all(&self, summaries: &[ClusterSummary]) -> Result<Vec<Geocode>> {
        #[cfg(feature = "parallel")]
        let geocodes: Result<Vec<Geocode>> = self.pool.install(|| {
            summaries
                .par_iter()
                .map(|s| self.resolver.resolve(&s.centroid))
                .collect()
        });

        #[cfg(not(feature = "parallel"))]
        let geocodes: Result<Vec<Geocode>> = summaries
            .iter()
            .map(|s| self.resolver.resolve(&s.centroid))
            .collect();

        geocodes
    }
}
