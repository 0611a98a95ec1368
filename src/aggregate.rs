//! Cluster aggregation and distance annotation.

use serde::Serialize;

use crate::dbscan::{Cluster, Clustering};
use crate::geo_utils::{haversine_km, mean_coordinate};
use crate::{Coordinate, GeoPoint};

/// Centroid and head count of one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub cluster_id: usize,
    /// Simple arithmetic mean of member latitudes and longitudes
    pub centroid: Coordinate,
    pub pax_count: usize,
}

/// Summarize a cluster of `points`.
///
/// # Panics
///
/// Panics if the cluster is empty or references an index outside `points`.
/// DBSCAN never produces either, so both are defects.
pub fn summarize_cluster(points: &[GeoPoint], cluster: &Cluster) -> ClusterSummary {
    assert!(
        !cluster.members.is_empty(),
        "cluster {} has no members",
        cluster.id
    );

    let centroid = mean_coordinate(cluster.members.iter().map(|&i| points[i].coordinate()))
        .expect("non-empty cluster has a centroid");

    ClusterSummary {
        cluster_id: cluster.id,
        centroid,
        pax_count: cluster.members.len(),
    }
}

/// Summaries for every cluster, in discovery order.
pub fn summarize_clusters(points: &[GeoPoint], clustering: &Clustering) -> Vec<ClusterSummary> {
    clustering
        .clusters
        .iter()
        .map(|c| summarize_cluster(points, c))
        .collect()
}

/// Kilometers from the query origin to a centroid, 0 when no origin was given.
pub fn distance_from_origin(origin: Option<&Coordinate>, centroid: &Coordinate) -> f64 {
    origin.map_or(0.0, |o| haversine_km(o, centroid))
}
