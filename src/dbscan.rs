//! DBSCAN density clustering.
//!
//! Neighborhoods use planar Euclidean distance on raw latitude/longitude
//! degrees and are answered by an R-tree. Points are visited in input order
//! and neighborhoods are returned in index order, so identical input always
//! yields identical clusters.

use std::collections::VecDeque;

use log::debug;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

use crate::error::{HeatmapError, Result};
use crate::GeoPoint;

/// Default neighborhood radius in degrees.
pub const DEFAULT_EPS: f64 = 1.5;

/// Default minimum neighborhood size (including the point itself) for a core point.
pub const DEFAULT_MIN_PTS: usize = 10;

/// DBSCAN parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DbscanConfig {
    /// Neighborhood radius, in the same unit as the planar metric (degrees).
    /// Default: 1.5
    pub eps: f64,
    /// Minimum number of points in an eps-neighborhood (self included) for a core point.
    /// Default: 10
    pub min_pts: usize,
}

impl Default for DbscanConfig {
    fn default() -> Self {
        Self {
            eps: DEFAULT_EPS,
            min_pts: DEFAULT_MIN_PTS,
        }
    }
}

impl DbscanConfig {
    /// Create a validated configuration.
    pub fn new(eps: f64, min_pts: usize) -> Result<Self> {
        let config = Self { eps, min_pts };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.eps.is_finite() || self.eps <= 0.0 {
            return Err(HeatmapError::configuration(
                "eps",
                self.eps,
                "must be a finite value greater than zero",
            ));
        }
        if self.min_pts == 0 {
            return Err(HeatmapError::configuration(
                "min_pts",
                self.min_pts,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Per-point bookkeeping during a clustering run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointStatus {
    Unvisited,
    /// Visited and not density-reachable so far. May still become a border point.
    Noise,
    /// Member of the cluster with this id.
    Assigned(usize),
}

/// A group of point indices within one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Discovery order, starting at 0
    pub id: usize,
    /// Core point that opened this cluster
    pub seed: usize,
    /// Member indices in ascending order (always contains `seed`)
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Output of a DBSCAN run.
#[derive(Debug, Clone, Default)]
pub struct Clustering {
    /// Clusters in discovery order
    pub clusters: Vec<Cluster>,
    /// Indices of points that belong to no cluster, ascending
    pub noise: Vec<usize>,
    labels: Vec<PointStatus>,
    visits: usize,
}

impl Clustering {
    /// Final status of a point (`Noise` or `Assigned`).
    pub fn label(&self, idx: usize) -> Option<PointStatus> {
        self.labels.get(idx).copied()
    }

    pub fn labels(&self) -> &[PointStatus] {
        &self.labels
    }

    /// Points taken off the expansion frontier over the whole run.
    ///
    /// Never exceeds the number of input points.
    pub fn visits(&self) -> usize {
        self.visits
    }

    pub fn cluster_of(&self, idx: usize) -> Option<usize> {
        match self.label(idx)? {
            PointStatus::Assigned(id) => Some(id),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

// ============================================================================
// Neighborhood index
// ============================================================================

/// A ping with its partition index for R-tree queries
#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    idx: usize,
    lat: f64,
    lng: f64,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lat, self.lng])
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.lat - point[0];
        let dlng = self.lng - point[1];
        dlat * dlat + dlng * dlng
    }
}

struct NeighborIndex {
    tree: RTree<IndexedPoint>,
    eps_2: f64,
}

impl NeighborIndex {
    fn build(points: &[GeoPoint], eps: f64) -> Self {
        let indexed: Vec<IndexedPoint> = points
            .iter()
            .enumerate()
            .map(|(i, p)| IndexedPoint {
                idx: i,
                lat: p.latitude,
                lng: p.longitude,
            })
            .collect();

        Self {
            tree: RTree::bulk_load(indexed),
            eps_2: eps * eps,
        }
    }

    /// All indices within eps of `point` (itself included), ascending.
    fn neighbors(&self, point: &GeoPoint) -> Vec<usize> {
        let mut found: Vec<usize> = self
            .tree
            .locate_within_distance([point.latitude, point.longitude], self.eps_2)
            .map(|p| p.idx)
            .collect();
        found.sort_unstable();
        found
    }
}

// ============================================================================
// Clustering
// ============================================================================

/// Run DBSCAN over a partition's points.
///
/// Empty input yields zero clusters. Invalid parameters fail with a
/// configuration error; non-finite coordinates fail with a validation error.
pub fn dbscan(points: &[GeoPoint], config: &DbscanConfig) -> Result<Clustering> {
    config.validate()?;

    if let Some((idx, p)) = points
        .iter()
        .enumerate()
        .find(|(_, p)| !p.latitude.is_finite() || !p.longitude.is_finite())
    {
        return Err(HeatmapError::validation(
            format!("point[{}]", idx),
            format!("({}, {})", p.latitude, p.longitude),
            "coordinates must be finite",
        ));
    }

    if points.is_empty() {
        return Ok(Clustering::default());
    }

    let index = NeighborIndex::build(points, config.eps);
    let mut status = vec![PointStatus::Unvisited; points.len()];
    let mut clusters: Vec<Cluster> = Vec::new();
    let mut visits = 0;

    for seed in 0..points.len() {
        if status[seed] != PointStatus::Unvisited {
            continue;
        }

        let neighborhood = index.neighbors(&points[seed]);
        if neighborhood.len() < config.min_pts {
            status[seed] = PointStatus::Noise;
            continue;
        }

        let id = clusters.len();
        status[seed] = PointStatus::Assigned(id);
        let mut members = vec![seed];
        let mut frontier: VecDeque<usize> = VecDeque::new();
        claim(&neighborhood, id, &mut status, &mut members, &mut frontier);

        while let Some(q) = frontier.pop_front() {
            visits += 1;
            let q_neighborhood = index.neighbors(&points[q]);
            if q_neighborhood.len() >= config.min_pts {
                claim(&q_neighborhood, id, &mut status, &mut members, &mut frontier);
            }
        }

        members.sort_unstable();
        debug!(
            "[dbscan] cluster {} seeded at {} with {} members",
            id,
            seed,
            members.len()
        );
        clusters.push(Cluster { id, seed, members });
    }

    let noise: Vec<usize> = status
        .iter()
        .enumerate()
        .filter(|(_, s)| **s == PointStatus::Noise)
        .map(|(i, _)| i)
        .collect();

    debug!(
        "[dbscan] {} points -> {} clusters, {} noise (eps={}, min_pts={})",
        points.len(),
        clusters.len(),
        noise.len(),
        config.eps,
        config.min_pts
    );

    Ok(Clustering {
        clusters,
        noise,
        labels: status,
        visits,
    })
}

/// Assign every unclaimed neighbor to cluster `id`.
///
/// Points are assigned when they enter the frontier, so each point is queued
/// at most once. Known noise becomes a border point and is never expanded.
fn claim(
    neighborhood: &[usize],
    id: usize,
    status: &mut [PointStatus],
    members: &mut Vec<usize>,
    frontier: &mut VecDeque<usize>,
) {
    for &r in neighborhood {
        match status[r] {
            PointStatus::Assigned(_) => {}
            PointStatus::Noise => {
                status[r] = PointStatus::Assigned(id);
                members.push(r);
            }
            PointStatus::Unvisited => {
                status[r] = PointStatus::Assigned(id);
                members.push(r);
                frontier.push_back(r);
            }
        }
    }
}
