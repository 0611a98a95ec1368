//! Ping sources.
//!
//! The pipeline only sees [`GeoPointStore::fetch_all`]. Two sources ship with
//! the crate: an in-memory list and a JSON file.
//!
//! The JSON format is an array whose records are either
//! `[latitude, longitude, unix_seconds]` triples or
//! `{"latitude": .., "longitude": .., "timestamp": ..}` objects. Timestamps
//! may be floats and are rounded to the nearest second, ties to even.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::error::{HeatmapError, Result};
use crate::GeoPoint;

/// Supplier of the full, materialized ping set.
pub trait GeoPointStore: Send + Sync {
    fn fetch_all(&self) -> Result<Vec<GeoPoint>>;
}

/// Fixed ping list held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    points: Vec<GeoPoint>,
}

impl InMemoryStore {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    /// Build from raw `[lat, lon, timestamp]` triples, validating each record.
    pub fn from_triples(triples: &[[f64; 3]]) -> Result<Self> {
        let points = triples
            .iter()
            .enumerate()
            .map(|(i, [lat, lon, ts])| point_from_record(i, *lat, *lon, *ts))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(points))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl GeoPointStore for InMemoryStore {
    fn fetch_all(&self) -> Result<Vec<GeoPoint>> {
        Ok(self.points.clone())
    }
}

/// Pings read from a JSON file on every fetch.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GeoPointStore for JsonFileStore {
    fn fetch_all(&self) -> Result<Vec<GeoPoint>> {
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| HeatmapError::store(format!("{}: {}", self.path.display(), e)))?;
        let points = parse_pings(&raw)?;
        debug!(
            "[store] loaded {} pings from {}",
            points.len(),
            self.path.display()
        );
        Ok(points)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PingRecord {
    Triple([f64; 3]),
    Object {
        latitude: f64,
        longitude: f64,
        timestamp: f64,
    },
}

/// Parse a JSON ping document.
///
/// Undecodable JSON is a store error; records with unusable values are
/// validation errors naming the offending record.
pub fn parse_pings(json: &str) -> Result<Vec<GeoPoint>> {
    let records: Vec<PingRecord> = serde_json::from_str(json)
        .map_err(|e| HeatmapError::store(format!("invalid ping JSON: {}", e)))?;

    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| match record {
            PingRecord::Triple([lat, lon, ts]) => point_from_record(i, lat, lon, ts),
            PingRecord::Object {
                latitude,
                longitude,
                timestamp,
            } => point_from_record(i, latitude, longitude, timestamp),
        })
        .collect()
}

/// Serialize pings in the triple format accepted by [`parse_pings`].
pub fn pings_to_json(points: &[GeoPoint]) -> Result<String> {
    let triples: Vec<[f64; 3]> = points
        .iter()
        .map(|p| [p.latitude, p.longitude, p.timestamp as f64])
        .collect();
    serde_json::to_string(&triples).map_err(HeatmapError::store)
}

/// Write pings to a JSON file in the triple format.
pub fn write_pings(path: &Path, points: &[GeoPoint]) -> Result<()> {
    let json = pings_to_json(points)?;
    fs::write(path, json).map_err(|e| HeatmapError::store(format!("{}: {}", path.display(), e)))
}

fn point_from_record(
    index: usize,
    latitude: f64,
    longitude: f64,
    timestamp: f64,
) -> Result<GeoPoint> {
    let field = || format!("ping[{}]", index);

    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(HeatmapError::validation(
            field(),
            format!("({}, {})", latitude, longitude),
            "coordinates must be finite",
        ));
    }

    let seconds = timestamp.round_ties_even();
    if !seconds.is_finite() || seconds < i64::MIN as f64 || seconds >= i64::MAX as f64 {
        return Err(HeatmapError::validation(
            field(),
            timestamp,
            "timestamp is not a representable unix time",
        ));
    }

    Ok(GeoPoint::new(latitude, longitude, seconds as i64))
}
