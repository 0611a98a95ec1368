//! Synthetic ping generator for tests, benchmarks and demos.
//!
//! Generates dense hotspots around known centers plus scattered background
//! pings, split between the current and predicted windows.
//!
//! # Example
//!
//! ```rust
//! use heatcluster::synthetic::PingScenario;
//! use heatcluster::Coordinate;
//!
//! let scenario = PingScenario {
//!     centers: vec![Coordinate::new(-6.2, 106.8), Coordinate::new(-7.8, 110.4)],
//!     points_per_center: 25,
//!     ..PingScenario::default()
//! };
//!
//! let pings = scenario.generate();
//! assert_eq!(pings.len(), 50 + scenario.background_points);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::partition::DEFAULT_PREDICTION_LAG_SECS;
use crate::{Coordinate, GeoPoint};

/// Scenario configuration for generating synthetic pings.
#[derive(Debug, Clone)]
pub struct PingScenario {
    /// Hotspot centers.
    pub centers: Vec<Coordinate>,
    /// Pings generated around each center.
    pub points_per_center: usize,
    /// Maximum offset from a center in degrees (uniform per axis).
    pub spread_degrees: f64,
    /// Scattered pings placed uniformly over `background_bounds`.
    pub background_points: usize,
    /// (south-west, north-east) corners of the background area.
    pub background_bounds: (Coordinate, Coordinate),
    /// Fraction of pings (0.0-1.0) stamped inside the predicted window.
    pub predicted_fraction: f64,
    /// Query time the timestamps are generated relative to.
    pub now: i64,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

impl Default for PingScenario {
    fn default() -> Self {
        Self {
            centers: vec![Coordinate::new(-6.2088, 106.8456)],
            points_per_center: 20,
            spread_degrees: 0.05,
            background_points: 5,
            background_bounds: (Coordinate::new(-60.0, -170.0), Coordinate::new(60.0, 170.0)),
            predicted_fraction: 0.3,
            now: 1_700_000_000,
            seed: 42,
        }
    }
}

impl PingScenario {
    /// Generate pings: each center's hotspot in turn, then the background.
    pub fn generate(&self) -> Vec<GeoPoint> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let total = self.centers.len() * self.points_per_center + self.background_points;
        let mut pings = Vec::with_capacity(total);

        for center in &self.centers {
            for _ in 0..self.points_per_center {
                let lat = center.latitude + offset(&mut rng, self.spread_degrees);
                let lng = center.longitude + offset(&mut rng, self.spread_degrees);
                let ts = self.timestamp(&mut rng);
                pings.push(GeoPoint::new(lat.clamp(-90.0, 90.0), lng.clamp(-180.0, 180.0), ts));
            }
        }

        let (sw, ne) = self.background_bounds;
        for _ in 0..self.background_points {
            let lat = sample(&mut rng, sw.latitude, ne.latitude);
            let lng = sample(&mut rng, sw.longitude, ne.longitude);
            let ts = self.timestamp(&mut rng);
            pings.push(GeoPoint::new(lat, lng, ts));
        }

        pings
    }

    fn timestamp(&self, rng: &mut StdRng) -> i64 {
        let lag = DEFAULT_PREDICTION_LAG_SECS;
        if rng.gen_bool(self.predicted_fraction.clamp(0.0, 1.0)) {
            // Inside [now - lag, now]
            self.now - rng.gen_range(0..=lag)
        } else {
            // Strictly older than the cutoff, up to a day back
            self.now - lag - rng.gen_range(1..=24 * 60 * 60)
        }
    }
}

fn offset(rng: &mut StdRng, spread: f64) -> f64 {
    if spread <= 0.0 {
        0.0
    } else {
        rng.gen_range(-spread..=spread)
    }
}

fn sample(rng: &mut StdRng, lo: f64, hi: f64) -> f64 {
    if hi <= lo {
        lo
    } else {
        rng.gen_range(lo..hi)
    }
}
