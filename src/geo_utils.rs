//! Geographic utilities.
//!
//! Two metrics are used by the pipeline:
//! - planar Euclidean distance on raw degrees, for DBSCAN neighborhoods
//! - haversine great-circle distance in kilometers, for distance from origin

use geo::{Distance, Haversine, Point};

use crate::{Coordinate, GeoPoint};

/// Squared planar distance between two pings in degrees².
#[inline]
pub fn planar_distance_2(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let dlat = a.latitude - b.latitude;
    let dlng = a.longitude - b.longitude;
    dlat * dlat + dlng * dlng
}

/// Planar distance between two pings in degrees (no geodesic correction).
#[inline]
pub fn planar_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    planar_distance_2(a, b).sqrt()
}

/// Great-circle distance between two coordinates in kilometers.
pub fn haversine_km(a: &Coordinate, b: &Coordinate) -> f64 {
    // geo points are (x = lng, y = lat)
    let p1 = Point::new(a.longitude, a.latitude);
    let p2 = Point::new(b.longitude, b.latitude);
    Haversine::distance(p1, p2) / 1000.0
}

/// Arithmetic mean of a set of coordinates.
///
/// Returns `None` for an empty input.
pub fn mean_coordinate<I>(coords: I) -> Option<Coordinate>
where
    I: IntoIterator<Item = Coordinate>,
{
    let mut sum_lat = 0.0;
    let mut sum_lng = 0.0;
    let mut count = 0usize;

    for c in coords {
        sum_lat += c.latitude;
        sum_lng += c.longitude;
        count += 1;
    }

    if count == 0 {
        return None;
    }

    Some(Coordinate::new(
        sum_lat / count as f64,
        sum_lng / count as f64,
    ))
}

/// Check that a latitude/longitude pair is finite and within WGS84 ranges.
pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}
