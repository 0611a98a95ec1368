//! Shared fixtures for integration tests: fake providers and ping builders.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use heatcluster::locality::{
    AddressComponent, GeocodeResponse, GeocodeResult, NearbyResponse, PlaceResult,
};
use heatcluster::{
    Coordinate, GeoPoint, GeocodingProvider, HeatmapError, PlacesProvider, ResolutionStage,
    Result,
};

pub const NOW: i64 = 1_700_000_000;

/// Timestamp safely inside the current window.
pub const CURRENT_TS: i64 = NOW - 3 * 3600;

/// Timestamp safely inside the predicted window.
pub const PREDICTED_TS: i64 = NOW - 600;

pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// `count` pings on a tight line starting at (lat, lng).
pub fn hotspot(lat: f64, lng: f64, count: usize, timestamp: i64) -> Vec<GeoPoint> {
    (0..count)
        .map(|i| GeoPoint::new(lat + i as f64 * 1e-4, lng, timestamp))
        .collect()
}

pub fn geocode_ok(formatted_address: &str, locality: Option<&str>) -> GeocodeResponse {
    let mut components = vec![AddressComponent {
        long_name: "Sub".to_string(),
        short_name: "Sub".to_string(),
        types: vec!["sublocality".to_string(), "political".to_string()],
    }];
    if let Some(name) = locality {
        components.push(AddressComponent {
            long_name: name.to_string(),
            short_name: name.to_string(),
            types: vec!["locality".to_string(), "political".to_string()],
        });
    }
    GeocodeResponse {
        status: "OK".to_string(),
        results: vec![GeocodeResult {
            formatted_address: formatted_address.to_string(),
            address_components: components,
            ..Default::default()
        }],
        error_message: None,
    }
}

pub fn geocode_status(status: &str) -> GeocodeResponse {
    GeocodeResponse {
        status: status.to_string(),
        ..Default::default()
    }
}

pub fn place(name: &str, types: &[&str]) -> PlaceResult {
    PlaceResult {
        name: name.to_string(),
        types: types.iter().map(|t| t.to_string()).collect(),
        ..Default::default()
    }
}

pub fn nearby_ok(results: Vec<PlaceResult>) -> NearbyResponse {
    NearbyResponse {
        status: "OK".to_string(),
        results,
        next_page_token: None,
    }
}

pub fn nearby_status(status: &str) -> NearbyResponse {
    NearbyResponse {
        status: status.to_string(),
        ..Default::default()
    }
}

/// Geocoder answering from a closure, counting calls.
pub struct FakeGeocoder<F> {
    respond: F,
    calls: AtomicUsize,
    pub seen: Mutex<Vec<(Coordinate, String)>>,
}

impl<F> FakeGeocoder<F>
where
    F: Fn(&Coordinate) -> Result<GeocodeResponse> + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<F> GeocodingProvider for FakeGeocoder<F>
where
    F: Fn(&Coordinate) -> Result<GeocodeResponse> + Send + Sync,
{
    fn reverse_geocode(&self, location: &Coordinate, result_type: &str) -> Result<GeocodeResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((*location, result_type.to_string()));
        (self.respond)(location)
    }
}

/// Places provider answering from a closure, counting calls.
pub struct FakePlaces<F> {
    respond: F,
    calls: AtomicUsize,
    pub radii: Mutex<Vec<u32>>,
}

impl<F> FakePlaces<F>
where
    F: Fn(&Coordinate) -> Result<NearbyResponse> + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            calls: AtomicUsize::new(0),
            radii: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<F> PlacesProvider for FakePlaces<F>
where
    F: Fn(&Coordinate) -> Result<NearbyResponse> + Send + Sync,
{
    fn nearby_search(&self, location: &Coordinate, radius_meters: u32) -> Result<NearbyResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.radii.lock().unwrap().push(radius_meters);
        (self.respond)(location)
    }
}

pub fn transport_failure(stage: ResolutionStage) -> HeatmapError {
    HeatmapError::resolution(stage, "connection reset by peer")
}
