//! # Locality Resolution
//!
//! Maps a cluster centroid to a place name and locality label using two
//! remote lookups:
//!
//! 1. Reverse geocoding restricted to `sublocality` results. On an `OK`
//!    status the first result's formatted address becomes the estimated
//!    location and its first `locality` address component the locality.
//! 2. Otherwise a nearby-places search within a small radius. The first
//!    result typed `locality` names the locality, the first result that is
//!    not a locality names the estimated location.
//!
//! If the nearby search is not `OK` either, the centroid lands in the
//! unknown-locality bucket (both strings empty). Transport failures in
//! either lookup are request-fatal [`HeatmapError::Resolution`] errors.
//!
//! Every call hits the providers; nothing is cached between centroids.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{HeatmapError, ResolutionStage, Result};
use crate::Coordinate;

#[cfg(feature = "http")]
pub mod http;

/// Status string signalling a usable provider response.
pub const STATUS_OK: &str = "OK";

/// Place type marking an administrative locality.
pub const LOCALITY_TYPE: &str = "locality";

/// Default result type filter for reverse geocoding.
pub const DEFAULT_RESULT_TYPE: &str = "sublocality";

/// Default nearby-search radius in meters.
pub const DEFAULT_NEARBY_RADIUS_METERS: u32 = 100;

// ============================================================================
// Types
// ============================================================================

/// Resolved place for a centroid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geocode {
    pub estimate_location: String,
    pub locality: String,
}

impl Geocode {
    /// The unknown-locality bucket.
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_unknown(&self) -> bool {
        self.estimate_location.is_empty() && self.locality.is_empty()
    }
}

/// Reverse geocoding response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub formatted_address: String,
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
    #[serde(default)]
    pub place_id: String,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// Nearby-places search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NearbyResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<PlaceResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceResult {
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vicinity: Option<String>,
    #[serde(default)]
    pub place_id: String,
}

fn has_type(types: &[String], wanted: &str) -> bool {
    types.iter().any(|t| t == wanted)
}

// ============================================================================
// Providers
// ============================================================================

/// Reverse geocoding backend.
///
/// A non-`OK` status is a normal answer. `Err` is reserved for transport,
/// decode and timeout failures.
pub trait GeocodingProvider: Send + Sync {
    fn reverse_geocode(&self, location: &Coordinate, result_type: &str) -> Result<GeocodeResponse>;
}

/// Nearby-places search backend. Same status semantics as [`GeocodingProvider`].
pub trait PlacesProvider: Send + Sync {
    fn nearby_search(&self, location: &Coordinate, radius_meters: u32) -> Result<NearbyResponse>;
}

impl<T: GeocodingProvider + ?Sized> GeocodingProvider for Arc<T> {
    fn reverse_geocode(&self, location: &Coordinate, result_type: &str) -> Result<GeocodeResponse> {
        (**self).reverse_geocode(location, result_type)
    }
}

impl<T: PlacesProvider + ?Sized> PlacesProvider for Arc<T> {
    fn nearby_search(&self, location: &Coordinate, radius_meters: u32) -> Result<NearbyResponse> {
        (**self).nearby_search(location, radius_meters)
    }
}

/// Offline provider answering `ZERO_RESULTS` to everything.
///
/// Resolves every centroid to the unknown-locality bucket without network access.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableProvider;

pub const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

impl GeocodingProvider for UnavailableProvider {
    fn reverse_geocode(&self, _: &Coordinate, _: &str) -> Result<GeocodeResponse> {
        Ok(GeocodeResponse {
            status: STATUS_ZERO_RESULTS.to_string(),
            ..Default::default()
        })
    }
}

impl PlacesProvider for UnavailableProvider {
    fn nearby_search(&self, _: &Coordinate, _: u32) -> Result<NearbyResponse> {
        Ok(NearbyResponse {
            status: STATUS_ZERO_RESULTS.to_string(),
            ..Default::default()
        })
    }
}

// ============================================================================
// Response interpretation
// ============================================================================

/// Extract a geocode from a reverse geocoding response.
///
/// Returns `None` when the nearby-search fallback should run: a non-`OK`
/// status, or an `OK` status without any result.
pub fn geocode_from_reverse(response: &GeocodeResponse) -> Option<Geocode> {
    if response.status != STATUS_OK {
        return None;
    }
    let first = response.results.first()?;

    let locality = first
        .address_components
        .iter()
        .find(|c| has_type(&c.types, LOCALITY_TYPE))
        .map(|c| c.long_name.clone())
        .unwrap_or_default();

    Some(Geocode {
        estimate_location: first.formatted_address.clone(),
        locality,
    })
}

/// Extract a geocode from a nearby search response.
///
/// A non-`OK` status yields the unknown-locality bucket.
pub fn geocode_from_nearby(response: &NearbyResponse) -> Geocode {
    if response.status != STATUS_OK {
        return Geocode::unknown();
    }

    let locality = response
        .results
        .iter()
        .find(|r| has_type(&r.types, LOCALITY_TYPE))
        .map(|r| r.name.clone())
        .unwrap_or_default();

    let estimate_location = response
        .results
        .iter()
        .find(|r| !has_type(&r.types, LOCALITY_TYPE))
        .map(|r| r.name.clone())
        .unwrap_or_default();

    Geocode {
        estimate_location,
        locality,
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Settings for the fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    /// Result type filter for reverse geocoding. Default: "sublocality"
    pub result_type: String,
    /// Nearby-search radius in meters. Default: 100
    pub nearby_radius_meters: u32,
    /// Attempts per remote call, including the first. Default: 1 (no retry)
    pub max_attempts: u32,
    /// Backoff before the first retry, doubled on each further retry. Default: 250ms
    pub retry_backoff: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            result_type: DEFAULT_RESULT_TYPE.to_string(),
            nearby_radius_meters: DEFAULT_NEARBY_RADIUS_METERS,
            max_attempts: 1,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

/// Two-tier locality resolver over a geocoding and a places provider.
#[derive(Debug, Clone)]
pub struct LocalityResolver<G, P> {
    geocoder: G,
    places: P,
    config: ResolverConfig,
}

impl<G: GeocodingProvider, P: PlacesProvider> LocalityResolver<G, P> {
    pub fn new(geocoder: G, places: P, config: ResolverConfig) -> Self {
        Self {
            geocoder,
            places,
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a centroid through the reverse-geocode / nearby-search chain.
    pub fn resolve(&self, centroid: &Coordinate) -> Result<Geocode> {
        let response = self.with_retry(ResolutionStage::Geocode, || {
            self.geocoder.reverse_geocode(centroid, &self.config.result_type)
        })?;

        if let Some(geocode) = geocode_from_reverse(&response) {
            debug!(
                "[locality] ({:.5}, {:.5}) -> '{}' via geocode",
                centroid.latitude, centroid.longitude, geocode.locality
            );
            return Ok(geocode);
        }

        warn!(
            "[locality] geocode status {} for ({:.5}, {:.5}), falling back to nearby search",
            response.status, centroid.latitude, centroid.longitude
        );

        let nearby = self.with_retry(ResolutionStage::Nearby, || {
            self.places.nearby_search(centroid, self.config.nearby_radius_meters)
        })?;

        let geocode = geocode_from_nearby(&nearby);
        if geocode.is_unknown() {
            debug!(
                "[locality] ({:.5}, {:.5}) unresolved (nearby status {})",
                centroid.latitude, centroid.longitude, nearby.status
            );
        }
        Ok(geocode)
    }

    fn with_retry<T>(
        &self,
        stage: ResolutionStage,
        mut call: impl FnMut() -> Result<T>,
    ) -> Result<T> {
        let attempts = self.config.max_attempts.max(1);
        let mut backoff = self.config.retry_backoff;
        let mut attempt = 1;

        loop {
            match call() {
                Ok(value) => return Ok(value),
                Err(err) if attempt < attempts => {
                    warn!(
                        "[locality] {} attempt {}/{} failed: {}; retrying in {:?}",
                        stage, attempt, attempts, err, backoff
                    );
                    thread::sleep(backoff);
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                Err(err) => {
                    return Err(match err {
                        HeatmapError::Resolution { .. } => err,
                        other => HeatmapError::resolution(stage, other),
                    })
                }
            }
        }
    }
}
