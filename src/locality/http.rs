//! Google Maps backed locality providers.
//!
//! Uses a blocking reqwest client with a per-request timeout. Every
//! transport, HTTP status or JSON decode failure surfaces as a
//! [`HeatmapError::Resolution`] for the stage that issued the call.

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;

use super::{GeocodeResponse, GeocodingProvider, NearbyResponse, PlacesProvider};
use crate::error::{HeatmapError, ResolutionStage, Result};
use crate::Coordinate;

/// Public Google Maps web service root.
pub const GOOGLE_MAPS_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

#[derive(Debug, Clone)]
pub struct GoogleMapsClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GoogleMapsClient {
    /// Create a client whose every request is bounded by `timeout`.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HeatmapError::configuration("http_client", e, "failed to build"))?;

        Ok(Self {
            http,
            base_url: GOOGLE_MAPS_BASE_URL.to_string(),
            api_key: api_key.into(),
        })
    }

    /// Point the client at another API root (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        stage: ResolutionStage,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("[http] GET {} ({} params)", url, query.len());

        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .map_err(|e| HeatmapError::resolution(stage, e))?
            .error_for_status()
            .map_err(|e| HeatmapError::resolution(stage, e))?;

        let body = response
            .text()
            .map_err(|e| HeatmapError::resolution(stage, e))?;

        serde_json::from_str(&body).map_err(|e| HeatmapError::resolution(stage, e))
    }
}

fn lat_lng_param(location: &Coordinate) -> String {
    format!("{},{}", location.latitude, location.longitude)
}

impl GeocodingProvider for GoogleMapsClient {
    fn reverse_geocode(&self, location: &Coordinate, result_type: &str) -> Result<GeocodeResponse> {
        self.get_json(
            ResolutionStage::Geocode,
            "geocode/json",
            &[
                ("latlng", lat_lng_param(location)),
                ("result_type", result_type.to_string()),
            ],
        )
    }
}

impl PlacesProvider for GoogleMapsClient {
    fn nearby_search(&self, location: &Coordinate, radius_meters: u32) -> Result<NearbyResponse> {
        self.get_json(
            ResolutionStage::Nearby,
            "place/nearbysearch/json",
            &[
                ("location", lat_lng_param(location)),
                ("radius", radius_meters.to_string()),
            ],
        )
    }
}
