//! End-to-end tests for the heatmap pipeline

mod common;

use std::sync::Arc;

use common::*;
use heatcluster::locality::GeocodeResponse;
use heatcluster::{
    Coordinate, GeoPoint, HeatmapConfig, HeatmapError, HeatmapPipeline, InMemoryStore,
    ResolutionStage, UnavailableProvider,
};

fn offline_pipeline(
    points: Vec<GeoPoint>,
) -> HeatmapPipeline<InMemoryStore, UnavailableProvider, UnavailableProvider> {
    let store = InMemoryStore::new(points);
    HeatmapPipeline::new(store, UnavailableProvider, UnavailableProvider, HeatmapConfig::default())
        .unwrap()
}

/// Locality named after the integer part of the centroid latitude.
fn locality_by_latitude(c: &Coordinate) -> heatcluster::Result<GeocodeResponse> {
    let name = format!("Lat{}", c.latitude.round() as i64);
    Ok(geocode_ok(&format!("{} center", name), Some(&name)))
}

#[test]
fn test_single_tight_cluster_in_current_window() {
    let points: Vec<GeoPoint> = (0..12).map(|_| GeoPoint::new(1.0, 1.0, CURRENT_TS)).collect();
    let response = offline_pipeline(points).run(NOW, None).unwrap();

    assert!(response.predict.is_empty());
    assert_eq!(response.current.len(), 1);

    let entries = response.current.get("").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].pax_count, 12);
    assert_eq!(entries[0].latitude, 1.0);
    assert_eq!(entries[0].longitude, 1.0);
    assert_eq!(entries[0].distance, 0.0);
}

#[test]
fn test_nearby_fallback_scenario() {
    let geocoder = FakeGeocoder::new(|_| Ok(geocode_status("ZERO_RESULTS")));
    let places = FakePlaces::new(|_| Ok(nearby_ok(vec![place("Foo", &["locality"])])));
    let store = InMemoryStore::new(hotspot(1.0, 1.0, 12, CURRENT_TS));

    let response = HeatmapPipeline::new(store, geocoder, places, HeatmapConfig::default())
        .unwrap()
        .run(NOW, None)
        .unwrap();

    let entries = response.current.get("Foo").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].locality, "Foo");
    assert_eq!(entries[0].estimate_location, "");
}

#[test]
fn test_unknown_locality_entries_are_kept() {
    let mut points = hotspot(1.0, 1.0, 12, CURRENT_TS);
    points.extend(hotspot(30.0, 30.0, 15, PREDICTED_TS));
    let response = offline_pipeline(points).run(NOW, None).unwrap();

    let current = response.current.get("").unwrap();
    let predict = response.predict.get("").unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(predict.len(), 1);
    assert_eq!(current[0].estimate_location, "");
    assert_eq!(predict[0].pax_count, 15);
}

#[test]
fn test_windows_are_independent() {
    // Same location in both windows, but neither window alone is dense enough
    let mut points = hotspot(5.0, 5.0, 6, CURRENT_TS);
    points.extend(hotspot(5.0, 5.0, 6, PREDICTED_TS));
    let response = offline_pipeline(points).run(NOW, None).unwrap();

    assert!(response.current.is_empty());
    assert!(response.predict.is_empty());
}

#[test]
fn test_noise_is_dropped() {
    let mut points = hotspot(-6.2, 106.8, 10, CURRENT_TS);
    points.push(GeoPoint::new(40.0, -70.0, CURRENT_TS));
    points.push(GeoPoint::new(-30.0, 20.0, CURRENT_TS));

    let (response, stats) = offline_pipeline(points).run_with_stats(NOW, None).unwrap();
    assert_eq!(response.current.entry_count(), 1);
    assert_eq!(response.current.get("").unwrap()[0].pax_count, 10);
    assert_eq!(stats.current.points, 12);
    assert_eq!(stats.current.clusters, 1);
    assert_eq!(stats.current.noise, 2);
    assert_eq!(stats.current.unresolved, 1);
    assert_eq!(stats.predict.points, 0);
}

#[test]
fn test_sorted_by_distance_and_grouped_by_locality() {
    let mut points = Vec::new();
    points.extend(hotspot(20.0, 0.0, 10, CURRENT_TS)); // Lat20, far
    points.extend(hotspot(3.0, 0.0, 10, CURRENT_TS)); // Lat3, near
    points.extend(hotspot(10.0, 0.0, 10, CURRENT_TS)); // Lat10, middle
    points.extend(hotspot(3.0, 10.0, 10, CURRENT_TS)); // Lat3, farther than (10, 0)

    let pipeline = HeatmapPipeline::new(
        InMemoryStore::new(points),
        FakeGeocoder::new(locality_by_latitude),
        UnavailableProvider,
        HeatmapConfig::default(),
    )
    .unwrap();
    let origin = Coordinate::origin_or_unset(1.0, 0.001);
    let response = pipeline.run(NOW, origin).unwrap();

    let localities: Vec<&str> = response.current.localities().collect();
    assert_eq!(localities, vec!["Lat3", "Lat10", "Lat20"]);

    let lat3 = response.current.get("Lat3").unwrap();
    assert_eq!(lat3.len(), 2);
    assert!(lat3[0].distance < lat3[1].distance);
    assert!(lat3[0].longitude < 1.0);

    let flat = response.current.flatten();
    for pair in flat.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
    assert!(flat.iter().all(|e| e.distance > 0.0));
}

#[test]
fn test_one_lookup_per_cluster_no_caching() {
    // Two clusters with the exact same centroid still trigger two lookups
    let mut points: Vec<GeoPoint> =
        (0..10).map(|_| GeoPoint::new(2.0, 2.0, CURRENT_TS)).collect();
    points.extend((0..10).map(|_| GeoPoint::new(2.0, 2.0, PREDICTED_TS)));
    points.extend(hotspot(40.0, 40.0, 10, CURRENT_TS));

    let geocoder = Arc::new(FakeGeocoder::new(|_| Ok(geocode_status("ZERO_RESULTS"))));
    let places = Arc::new(FakePlaces::new(|_| Ok(nearby_status("ZERO_RESULTS"))));
    let store = InMemoryStore::new(points);
    let pipeline =
        HeatmapPipeline::new(store, geocoder.clone(), places.clone(), HeatmapConfig::default())
            .unwrap();

    let response = pipeline.run(NOW, None).unwrap();
    assert_eq!(response.current.entry_count() + response.predict.entry_count(), 3);
    assert_eq!(geocoder.calls(), 3);
    assert_eq!(places.calls(), 3);
}

#[test]
fn test_resolution_failure_aborts_request() {
    let mut points = hotspot(1.0, 1.0, 10, CURRENT_TS);
    points.extend(hotspot(50.0, 50.0, 10, CURRENT_TS));
    points.extend(hotspot(-50.0, -50.0, 10, PREDICTED_TS));

    // Only the cluster near (50, 50) fails
    let geocoder = FakeGeocoder::new(|c| {
        if c.latitude > 40.0 {
            Err(transport_failure(ResolutionStage::Geocode))
        } else {
            Ok(geocode_ok("ok", Some("ok")))
        }
    });
    let store = InMemoryStore::new(points);
    let pipeline =
        HeatmapPipeline::new(store, geocoder, UnavailableProvider, HeatmapConfig::default())
            .unwrap();

    let err = pipeline.run(NOW, None).unwrap_err();
    assert!(matches!(err, HeatmapError::Resolution { .. }));
}

#[test]
fn test_invalid_config_rejected_at_construction() {
    let config = HeatmapConfig {
        eps: -1.0,
        ..Default::default()
    };
    let result = HeatmapPipeline::new(
        InMemoryStore::default(),
        UnavailableProvider,
        UnavailableProvider,
        config,
    );
    assert!(matches!(result, Err(HeatmapError::Configuration { .. })));
}

#[test]
fn test_empty_store() {
    let response = offline_pipeline(Vec::new()).run(NOW, None).unwrap();
    assert!(response.current.is_empty());
    assert!(response.predict.is_empty());
    assert_eq!(
        serde_json::to_string(&response).unwrap(),
        r#"{"current":{},"predict":{}}"#
    );
}

#[test]
fn test_response_json_shape() {
    let response = offline_pipeline(hotspot(1.0, 1.0, 12, PREDICTED_TS))
        .run(NOW, None)
        .unwrap();
    let value: serde_json::Value = serde_json::to_value(&response).unwrap();

    assert!(value["current"].as_object().unwrap().is_empty());
    let entry = &value["predict"][""][0];
    assert_eq!(entry["pax_count"], 12);
    assert_eq!(entry["locality"], "");
    assert_eq!(entry["estimate_location"], "");
    assert_eq!(entry["distance"], 0.0);
    assert!(entry["latitude"].as_f64().is_some());
    assert!(entry["longitude"].as_f64().is_some());
}

#[test]
fn test_repeated_runs_are_identical() {
    let mut points = hotspot(1.0, 1.0, 12, CURRENT_TS);
    points.extend(hotspot(8.0, 8.0, 11, CURRENT_TS));
    points.extend(hotspot(-8.0, 8.0, 14, PREDICTED_TS));

    let pipeline = offline_pipeline(points);
    let origin = Some(Coordinate::new(2.0, 2.0));
    let first = pipeline.run(NOW, origin).unwrap();
    let second = pipeline.run(NOW, origin).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_resolver_follows_pipeline_config() {
    let geocoder = Arc::new(FakeGeocoder::new(|_| Ok(geocode_status("ZERO_RESULTS"))));
    let places = Arc::new(FakePlaces::new(|_| Ok(nearby_status("ZERO_RESULTS"))));
    let config = HeatmapConfig {
        geocode_result_type: "neighborhood".to_string(),
        nearby_radius_meters: 250,
        max_attempts: 3,
        ..Default::default()
    };
    let store = InMemoryStore::new(hotspot(1.0, 1.0, 12, CURRENT_TS));
    let pipeline = HeatmapPipeline::new(store, geocoder.clone(), places.clone(), config).unwrap();

    assert_eq!(pipeline.resolver().config().nearby_radius_meters, 250);
    assert_eq!(pipeline.resolver().config().max_attempts, 3);

    pipeline.run(NOW, None).unwrap();
    let seen = geocoder.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].1, "neighborhood");
    assert_eq!(*places.radii.lock().unwrap(), vec![250]);
}

#[cfg(not(feature = "parallel"))]
#[test]
fn test_failed_current_window_skips_predict_lookups() {
    let mut points = hotspot(1.0, 1.0, 10, CURRENT_TS);
    points.extend(hotspot(-50.0, -50.0, 10, PREDICTED_TS));

    let geocoder = Arc::new(FakeGeocoder::new(|_| {
        Err(transport_failure(ResolutionStage::Geocode))
    }));
    let store = InMemoryStore::new(points);
    let pipeline =
        HeatmapPipeline::new(store, geocoder.clone(), UnavailableProvider, HeatmapConfig::default())
            .unwrap();

    let err = pipeline.run(NOW, None).unwrap_err();
    assert!(matches!(err, HeatmapError::Resolution { .. }));
    // Only the current-window cluster was looked up
    assert_eq!(geocoder.calls(), 1);
    assert!(geocoder.seen.lock().unwrap()[0].0.latitude > 0.0);
}
