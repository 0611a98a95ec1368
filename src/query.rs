//! Validation of the inbound `lat` / `long` query parameters.

use crate::error::{HeatmapError, OptionExt, Result};
use crate::Coordinate;

/// Parse one numeric coordinate parameter.
pub fn parse_coordinate_param(field: &str, raw: &str) -> Result<f64> {
    let value = raw
        .trim()
        .parse::<f64>()
        .ok()
        .ok_or_validation(field, raw, "not a number")?;

    if !value.is_finite() {
        return Err(HeatmapError::validation(field, raw, "must be finite"));
    }
    Ok(value)
}

/// Parse the optional query origin.
///
/// Both parameters absent (or empty) means no origin. Supplying only one of
/// them, a non-numeric value or an out-of-range value is a validation error.
/// `(0, 0)` is treated as "no origin", see [`Coordinate::origin_or_unset`].
pub fn parse_origin(lat: Option<&str>, long: Option<&str>) -> Result<Option<Coordinate>> {
    let lat = lat.filter(|s| !s.trim().is_empty());
    let long = long.filter(|s| !s.trim().is_empty());

    let (lat_raw, long_raw) = match (lat, long) {
        (None, None) => return Ok(None),
        (Some(lat), Some(long)) => (lat, long),
        (Some(_), None) => {
            return Err(HeatmapError::validation(
                "long",
                "",
                "required when lat is given",
            ))
        }
        (None, Some(_)) => {
            return Err(HeatmapError::validation(
                "lat",
                "",
                "required when long is given",
            ))
        }
    };

    let latitude = parse_coordinate_param("lat", lat_raw)?;
    let longitude = parse_coordinate_param("long", long_raw)?;

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(HeatmapError::validation(
            "lat",
            lat_raw,
            "must be within [-90, 90]",
        ));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(HeatmapError::validation(
            "long",
            long_raw,
            "must be within [-180, 180]",
        ));
    }

    Ok(Coordinate::origin_or_unset(latitude, longitude))
}
