use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const EARTH_RADIUS_KM: f64 = 6_371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateParseError {
    #[error("expected \"lat,lng\", got {0:?}")]
    Format(String),

    #[error("{field} is not a number: {raw:?}")]
    NotANumber { field: &'static str, raw: String },

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateParseError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateParseError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateParseError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }
}

/// Parses the `"lat,lng"` form used by booking forms, e.g. `"40.7128,-74.0060"`.
impl FromStr for GeoPoint {
    type Err = CoordinateParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = raw.split(',');
        let (Some(lat_raw), Some(lng_raw), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CoordinateParseError::Format(raw.to_string()));
        };

        let lat = parse_component("latitude", lat_raw)?;
        let lng = parse_component("longitude", lng_raw)?;
        GeoPoint::new(lat, lng)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

fn parse_component(field: &'static str, raw: &str) -> Result<f64, CoordinateParseError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| CoordinateParseError::NotANumber {
            field,
            raw: raw.to_string(),
        })?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoordinateParseError::NotANumber {
            field,
            raw: raw.to_string(),
        })
    }
}

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

#[cfg(test)]
mod tests {
    use super::{haversine_km, CoordinateParseError, GeoPoint};

    #[test]
    fn zero_distance_for_same_point() {
        let p: GeoPoint = "40.7128,-74.0060".parse().unwrap();
        let distance = haversine_km(&p, &p);
        assert!(distance < 1e-9);
    }

    #[test]
    fn lower_to_midtown_manhattan_is_around_6_3_km() {
        let pickup: GeoPoint = "40.7128,-74.0060".parse().unwrap();
        let dropoff: GeoPoint = "40.730610,-73.935242".parse().unwrap();
        let distance = haversine_km(&pickup, &dropoff);
        assert!((distance - 6.283).abs() < 0.01);
    }

    #[test]
    fn sphere_stays_within_half_a_percent_of_wgs84() {
        // WGS-84 lengths of one degree: meridian arc centred on 45N, and
        // along the equator.
        let cases = [
            ((44.5, 0.0), (45.5, 0.0), 111.132),
            ((0.0, 0.0), (0.0, 1.0), 111.319),
        ];
        for ((lat1, lng1), (lat2, lng2), ellipsoidal) in cases {
            let a = GeoPoint { lat: lat1, lng: lng1 };
            let b = GeoPoint { lat: lat2, lng: lng2 };
            let spherical = haversine_km(&a, &b);
            assert!((spherical - ellipsoidal).abs() / ellipsoidal < 0.005);
        }
    }

    #[test]
    fn parse_tolerates_whitespace_around_components() {
        let p: GeoPoint = " 51.5074 , -0.1278 ".parse().unwrap();
        assert_eq!(p, GeoPoint { lat: 51.5074, lng: -0.1278 });
    }

    #[test]
    fn parse_rejects_wrong_arity() {
        assert!(matches!(
            "40.7128".parse::<GeoPoint>(),
            Err(CoordinateParseError::Format(_))
        ));
        assert!(matches!(
            "1,2,3".parse::<GeoPoint>(),
            Err(CoordinateParseError::Format(_))
        ));
    }

    #[test]
    fn parse_rejects_non_numeric_and_out_of_range() {
        assert!(matches!(
            "north,-74.0".parse::<GeoPoint>(),
            Err(CoordinateParseError::NotANumber { field: "latitude", .. })
        ));
        assert!(matches!(
            "91.0,0.0".parse::<GeoPoint>(),
            Err(CoordinateParseError::LatitudeOutOfRange(_))
        ));
        assert!(matches!(
            "0.0,-180.5".parse::<GeoPoint>(),
            Err(CoordinateParseError::LongitudeOutOfRange(_))
        ));
    }
}
