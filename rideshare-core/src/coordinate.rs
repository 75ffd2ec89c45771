//! Geographic coordinates and great-circle distance.

use geo::{Coord, Distance, HaversineMeasure, Point};

/// Mean Earth radius used by [`haversine_distance_km`].
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 latitude/longitude pair in decimal degrees.
///
/// Conversions to and from [`geo::Coord`] map longitude to `x` and latitude to
/// `y`, matching the convention used by the `geo` crate.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use rideshare_core::GeoCoordinate;
///
/// let campus = GeoCoordinate::new(49.2606, -123.2460);
/// let coord: Coord<f64> = campus.into();
/// assert_eq!(coord.x, -123.2460);
/// assert_eq!(GeoCoordinate::from(coord), campus);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoCoordinate {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl GeoCoordinate {
    /// Construct a coordinate from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<Coord<f64>> for GeoCoordinate {
    fn from(coord: Coord<f64>) -> Self {
        Self {
            lat: coord.y,
            lng: coord.x,
        }
    }
}

impl From<GeoCoordinate> for Coord<f64> {
    fn from(point: GeoCoordinate) -> Self {
        Self {
            x: point.lng,
            y: point.lat,
        }
    }
}

/// Great-circle distance in kilometres between two coordinates.
#[must_use]
pub fn haversine_distance_km(a: GeoCoordinate, b: GeoCoordinate) -> f64 {
    let measure = HaversineMeasure::new(EARTH_RADIUS_KM * 1000.0);
    measure.distance(Point::new(a.lng, a.lat), Point::new(b.lng, b.lat)) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn identical_points_are_zero_apart() {
        let p = GeoCoordinate::new(49.2606, -123.2460);
        assert!(haversine_distance_km(p, p).abs() < f64::EPSILON);
    }

    #[rstest]
    fn distance_is_symmetric() {
        let campus = GeoCoordinate::new(49.2606, -123.2460);
        let waterfront = GeoCoordinate::new(49.2856, -123.1116);
        let there = haversine_distance_km(campus, waterfront);
        let back = haversine_distance_km(waterfront, campus);
        assert!((there - back).abs() < 1e-9);
    }

    #[rstest]
    fn campus_to_waterfront_is_roughly_ten_kilometres() {
        let campus = GeoCoordinate::new(49.2606, -123.2460);
        let waterfront = GeoCoordinate::new(49.2856, -123.1116);
        let km = haversine_distance_km(campus, waterfront);
        assert!((9.5..10.5).contains(&km), "unexpected distance {km}");
    }

    #[rstest]
    #[case(GeoCoordinate::new(49.2606, -123.2460), GeoCoordinate::new(49.30, -123.10), 11.461_092_945_204_658)]
    #[case(GeoCoordinate::new(49.30, -123.10), GeoCoordinate::new(49.2606, -123.2460), 11.461_092_945_204_658)]
    fn campus_to_home_matches_mean_radius_great_circle(
        #[case] from: GeoCoordinate,
        #[case] to: GeoCoordinate,
        #[case] expected_km: f64,
    ) {
        let km = haversine_distance_km(from, to);
        assert!((km - expected_km).abs() < 1e-9, "unexpected distance {km}");
    }
}
