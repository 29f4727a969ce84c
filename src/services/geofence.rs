//! Great-circle distance and the capture radius check.

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in meters between two points given in degrees.
///
/// Coordinates are not range-checked; out-of-range input yields a
/// meaningless but finite distance.
pub fn distance_meters(lat_a: f64, lng_a: f64, lat_b: f64, lng_b: f64) -> f64 {
    let lat_a = lat_a.to_radians();
    let lat_b = lat_b.to_radians();
    let d_lat = lat_b - lat_a;
    let d_lng = lng_b.to_radians() - lng_a.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c * 1000.0
}

/// The radius is inclusive.
pub fn is_within_radius(distance: f64, radius_meters: f64) -> bool {
    distance <= radius_meters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coincident_points_are_zero_apart() {
        assert_eq!(distance_meters(0.0, 0.0, 0.0, 0.0), 0.0);
        assert_eq!(distance_meters(44.97, -93.23, 44.97, -93.23), 0.0);
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = distance_meters(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_195.0).abs() <= 50.0, "got {}", d);
    }

    #[test]
    fn distance_is_symmetric() {
        let points = [
            (44.9740, -93.2277, 44.9727, -93.2354),
            (-33.8568, 151.2153, 51.5007, -0.1246),
            (0.0, 179.9, 0.0, -179.9),
        ];
        for (lat_a, lng_a, lat_b, lng_b) in points {
            assert_eq!(
                distance_meters(lat_a, lng_a, lat_b, lng_b),
                distance_meters(lat_b, lng_b, lat_a, lng_a)
            );
        }
    }

    #[test]
    fn antimeridian_neighbours_are_close() {
        let d = distance_meters(0.0, 179.9999, 0.0, -179.9999);
        assert!(d < 30.0, "got {}", d);
    }

    #[test]
    fn radius_boundary_is_inclusive() {
        assert!(is_within_radius(15.0, 15.0));
        assert!(!is_within_radius(16.0, 15.0));
        assert!(is_within_radius(0.0, 5.0));
    }

    #[test]
    fn malformed_coordinates_still_produce_a_distance() {
        let d = distance_meters(123.0, 400.0, -95.0, 0.0);
        assert!(d.is_finite());
        assert!(d >= 0.0);
    }
}
