use crate::models::Coordinate;

/// Mean Earth radius of the spherical model, in meters
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Half the circumference of the spherical model: the distance between antipodes
pub const MAX_SURFACE_DISTANCE_METERS: f64 = std::f64::consts::PI * EARTH_RADIUS_METERS;

/// Calculate the great-circle distance between two coordinates in meters.
///
/// Uses the haversine formula on a sphere of radius [`EARTH_RADIUS_METERS`].
/// The function is pure and symmetric. Range checking of the inputs is the
/// caller's job; see [`Coordinate::validate`].
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    // Rounding can push h a hair above 1 for antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lon, lat)
    }

    #[test]
    fn test_identical_points_are_zero() {
        let p = coord(41.0082, 28.9784);
        assert!(haversine_distance(p, p) < 1.0);
    }

    #[test]
    fn test_istanbul_to_ankara() {
        let istanbul = coord(41.0082, 28.9784);
        let ankara = coord(39.9334, 32.8597);

        let d = haversine_distance(istanbul, ankara);
        assert!((d - 351_000.0).abs() < 15_000.0, "got {d}");
    }

    #[test]
    fn test_antipodal_points() {
        let d = haversine_distance(coord(0.0, 0.0), coord(0.0, 180.0));
        assert!((d - 20_015_000.0).abs() < 100_000.0, "got {d}");
        assert!(d <= MAX_SURFACE_DISTANCE_METERS + 1e-6);
    }

    #[test]
    fn test_symmetric() {
        let a = coord(41.0, 29.0);
        let b = coord(41.01, 29.02);
        assert_eq!(haversine_distance(a, b), haversine_distance(b, a));
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // 2 * pi * R / 360
        let d = haversine_distance(coord(0.0, 0.0), coord(1.0, 0.0));
        assert!((d - 111_194.9).abs() < 1.0, "got {d}");
    }

    #[test]
    fn test_pole_to_pole() {
        let d = haversine_distance(coord(90.0, 0.0), coord(-90.0, 0.0));
        assert!((d - MAX_SURFACE_DISTANCE_METERS).abs() < 1.0);
    }
}
