const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometres.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_identical_points() {
        assert!(haversine_km(6.5244, 3.3792, 6.5244, 3.3792) < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.19).abs() < 0.5, "got {d}");
    }

    #[test]
    fn lagos_to_ibadan_is_roughly_120_km() {
        let d = haversine_km(6.5244, 3.3792, 7.3775, 3.9470);
        assert!((110.0..135.0).contains(&d), "got {d}");
    }

    #[test]
    fn is_symmetric() {
        let a = haversine_km(6.5244, 3.3792, 9.0765, 7.3986);
        let b = haversine_km(9.0765, 7.3986, 6.5244, 3.3792);
        assert!((a - b).abs() < 1e-9);
    }
}
