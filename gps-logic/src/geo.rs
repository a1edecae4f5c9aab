use crate::reading::Reading;

/// Mean earth radius used for great-circle distances
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance in meters between two points given in degrees
pub fn haversine_distance(lat1: f64, long1: f64, lat2: f64, long2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (long2 - long1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Total length in meters of the path through `readings`, in order
pub fn path_distance(readings: &[Reading]) -> f64 {
    readings
        .windows(2)
        .map(|w| haversine_distance(w[0].latitude, w[0].longitude, w[1].latitude, w[1].longitude))
        .sum()
}

/// Average speed in m/s travelling from `from` to `to`.
/// `None` when no time (or negative time) elapsed between the two.
pub fn derive_speed(from: &Reading, to: &Reading) -> Option<f64> {
    let elapsed_ms = to.timestamp_millis.checked_sub(from.timestamp_millis)?;
    if elapsed_ms <= 0 {
        return None;
    }

    let distance = haversine_distance(from.latitude, from.longitude, to.latitude, to.longitude);
    let speed = distance / (elapsed_ms as f64 / 1000.0);

    speed.is_finite().then_some(speed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(latitude: f64, longitude: f64, timestamp_millis: i64) -> Reading {
        Reading {
            latitude,
            longitude,
            timestamp_millis,
            speed: None,
        }
    }

    #[test]
    fn test_same_point() {
        assert_eq!(haversine_distance(42.5, -71.3, 42.5, -71.3), 0.0);
    }

    #[test]
    fn test_one_degree_longitude_at_equator() {
        let d = haversine_distance(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111_195.0).abs() < 1.0, "Distance was {d}");
    }

    #[test]
    fn test_symmetric() {
        let a = haversine_distance(51.5, -0.12, 48.85, 2.35);
        let b = haversine_distance(48.85, 2.35, 51.5, -0.12);
        assert!((a - b).abs() < 1e-6);
        // London -> Paris is roughly 343km
        assert!((a - 343_000.0).abs() < 2_000.0, "Distance was {a}");
    }

    #[test]
    fn test_speed_one_second() {
        let speed = derive_speed(&reading(0.0, 0.0, 0), &reading(0.0, 1.0, 1000)).unwrap();
        assert!((speed - 111_195.0).abs() < 1.0, "Speed was {speed}");
    }

    #[test]
    fn test_speed_no_elapsed_time() {
        assert_eq!(
            derive_speed(&reading(0.0, 0.0, 500), &reading(0.0, 1.0, 500)),
            None
        );
        assert_eq!(
            derive_speed(&reading(0.0, 0.0, 1000), &reading(0.0, 1.0, 500)),
            None
        );
    }

    #[test]
    fn test_stationary_speed_is_zero() {
        assert_eq!(
            derive_speed(&reading(10.0, 10.0, 0), &reading(10.0, 10.0, 2000)),
            Some(0.0)
        );
    }
}
