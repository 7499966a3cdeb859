//! Sidereal time calculation.
//!
//! Greenwich Mean Sidereal Time is needed to rotate TEME propagation output
//! into Earth-fixed longitude before the geodetic-to-scene transform.

use chrono::{DateTime, Utc};

pub const SECONDS_PER_DAY: f64 = 86400.0;
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36525.0;
pub const GMST_BASE_DEG: f64 = 280.46061837;
pub const GMST_ROTATION_PER_DAY: f64 = 360.98564736629;
pub const GMST_CORRECTION: f64 = 0.000387933;

pub fn greenwich_mean_sidereal_time(timestamp: DateTime<Utc>) -> f64 {
    let j2000 = DateTime::parse_from_rfc3339("2000-01-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    let days_since_j2000 =
        (timestamp - j2000).num_milliseconds() as f64 / (1000.0 * SECONDS_PER_DAY);
    let centuries = days_since_j2000 / DAYS_PER_JULIAN_CENTURY;
    let gmst_degrees = GMST_BASE_DEG
        + GMST_ROTATION_PER_DAY * days_since_j2000
        + GMST_CORRECTION * centuries * centuries
        - centuries * centuries * centuries / 38710000.0;
    let gmst_normalized = gmst_degrees.rem_euclid(360.0);
    gmst_normalized.to_radians()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn gmst_is_normalized() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let gmst = greenwich_mean_sidereal_time(t);
        assert!((0.0..2.0 * std::f64::consts::PI).contains(&gmst));
    }

    #[test]
    fn gmst_at_j2000_epoch_matches_base_angle() {
        let j2000 = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        let gmst = greenwich_mean_sidereal_time(j2000);
        assert!((gmst - GMST_BASE_DEG.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn gmst_is_deterministic() {
        let t = Utc.with_ymd_and_hms(2025, 6, 15, 3, 30, 0).unwrap();
        assert_eq!(
            greenwich_mean_sidereal_time(t).to_bits(),
            greenwich_mean_sidereal_time(t).to_bits()
        );
    }
}
