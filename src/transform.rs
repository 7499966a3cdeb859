//! Geodetic and orbital coordinate transforms.
//!
//! Pure functions mapping geodetic coordinates and TEME propagation output
//! into scene space, where the Earth radius is one unit. Deterministic:
//! identical inputs always produce identical output.

use nalgebra::Vector3;
use std::f64::consts::PI;

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const KM_TO_UNITS: f64 = 1.0 / EARTH_RADIUS_KM;

/// Geodetic (radians, km above the sphere) to scene space, y-axis up.
/// `(0, 0, 0)` lands on the reference axis at exactly one Earth radius.
pub fn geodetic_to_scene(lat: f64, lon: f64, height_km: f64) -> Vector3<f64> {
    let r = (EARTH_RADIUS_KM + height_km) * KM_TO_UNITS;
    Vector3::new(
        r * lat.cos() * lon.cos(),
        r * lat.sin(),
        r * lat.cos() * lon.sin(),
    )
}

/// Compressed altitude scale used for point sets that do not come from
/// propagation (density samples, the inclination ring). 1000 km maps to
/// 1.6 Earth radii so the LEO shell stays readable next to the globe.
pub fn altitude_scale(alt_km: f64) -> f64 {
    1.0 + (alt_km / 1000.0) * 0.6
}

/// Degree-addressed variant of [`geodetic_to_scene`] on the compressed
/// altitude scale.
pub fn grid_to_scene(lat_deg: f64, lon_deg: f64, alt_km: f64) -> Vector3<f64> {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let r = altitude_scale(alt_km);
    Vector3::new(
        r * lat.cos() * lon.cos(),
        r * lat.sin(),
        r * lat.cos() * lon.sin(),
    )
}

/// Spherical TEME-to-geodetic conversion: `(lat, lon, height_km)` with both
/// angles in radians and longitude rotated into the Earth-fixed frame by the
/// sidereal angle.
pub fn teme_to_geodetic(position_km: [f64; 3], gmst: f64) -> (f64, f64, f64) {
    let [x, y, z] = position_km;
    let r = (x * x + y * y + z * z).sqrt();
    let lat = (z / r).asin();
    let mut lon = y.atan2(x) - gmst;
    while lon < -PI {
        lon += 2.0 * PI;
    }
    while lon > PI {
        lon -= 2.0 * PI;
    }
    (lat, lon, r - EARTH_RADIUS_KM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_maps_to_reference_axis() {
        let p = geodetic_to_scene(0.0, 0.0, 0.0);
        assert_eq!(p.x, 1.0);
        assert_eq!(p.y, 0.0);
        assert_eq!(p.z, 0.0);
    }

    #[test]
    fn transform_is_bit_identical() {
        let a = geodetic_to_scene(0.7, -1.9, 420.0);
        let b = geodetic_to_scene(0.7, -1.9, 420.0);
        assert_eq!(a.x.to_bits(), b.x.to_bits());
        assert_eq!(a.y.to_bits(), b.y.to_bits());
        assert_eq!(a.z.to_bits(), b.z.to_bits());
    }

    #[test]
    fn pole_has_no_horizontal_component() {
        let p = geodetic_to_scene(std::f64::consts::FRAC_PI_2, 0.3, 0.0);
        assert!(p.x.abs() < 1e-12);
        assert!(p.z.abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn grid_scale_matches_formula() {
        assert_eq!(altitude_scale(0.0), 1.0);
        assert_eq!(altitude_scale(1000.0), 1.6);
        let p = grid_to_scene(0.0, 0.0, 500.0);
        assert!((p.x - 1.3).abs() < 1e-12);
    }

    #[test]
    fn teme_longitude_rotates_with_gmst() {
        // A point on the TEME x-axis sits at longitude -gmst in the
        // Earth-fixed frame.
        let (lat, lon, height) = teme_to_geodetic([7000.0, 0.0, 0.0], 0.5);
        assert!(lat.abs() < 1e-12);
        assert!((lon + 0.5).abs() < 1e-12);
        assert!((height - (7000.0 - EARTH_RADIUS_KM)).abs() < 1e-9);
    }

    #[test]
    fn teme_longitude_is_wrapped() {
        let (_, lon, _) = teme_to_geodetic([-7000.0, 0.0, 0.0], -3.0);
        assert!((-PI..=PI).contains(&lon));
    }
}
