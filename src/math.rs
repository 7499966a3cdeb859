//! Rotation helpers for the 3D globe view.
//!
//! Matrix operations for view rotation and drag-based input.

use nalgebra::{Matrix3, Vector3};

pub fn rotate_point_matrix(x: f64, y: f64, z: f64, rot: &Matrix3<f64>) -> (f64, f64, f64) {
    let v = rot * Vector3::new(x, y, z);
    (v.x, v.y, v.z)
}

pub fn rotation_from_drag(dx: f64, dy: f64) -> Matrix3<f64> {
    let rot_y = Matrix3::new(
        dx.cos(), 0.0, dx.sin(),
        0.0, 1.0, 0.0,
        -dx.sin(), 0.0, dx.cos(),
    );
    let rot_x = Matrix3::new(
        1.0, 0.0, 0.0,
        0.0, dy.cos(), -dy.sin(),
        0.0, dy.sin(), dy.cos(),
    );
    rot_x * rot_y
}

pub fn rotation_about_y(angle: f64) -> Matrix3<f64> {
    Matrix3::new(
        angle.cos(), 0.0, angle.sin(),
        0.0, 1.0, 0.0,
        -angle.sin(), 0.0, angle.cos(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_drag_is_identity() {
        let rot = rotation_from_drag(0.0, 0.0);
        let (x, y, z) = rotate_point_matrix(0.3, -0.7, 0.2, &rot);
        assert!((x - 0.3).abs() < 1e-12);
        assert!((y + 0.7).abs() < 1e-12);
        assert!((z - 0.2).abs() < 1e-12);
    }

    #[test]
    fn y_rotation_preserves_height() {
        let rot = rotation_about_y(1.3);
        let (_, y, _) = rotate_point_matrix(1.0, 0.5, 0.0, &rot);
        assert!((y - 0.5).abs() < 1e-12);
    }
}
