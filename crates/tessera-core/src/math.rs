//! Pivot-aware transform composition and decomposition.
//!
//! All matrices are column-major and act on column vectors (glam convention),
//! so the point-order pipeline
//!
//! ```text
//! Sp^-1, S, Sh, Sp, Spt, Rp^-1, R, Rp, Rpt, T, Tp
//! ```
//!
//! is written right-to-left as `Tp * T * Rpt * Rp * R * Rp^-1 * Spt * Sp * Sh * S * Sp^-1`.

use crate::types::Shear;
use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

const EPSILON: f32 = 1.0e-6;

/// Local transform components of a pivot-aware transform node
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PivotComponents {
    pub scale: Vec3,
    pub shear: Shear,
    /// Euler angles in radians, XYZ order
    pub rotate: Vec3,
    pub translate: Vec3,
    pub scale_pivot: Vec3,
    pub scale_pivot_translate: Vec3,
    pub rotate_pivot: Vec3,
    pub rotate_pivot_translate: Vec3,
    pub translate_pivot: Vec3,
}

impl Default for PivotComponents {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl PivotComponents {
    pub const IDENTITY: Self = Self {
        scale: Vec3::ONE,
        shear: Shear::IDENTITY,
        rotate: Vec3::ZERO,
        translate: Vec3::ZERO,
        scale_pivot: Vec3::ZERO,
        scale_pivot_translate: Vec3::ZERO,
        rotate_pivot: Vec3::ZERO,
        rotate_pivot_translate: Vec3::ZERO,
        translate_pivot: Vec3::ZERO,
    };

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotate(mut self, rotate: Vec3) -> Self {
        self.rotate = rotate;
        self
    }

    pub fn with_translate(mut self, translate: Vec3) -> Self {
        self.translate = translate;
        self
    }

    pub fn with_shear(mut self, shear: Shear) -> Self {
        self.shear = shear;
        self
    }

    pub fn with_pivots(mut self, scale_pivot: Vec3, rotate_pivot: Vec3, translate_pivot: Vec3) -> Self {
        self.scale_pivot = scale_pivot;
        self.rotate_pivot = rotate_pivot;
        self.translate_pivot = translate_pivot;
        self
    }

    /// `Spt * Sp * Sh * S * Sp^-1`
    pub fn scale_component(&self) -> Mat4 {
        Mat4::from_translation(self.scale_pivot_translate)
            * Mat4::from_translation(self.scale_pivot)
            * self.shear.to_mat4()
            * Mat4::from_scale(self.scale)
            * Mat4::from_translation(-self.scale_pivot)
    }

    /// `Rpt * Rp * R * Rp^-1`
    pub fn rotate_component(&self) -> Mat4 {
        Mat4::from_translation(self.rotate_pivot_translate)
            * Mat4::from_translation(self.rotate_pivot)
            * Mat4::from_mat3(rotation_matrix(self.rotate))
            * Mat4::from_translation(-self.rotate_pivot)
    }

    /// `Tp * T`
    pub fn translate_component(&self) -> Mat4 {
        Mat4::from_translation(self.translate_pivot) * Mat4::from_translation(self.translate)
    }

    /// Full object transform in the fixed pivot order
    pub fn compose(&self) -> Mat4 {
        self.translate_component() * self.rotate_component() * self.scale_component()
    }

    /// Solve `m` back into components, keeping the current pivots fixed.
    ///
    /// The pivot-translate compensators are reset to zero; rotation, shear,
    /// scale and translation absorb the whole matrix.
    pub fn decompose_fixed_pivots(&self, m: &Mat4) -> Self {
        let linear = Mat3::from_mat4(*m);
        let (rotation, scale, shear) = qr_decompose(&linear);

        let sp = self.scale_pivot;
        let rp = self.rotate_pivot;
        let tp = self.translate_pivot;
        let translate = m.transform_point3(sp) - rotation * (sp - rp) - rp - tp;

        Self {
            scale,
            shear,
            rotate: euler_from_matrix(&rotation),
            translate,
            scale_pivot: sp,
            scale_pivot_translate: Vec3::ZERO,
            rotate_pivot: rp,
            rotate_pivot_translate: Vec3::ZERO,
            translate_pivot: tp,
        }
    }

    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.compose().abs_diff_eq(other.compose(), epsilon)
    }
}

/// Rotation matrix for XYZ Euler angles in radians
pub fn rotation_matrix(euler: Vec3) -> Mat3 {
    Mat3::from_quat(Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z))
}

/// XYZ Euler angles for a pure rotation matrix
pub fn euler_from_matrix(rotation: &Mat3) -> Vec3 {
    let (x, y, z) = Quat::from_mat3(rotation).normalize().to_euler(EulerRot::XYZ);
    Vec3::new(x, y, z)
}

/// Split `linear` into `R * Sh * S` with R a proper rotation, using
/// Gram-Schmidt over the columns.
fn qr_decompose(linear: &Mat3) -> (Mat3, Vec3, Shear) {
    let c0 = linear.x_axis;
    let c1 = linear.y_axis;
    let c2 = linear.z_axis;

    let mut u00 = c0.length();
    let mut q0 = if u00 > EPSILON { c0 / u00 } else { Vec3::X };

    let mut u01 = q0.dot(c1);
    let r1 = c1 - q0 * u01;
    let u11 = r1.length();
    let q1 = if u11 > EPSILON {
        r1 / u11
    } else {
        q0.any_orthonormal_vector()
    };

    let mut u02 = q0.dot(c2);
    let u12 = q1.dot(c2);
    let r2 = c2 - q0 * u02 - q1 * u12;
    let u22 = r2.length();
    let q2 = if u22 > EPSILON { r2 / u22 } else { q0.cross(q1) };

    // Reflection: move the sign into the x scale so R stays a rotation.
    if q0.dot(q1.cross(q2)) < 0.0 {
        q0 = -q0;
        u00 = -u00;
        u01 = -u01;
        u02 = -u02;
    }

    let scale = Vec3::new(u00, u11, u22);
    let shear = Shear::new(
        if u11.abs() > EPSILON { u01 / u11 } else { 0.0 },
        if u22.abs() > EPSILON { u02 / u22 } else { 0.0 },
        if u22.abs() > EPSILON { u12 / u22 } else { 0.0 },
    );

    (Mat3::from_cols(q0, q1, q2), scale, shear)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PivotComponents {
        PivotComponents::IDENTITY
            .with_scale(Vec3::new(2.0, 0.5, 1.5))
            .with_shear(Shear::new(0.25, -0.1, 0.3))
            .with_rotate(Vec3::new(0.3, -0.7, 1.1))
            .with_translate(Vec3::new(4.0, -2.0, 7.0))
            .with_pivots(
                Vec3::new(1.0, 2.0, 3.0),
                Vec3::new(-1.0, 0.5, 0.0),
                Vec3::new(0.0, 0.0, 2.0),
            )
    }

    #[test]
    fn test_identity_composes_to_identity() {
        assert!(PivotComponents::IDENTITY
            .compose()
            .abs_diff_eq(Mat4::IDENTITY, 0.0001));
    }

    #[test]
    fn test_scale_about_pivot_keeps_pivot_fixed() {
        let c = PivotComponents::IDENTITY
            .with_scale(Vec3::splat(3.0))
            .with_pivots(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, Vec3::ZERO);
        let m = c.compose();
        let p = m.transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(1.0, 0.0, 0.0)).length() < 0.001);
        let q = m.transform_point3(Vec3::new(2.0, 0.0, 0.0));
        assert!((q.x - 4.0).abs() < 0.001);
    }

    #[test]
    fn test_rotate_about_pivot() {
        let c = PivotComponents::IDENTITY
            .with_rotate(Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2))
            .with_pivots(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO);
        let p = c.compose().transform_point3(Vec3::new(2.0, 0.0, 0.0));
        assert!((p - Vec3::new(1.0, 1.0, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_shear_applies_after_scale() {
        let c = PivotComponents::IDENTITY
            .with_scale(Vec3::new(1.0, 2.0, 1.0))
            .with_shear(Shear::new(1.0, 0.0, 0.0));
        let p = c.compose().transform_point3(Vec3::new(0.0, 1.0, 0.0));
        // scale first: y = 2, then shear: x += 1 * 2
        assert!((p - Vec3::new(2.0, 2.0, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_decompose_round_trip() {
        let c = sample();
        let m = c.compose();
        let solved = c.decompose_fixed_pivots(&m);
        assert!(solved.compose().abs_diff_eq(m, 0.001));
        assert!((solved.scale - c.scale).length() < 0.001);
        assert!((solved.shear.xy - 0.25).abs() < 0.001);
        assert_eq!(solved.scale_pivot, c.scale_pivot);
        assert_eq!(solved.rotate_pivot_translate, Vec3::ZERO);
    }

    #[test]
    fn test_decompose_with_compensators_round_trip() {
        let mut c = sample();
        c.scale_pivot_translate = Vec3::new(0.5, 0.5, 0.0);
        c.rotate_pivot_translate = Vec3::new(0.0, -1.0, 0.25);
        let m = c.compose();
        let solved = c.decompose_fixed_pivots(&m);
        assert!(solved.compose().abs_diff_eq(m, 0.001));
    }

    #[test]
    fn test_decompose_negative_scale() {
        let m = Mat4::from_scale(Vec3::new(-2.0, 1.0, 1.0));
        let solved = PivotComponents::IDENTITY.decompose_fixed_pivots(&m);
        assert!(solved.compose().abs_diff_eq(m, 0.001));
        assert!(solved.scale.x < 0.0);
    }

    #[test]
    fn test_decompose_pure_translation() {
        let m = Mat4::from_translation(Vec3::new(3.0, 4.0, 5.0));
        let solved = PivotComponents::IDENTITY.decompose_fixed_pivots(&m);
        assert!((solved.translate - Vec3::new(3.0, 4.0, 5.0)).length() < 0.001);
        assert!((solved.scale - Vec3::ONE).length() < 0.001);
        assert!(solved.rotate.length() < 0.001);
    }

    #[test]
    fn test_euler_round_trip() {
        let euler = Vec3::new(0.2, 0.4, -0.6);
        let back = euler_from_matrix(&rotation_matrix(euler));
        assert!((back - euler).length() < 0.001);
    }
}
