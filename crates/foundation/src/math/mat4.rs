//! 4×4 matrices.
//!
//! Convention (fixed for the whole workspace):
//! - Column-major storage: `cols[c][r]` is the element in row `r`, column `c`,
//!   which is the layout WGSL/GLSL uniforms expect.
//! - Column vectors: `m * v`, so `a.mul(b)` applies `b` first.
//! - Right-handed view space looking down `-Z`, clip depth in `[0, 1]`.

use serde::{Deserialize, Serialize};

use super::Vec3;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mat4 {
    pub cols: [[f64; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const fn from_cols(cols: [[f64; 4]; 4]) -> Self {
        Self { cols }
    }

    /// Element at (`row`, `col`).
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.cols[col][row]
    }

    pub fn to_cols_array(&self) -> [f64; 16] {
        let mut out = [0.0; 16];
        for (c, col) in self.cols.iter().enumerate() {
            out[c * 4..c * 4 + 4].copy_from_slice(col);
        }
        out
    }

    /// Column-major `f32` copy for GPU upload.
    pub fn to_f32_cols(&self) -> [[f32; 4]; 4] {
        let mut out = [[0.0f32; 4]; 4];
        for (c, col) in self.cols.iter().enumerate() {
            for (r, v) in col.iter().enumerate() {
                out[c][r] = *v as f32;
            }
        }
        out
    }

    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }

    /// `self * rhs`.
    pub fn mul(&self, rhs: &Mat4) -> Mat4 {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut c = [[0.0f64; 4]; 4];
        for col in 0..4 {
            for row in 0..4 {
                c[col][row] = a[0][row] * b[col][0]
                    + a[1][row] * b[col][1]
                    + a[2][row] * b[col][2]
                    + a[3][row] * b[col][3];
            }
        }
        Mat4 { cols: c }
    }

    pub fn transform_vec4(&self, v: [f64; 4]) -> [f64; 4] {
        let m = &self.cols;
        let mut out = [0.0; 4];
        for (row, o) in out.iter_mut().enumerate() {
            *o = m[0][row] * v[0] + m[1][row] * v[1] + m[2][row] * v[2] + m[3][row] * v[3];
        }
        out
    }

    /// Transform a point (w = 1) and divide by the resulting w.
    ///
    /// Returns `None` when the point lands on the w = 0 plane.
    pub fn transform_point(&self, p: Vec3) -> Option<Vec3> {
        let [x, y, z, w] = self.transform_vec4([p.x, p.y, p.z, 1.0]);
        if w == 0.0 || !w.is_finite() {
            return None;
        }
        Some(Vec3::new(x / w, y / w, z / w))
    }

    pub fn determinant(&self) -> f64 {
        let b = self.minors();
        b[0] * b[11] - b[1] * b[10] + b[2] * b[9] + b[3] * b[8] - b[4] * b[7] + b[5] * b[6]
    }

    /// 2×2 sub-determinants shared by `determinant` and `inverse`.
    fn minors(&self) -> [f64; 12] {
        let [
            [a00, a01, a02, a03],
            [a10, a11, a12, a13],
            [a20, a21, a22, a23],
            [a30, a31, a32, a33],
        ] = self.cols;
        [
            a00 * a11 - a01 * a10,
            a00 * a12 - a02 * a10,
            a00 * a13 - a03 * a10,
            a01 * a12 - a02 * a11,
            a01 * a13 - a03 * a11,
            a02 * a13 - a03 * a12,
            a20 * a31 - a21 * a30,
            a20 * a32 - a22 * a30,
            a20 * a33 - a23 * a30,
            a21 * a32 - a22 * a31,
            a21 * a33 - a23 * a31,
            a22 * a33 - a23 * a32,
        ]
    }

    /// General inverse via cofactor expansion.
    ///
    /// Returns `None` for singular or non-finite matrices.
    pub fn inverse(&self) -> Option<Mat4> {
        if !self.is_finite() {
            return None;
        }
        let [
            [a00, a01, a02, a03],
            [a10, a11, a12, a13],
            [a20, a21, a22, a23],
            [a30, a31, a32, a33],
        ] = self.cols;
        let [b00, b01, b02, b03, b04, b05, b06, b07, b08, b09, b10, b11] = self.minors();

        let det = b00 * b11 - b01 * b10 + b02 * b09 + b03 * b08 - b04 * b07 + b05 * b06;
        if det.abs() < f64::MIN_POSITIVE || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;

        let out = Mat4::from_cols([
            [
                (a11 * b11 - a12 * b10 + a13 * b09) * inv,
                (a02 * b10 - a01 * b11 - a03 * b09) * inv,
                (a31 * b05 - a32 * b04 + a33 * b03) * inv,
                (a22 * b04 - a21 * b05 - a23 * b03) * inv,
            ],
            [
                (a12 * b08 - a10 * b11 - a13 * b07) * inv,
                (a00 * b11 - a02 * b08 + a03 * b07) * inv,
                (a32 * b02 - a30 * b05 - a33 * b01) * inv,
                (a20 * b05 - a22 * b02 + a23 * b01) * inv,
            ],
            [
                (a10 * b10 - a11 * b08 + a13 * b06) * inv,
                (a01 * b08 - a00 * b10 - a03 * b06) * inv,
                (a30 * b04 - a31 * b02 + a33 * b00) * inv,
                (a21 * b02 - a20 * b04 - a23 * b00) * inv,
            ],
            [
                (a11 * b07 - a10 * b09 - a12 * b06) * inv,
                (a00 * b09 - a01 * b07 + a02 * b06) * inv,
                (a31 * b01 - a30 * b03 - a32 * b00) * inv,
                (a20 * b03 - a21 * b01 + a22 * b00) * inv,
            ],
        ]);
        out.is_finite().then_some(out)
    }

    /// Right-handed view matrix looking from `eye` along `dir`.
    ///
    /// Returns `None` when `dir` is zero or parallel to `up`.
    pub fn look_to_rh(eye: Vec3, dir: Vec3, up: Vec3) -> Option<Mat4> {
        let f = dir.normalize()?;
        let s = f.cross(up).normalize()?;
        let u = s.cross(f);

        Some(Mat4::from_cols([
            [s.x, u.x, -f.x, 0.0],
            [s.y, u.y, -f.y, 0.0],
            [s.z, u.z, -f.z, 0.0],
            [-s.dot(eye), -u.dot(eye), f.dot(eye), 1.0],
        ]))
    }

    pub fn look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> Option<Mat4> {
        Self::look_to_rh(eye, target - eye, up)
    }

    /// Right-handed perspective projection with depth range `[0, 1]`.
    pub fn perspective_rh_z0(fov_y_rad: f64, aspect: f64, near: f64, far: f64) -> Mat4 {
        let f = 1.0 / (0.5 * fov_y_rad).tan();
        let m22 = far / (near - far);
        let m23 = (near * far) / (near - far);

        Mat4::from_cols([
            [f / aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, m22, -1.0],
            [0.0, 0.0, m23, 0.0],
        ])
    }

    /// Right-handed orthographic projection with depth range `[0, 1]`.
    pub fn orthographic_rh_z0(
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near: f64,
        far: f64,
    ) -> Mat4 {
        let rw = 1.0 / (right - left);
        let rh = 1.0 / (top - bottom);
        let rd = 1.0 / (far - near);

        Mat4::from_cols([
            [2.0 * rw, 0.0, 0.0, 0.0],
            [0.0, 2.0 * rh, 0.0, 0.0],
            [0.0, 0.0, -rd, 0.0],
            [-(right + left) * rw, -(top + bottom) * rh, -near * rd, 1.0],
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::Mat4;
    use crate::math::Vec3;

    fn assert_mat_close(a: &Mat4, b: &Mat4, eps: f64) {
        for c in 0..4 {
            for r in 0..4 {
                let diff = (a.at(r, c) - b.at(r, c)).abs();
                assert!(diff <= eps, "element ({r},{c}): {a:?} vs {b:?}");
            }
        }
    }

    fn assert_vec_close(a: Vec3, b: Vec3, eps: f64) {
        let d = (a - b).length();
        assert!(d <= eps, "expected {a:?} ~= {b:?} (diff {d})");
    }

    #[test]
    fn identity_is_neutral() {
        let m = Mat4::perspective_rh_z0(1.0, 1.5, 0.1, 100.0);
        assert_eq!(m.mul(&Mat4::IDENTITY), m);
        assert_eq!(Mat4::IDENTITY.mul(&m), m);
    }

    #[test]
    fn inverse_of_look_at_recovers_identity() {
        let view = Mat4::look_at_rh(
            Vec3::new(3.0, -4.0, 5.0),
            Vec3::new(0.5, 1.0, 0.0),
            Vec3::Z,
        )
        .expect("view");
        let inv = view.inverse().expect("invertible");
        assert_mat_close(&view.mul(&inv), &Mat4::IDENTITY, 1e-12);
        assert_mat_close(&inv.mul(&view), &Mat4::IDENTITY, 1e-12);
    }

    #[test]
    fn look_at_maps_eye_to_origin_and_target_down_negative_z() {
        let eye = Vec3::new(1.0, 2.0, 10.0);
        let view = Mat4::look_at_rh(eye, Vec3::new(1.0, 2.0, 0.0), Vec3::Y).expect("view");
        assert_vec_close(view.transform_point(eye).expect("w"), Vec3::ZERO, 1e-12);
        let t = view
            .transform_point(Vec3::new(1.0, 2.0, 0.0))
            .expect("w");
        assert_vec_close(t, Vec3::new(0.0, 0.0, -10.0), 1e-12);
    }

    #[test]
    fn look_at_rejects_parallel_up() {
        assert!(Mat4::look_at_rh(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Z).is_none());
        assert!(Mat4::look_at_rh(Vec3::ZERO, Vec3::ZERO, Vec3::Z).is_none());
    }

    #[test]
    fn perspective_maps_near_and_far_to_unit_depth() {
        let p = Mat4::perspective_rh_z0(60f64.to_radians(), 2.0, 1.0, 50.0);
        let near = p.transform_point(Vec3::new(0.0, 0.0, -1.0)).expect("w");
        let far = p.transform_point(Vec3::new(0.0, 0.0, -50.0)).expect("w");
        assert!((near.z - 0.0).abs() < 1e-12);
        assert!((far.z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn orthographic_maps_box_to_clip_cube() {
        let o = Mat4::orthographic_rh_z0(-2.0, 6.0, -1.0, 3.0, 0.5, 10.5);
        let lo = o.transform_point(Vec3::new(-2.0, -1.0, -0.5)).expect("w");
        let hi = o.transform_point(Vec3::new(6.0, 3.0, -10.5)).expect("w");
        assert_vec_close(lo, Vec3::new(-1.0, -1.0, 0.0), 1e-12);
        assert_vec_close(hi, Vec3::new(1.0, 1.0, 1.0), 1e-12);
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let mut m = Mat4::IDENTITY;
        m.cols[2] = [0.0; 4];
        assert_eq!(m.determinant(), 0.0);
        assert!(m.inverse().is_none());

        let mut nan = Mat4::IDENTITY;
        nan.cols[0][0] = f64::NAN;
        assert!(nan.inverse().is_none());
    }

    #[test]
    fn determinant_of_scale() {
        let mut m = Mat4::IDENTITY;
        m.cols[0][0] = 2.0;
        m.cols[1][1] = 3.0;
        m.cols[2][2] = 4.0;
        assert_eq!(m.determinant(), 24.0);
    }
}
