//! Projection strategy: projection mode + parameters → projection matrix.

use foundation::math::Mat4;

use crate::descriptor::{ProjectionMode, ProjectionParams};
use crate::error::ConfigurationError;

/// A matrix paired with its verified inverse.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Invertible {
    pub matrix: Mat4,
    pub inverse: Mat4,
}

impl Invertible {
    /// Verifies `matrix` is finite and invertible; `what` names it in errors.
    pub fn new(matrix: Mat4, what: &'static str) -> Result<Self, ConfigurationError> {
        let inverse = matrix
            .inverse()
            .ok_or(ConfigurationError::NonInvertibleMatrix { matrix: what })?;
        Ok(Self { matrix, inverse })
    }
}

/// Builds the projection for `mode`.
///
/// `aspect` is width / height of the viewport; `distance` is the focal
/// distance produced by the view-state resolver. Perspective and orthographic
/// `near`/`far` are multiples of `distance`; explicit-ortho bounds are used
/// verbatim; external matrices pass through.
pub fn build_projection_matrix(
    mode: ProjectionMode,
    params: &ProjectionParams,
    aspect: f64,
    distance: f64,
) -> Result<Invertible, ConfigurationError> {
    let matrix = match mode {
        ProjectionMode::Perspective => {
            let fovy = fovy_rad(mode, params)?;
            let (near, far) = clip_range(mode, params)?;
            if near <= 0.0 {
                return Err(ConfigurationError::InvalidProjectionParam {
                    param: "near",
                    value: near,
                    reason: "must be positive for a perspective projection",
                });
            }
            Mat4::perspective_rh_z0(fovy, aspect, near * distance, far * distance)
        }
        ProjectionMode::Orthographic => {
            let fovy = fovy_rad(mode, params)?;
            let (near, far) = clip_range(mode, params)?;
            let half_h = distance * (0.5 * fovy).tan();
            let half_w = half_h * aspect;
            Mat4::orthographic_rh_z0(
                -half_w,
                half_w,
                -half_h,
                half_h,
                near * distance,
                far * distance,
            )
        }
        ProjectionMode::ExplicitOrtho => {
            let left = require(mode, "left", params.left)?;
            let right = require(mode, "right", params.right)?;
            let top = require(mode, "top", params.top)?;
            let bottom = require(mode, "bottom", params.bottom)?;
            let (near, far) = clip_range(mode, params)?;
            Mat4::orthographic_rh_z0(left, right, bottom, top, near, far)
        }
        ProjectionMode::External => params.matrix.ok_or(ConfigurationError::MissingProjectionParam {
            mode,
            param: "matrix",
        })?,
    };

    Invertible::new(matrix, "projection")
}

fn require(
    mode: ProjectionMode,
    param: &'static str,
    value: Option<f64>,
) -> Result<f64, ConfigurationError> {
    let v = value.ok_or(ConfigurationError::MissingProjectionParam { mode, param })?;
    if !v.is_finite() {
        return Err(ConfigurationError::InvalidProjectionParam {
            param,
            value: v,
            reason: "must be finite",
        });
    }
    Ok(v)
}

fn fovy_rad(mode: ProjectionMode, params: &ProjectionParams) -> Result<f64, ConfigurationError> {
    let fovy = require(mode, "fovy", params.fovy)?;
    if !(fovy > 0.0 && fovy < 180.0) {
        return Err(ConfigurationError::InvalidProjectionParam {
            param: "fovy",
            value: fovy,
            reason: "must be within (0, 180) degrees",
        });
    }
    Ok(fovy.to_radians())
}

fn clip_range(
    mode: ProjectionMode,
    params: &ProjectionParams,
) -> Result<(f64, f64), ConfigurationError> {
    let near = require(mode, "near", params.near)?;
    let far = require(mode, "far", params.far)?;
    if near >= far {
        return Err(ConfigurationError::DegenerateClipRange { near, far });
    }
    Ok((near, far))
}
