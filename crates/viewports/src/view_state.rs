//! Camera parameters, shaped by variant.
//!
//! A single [`ViewState`] is shared by every descriptor in a layout; the
//! resolver checks each descriptor's [`ViewFrame`](crate::ViewFrame) against
//! the variant before building anything.

use std::fmt;

use foundation::math::web_mercator::is_mercator_lat_valid;
use foundation::math::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Largest supported pitch (degrees from nadir) for geospatial cameras.
pub const MAX_PITCH_DEG: f64 = 85.0;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeospatialState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    /// Degrees away from looking straight down.
    #[serde(default)]
    pub pitch: f64,
    /// Degrees clockwise from north.
    #[serde(default)]
    pub bearing: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionalState {
    pub position: Vec3,
    pub direction: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up: Option<Vec3>,
}

/// Geographic anchor of a geo-positional camera.
///
/// Only used to translate between the camera's meter space and lng/lat; it
/// does not affect the view matrix.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoAnchor {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
}

/// Positional camera whose position is in meters east/north/up of `anchor`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPositionalState {
    pub position: Vec3,
    pub direction: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<GeoAnchor>,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitState {
    pub target: Vec3,
    /// Elevation above the XY plane, degrees, exclusive of ±90.
    pub rotation_x: f64,
    /// Azimuth about +Z, degrees counter-clockwise.
    pub rotation_y: f64,
    pub zoom: f64,
}

/// Caller-supplied matrices, used verbatim.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalState {
    pub view_matrix: Mat4,
    pub projection_matrix: Mat4,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ViewState {
    Geospatial(GeospatialState),
    Positional(PositionalState),
    GeoPositional(GeoPositionalState),
    Orbit(OrbitState),
    External(ExternalState),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ViewStateKind {
    Geospatial,
    Positional,
    GeoPositional,
    Orbit,
    External,
}

impl fmt::Display for ViewStateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewStateKind::Geospatial => "geospatial",
            ViewStateKind::Positional => "positional",
            ViewStateKind::GeoPositional => "geo-positional",
            ViewStateKind::Orbit => "orbit",
            ViewStateKind::External => "external",
        })
    }
}

impl ViewState {
    pub fn geospatial(longitude: f64, latitude: f64, zoom: f64) -> Self {
        ViewState::Geospatial(GeospatialState {
            longitude,
            latitude,
            zoom,
            pitch: 0.0,
            bearing: 0.0,
        })
    }

    pub fn positional(position: Vec3, direction: Vec3) -> Self {
        ViewState::Positional(PositionalState {
            position,
            direction,
            up: None,
        })
    }

    pub fn orbit(target: Vec3, rotation_x: f64, rotation_y: f64, zoom: f64) -> Self {
        ViewState::Orbit(OrbitState {
            target,
            rotation_x,
            rotation_y,
            zoom,
        })
    }

    pub fn external(view_matrix: Mat4, projection_matrix: Mat4) -> Self {
        ViewState::External(ExternalState {
            view_matrix,
            projection_matrix,
        })
    }

    pub fn kind(&self) -> ViewStateKind {
        match self {
            ViewState::Geospatial(_) => ViewStateKind::Geospatial,
            ViewState::Positional(_) => ViewStateKind::Positional,
            ViewState::GeoPositional(_) => ViewStateKind::GeoPositional,
            ViewState::Orbit(_) => ViewStateKind::Orbit,
            ViewState::External(_) => ViewStateKind::External,
        }
    }

    /// Field-level checks that do not depend on the consuming view.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self {
            ViewState::Geospatial(s) => {
                finite("longitude", s.longitude)?;
                finite("zoom", s.zoom)?;
                finite("bearing", s.bearing)?;
                if !is_mercator_lat_valid(s.latitude) {
                    return Err(ConfigurationError::InvalidViewState {
                        field: "latitude",
                        reason: "must lie within the Web-Mercator band",
                    });
                }
                if !(0.0..=MAX_PITCH_DEG).contains(&s.pitch) {
                    return Err(ConfigurationError::InvalidViewState {
                        field: "pitch",
                        reason: "must be within [0, 85] degrees",
                    });
                }
                Ok(())
            }
            ViewState::Positional(s) => validate_pose(s.position, s.direction, s.up),
            ViewState::GeoPositional(s) => {
                validate_pose(s.position, s.direction, s.up)?;
                if let Some(anchor) = s.anchor {
                    finite("anchor.longitude", anchor.longitude)?;
                    if !is_mercator_lat_valid(anchor.latitude) {
                        return Err(ConfigurationError::InvalidViewState {
                            field: "anchor.latitude",
                            reason: "must lie within the Web-Mercator band",
                        });
                    }
                    if let Some(z) = anchor.zoom {
                        finite("anchor.zoom", z)?;
                    }
                }
                Ok(())
            }
            ViewState::Orbit(s) => {
                finite_vec("target", s.target)?;
                finite("rotation_y", s.rotation_y)?;
                finite("zoom", s.zoom)?;
                if !(s.rotation_x.abs() < 90.0) {
                    return Err(ConfigurationError::InvalidViewState {
                        field: "rotation_x",
                        reason: "must be strictly between -90 and 90 degrees",
                    });
                }
                Ok(())
            }
            ViewState::External(s) => {
                if !s.view_matrix.is_finite() {
                    return Err(ConfigurationError::InvalidViewState {
                        field: "view_matrix",
                        reason: "must be finite",
                    });
                }
                if !s.projection_matrix.is_finite() {
                    return Err(ConfigurationError::InvalidViewState {
                        field: "projection_matrix",
                        reason: "must be finite",
                    });
                }
                Ok(())
            }
        }
    }
}

fn finite(field: &'static str, v: f64) -> Result<(), ConfigurationError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidViewState {
            field,
            reason: "must be finite",
        })
    }
}

fn finite_vec(field: &'static str, v: Vec3) -> Result<(), ConfigurationError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidViewState {
            field,
            reason: "must be finite",
        })
    }
}

fn validate_pose(position: Vec3, direction: Vec3, up: Option<Vec3>) -> Result<(), ConfigurationError> {
    finite_vec("position", position)?;
    if direction.normalize().is_none() {
        return Err(ConfigurationError::InvalidViewState {
            field: "direction",
            reason: "must be a finite, non-zero vector",
        });
    }
    if up.is_some_and(|u| u.normalize().is_none()) {
        return Err(ConfigurationError::InvalidViewState {
            field: "up",
            reason: "must be a finite, non-zero vector",
        });
    }
    Ok(())
}
