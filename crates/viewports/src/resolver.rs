//! View-state resolver: view state + pixel extents → view matrix.
//!
//! The compatibility between a view's declared [`ViewFrame`] and the view
//! state variant is a single exhaustive table in [`check_compatible`]; adding
//! a variant forces a decision for every frame.

use foundation::PixelRect;
use foundation::math::web_mercator::{
    common_to_lng_lat, lng_lat_to_common, units_per_meter, zoom_scale,
};
use foundation::math::{GeoPoint, Mat4, Vec3, wrap_longitude_deg};

use crate::descriptor::ViewFrame;
use crate::error::ConfigurationError;
use crate::view_state::{GeoAnchor, OrbitState, ViewState, GeospatialState};

/// Camera height above the focus, in viewport heights.
pub const ALTITUDE: f64 = 1.5;

/// Mapping between a viewport's linear world space and geographic coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum GeoFrame {
    /// Linear space is Web-Mercator common units. Altitude is scaled by the
    /// Mercator factor at `center`, so every plane `z = c` maps to one
    /// altitude across the view.
    WebMercator { center: GeoPoint },
    /// Linear space is meters east/north/up of `anchor`.
    Anchored { anchor: GeoPoint },
}

impl GeoFrame {
    fn anchored(anchor: GeoAnchor) -> Self {
        GeoFrame::Anchored {
            anchor: GeoPoint::new(anchor.longitude, anchor.latitude, 0.0),
        }
    }

    pub fn to_linear(&self, geo: GeoPoint) -> Vec3 {
        match self {
            GeoFrame::WebMercator { .. } => {
                let (x, y) = lng_lat_to_common(geo.longitude, geo.latitude);
                Vec3::new(x, y, geo.altitude * self.units_per_meter())
            }
            GeoFrame::Anchored { anchor } => {
                let (ax, ay) = lng_lat_to_common(anchor.longitude, anchor.latitude);
                let (x, y) = lng_lat_to_common(geo.longitude, geo.latitude);
                let k = 1.0 / units_per_meter(anchor.latitude);
                Vec3::new((x - ax) * k, (y - ay) * k, geo.altitude)
            }
        }
    }

    pub fn to_geo(&self, p: Vec3) -> GeoPoint {
        match self {
            GeoFrame::WebMercator { .. } => {
                let (lng, lat) = common_to_lng_lat(p.x, p.y);
                GeoPoint::new(wrap_longitude_deg(lng), lat, p.z / self.units_per_meter())
            }
            GeoFrame::Anchored { anchor } => {
                let (ax, ay) = lng_lat_to_common(anchor.longitude, anchor.latitude);
                let k = units_per_meter(anchor.latitude);
                let (lng, lat) = common_to_lng_lat(ax + p.x * k, ay + p.y * k);
                GeoPoint::new(wrap_longitude_deg(lng), lat, p.z)
            }
        }
    }

    /// Linear units per meter at the frame's reference point.
    pub fn units_per_meter(&self) -> f64 {
        match self {
            GeoFrame::WebMercator { center } => units_per_meter(center.latitude),
            GeoFrame::Anchored { .. } => 1.0,
        }
    }
}

/// Output of [`resolve_view_matrix`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ResolvedView {
    pub view: Mat4,
    /// Width / height of the viewport.
    pub aspect: f64,
    /// Eye-to-focus distance; projection near/far are multiples of it.
    pub distance: f64,
    pub geo: Option<GeoFrame>,
}

/// Rejects view-state variants the view's frame cannot interpret.
pub fn check_compatible(frame: ViewFrame, state: &ViewState) -> Result<(), ConfigurationError> {
    let ok = match (frame, state) {
        (_, ViewState::External(_)) => true,
        (ViewFrame::Geospatial, ViewState::Geospatial(_)) => true,
        (ViewFrame::Geospatial, ViewState::GeoPositional(s)) => s.anchor.is_some(),
        (ViewFrame::Geospatial, ViewState::Positional(_) | ViewState::Orbit(_)) => false,
        (ViewFrame::Cartesian, ViewState::Geospatial(_)) => false,
        (
            ViewFrame::Cartesian,
            ViewState::Positional(_) | ViewState::GeoPositional(_) | ViewState::Orbit(_),
        ) => true,
    };
    if ok {
        Ok(())
    } else {
        Err(ConfigurationError::ViewStateMismatch {
            frame,
            state: state.kind(),
        })
    }
}

/// Resolves the view matrix for `state` rendered into `extents`.
///
/// Pure: identical inputs give bit-identical output.
pub fn resolve_view_matrix(
    frame: ViewFrame,
    state: &ViewState,
    extents: &PixelRect,
) -> Result<ResolvedView, ConfigurationError> {
    if extents.is_empty() || !extents.width.is_finite() || !extents.height.is_finite() {
        return Err(ConfigurationError::NonPositiveSize {
            width: extents.width,
            height: extents.height,
        });
    }
    check_compatible(frame, state)?;
    state.validate()?;

    let aspect = extents.aspect();
    match state {
        ViewState::Geospatial(s) => geospatial_view(s, extents, aspect),
        ViewState::Positional(s) => Ok(ResolvedView {
            view: pose_view(s.position, s.direction, s.up)?,
            aspect,
            distance: 1.0,
            geo: None,
        }),
        ViewState::GeoPositional(s) => Ok(ResolvedView {
            view: pose_view(s.position, s.direction, s.up)?,
            aspect,
            distance: 1.0,
            geo: s.anchor.map(GeoFrame::anchored),
        }),
        ViewState::Orbit(s) => orbit_view(s, extents, aspect),
        ViewState::External(s) => Ok(ResolvedView {
            view: s.view_matrix,
            aspect,
            distance: 1.0,
            geo: None,
        }),
    }
}

/// Eye-to-focus distance such that one linear unit at the focus spans
/// `2^zoom` pixels when the field of view matches [`ALTITUDE`].
fn zoom_distance(zoom: f64, extents: &PixelRect) -> f64 {
    ALTITUDE * extents.height / zoom_scale(zoom)
}

fn geospatial_view(
    s: &GeospatialState,
    extents: &PixelRect,
    aspect: f64,
) -> Result<ResolvedView, ConfigurationError> {
    let (cx, cy) = lng_lat_to_common(s.longitude, s.latitude);
    let center = Vec3::new(cx, cy, 0.0);
    let distance = zoom_distance(s.zoom, extents);

    let (sin_b, cos_b) = s.bearing.to_radians().sin_cos();
    let (sin_p, cos_p) = s.pitch.to_radians().sin_cos();
    // Horizontal heading; also screen-up when looking straight down.
    let heading = Vec3::new(sin_b, cos_b, 0.0);
    let offset = heading * (-sin_p) + Vec3::Z * cos_p;
    let eye = center + offset * distance;

    let view = Mat4::look_at_rh(eye, center, heading).ok_or(
        ConfigurationError::DegenerateCamera {
            reason: "geospatial camera has no well-defined up vector",
        },
    )?;

    Ok(ResolvedView {
        view,
        aspect,
        distance,
        geo: Some(GeoFrame::WebMercator {
            center: GeoPoint::new(s.longitude, s.latitude, 0.0),
        }),
    })
}

fn orbit_view(
    s: &OrbitState,
    extents: &PixelRect,
    aspect: f64,
) -> Result<ResolvedView, ConfigurationError> {
    let distance = zoom_distance(s.zoom, extents);
    let (sin_x, cos_x) = s.rotation_x.to_radians().sin_cos();
    let (sin_y, cos_y) = s.rotation_y.to_radians().sin_cos();
    // Unit offset (0, -1, 0) raised by rotation_x, then turned about +Z.
    let offset = Vec3::new(sin_y * cos_x, -cos_y * cos_x, sin_x);
    let eye = s.target + offset * distance;

    let view = Mat4::look_at_rh(eye, s.target, Vec3::Z).ok_or(
        ConfigurationError::DegenerateCamera {
            reason: "orbit camera looks along its up axis",
        },
    )?;

    Ok(ResolvedView {
        view,
        aspect,
        distance,
        geo: None,
    })
}

fn pose_view(position: Vec3, direction: Vec3, up: Option<Vec3>) -> Result<Mat4, ConfigurationError> {
    let degenerate = ConfigurationError::DegenerateCamera {
        reason: "direction is parallel to up",
    };
    match up {
        Some(up) => Mat4::look_to_rh(position, direction, up).ok_or(degenerate),
        // Z-up world; a vertical camera falls back to +Y as screen-up.
        None => Mat4::look_to_rh(position, direction, Vec3::Z)
            .or_else(|| Mat4::look_to_rh(position, direction, Vec3::Y))
            .ok_or(degenerate),
    }
}
