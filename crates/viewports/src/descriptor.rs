//! Declarative, caller-authored view descriptors.
//!
//! A descriptor names a screen region and a projection; it never holds a view
//! matrix. Descriptors are resolved into [`Viewport`](crate::Viewport)s by the
//! [`ViewportFactory`](crate::ViewportFactory).

use std::fmt;
use std::str::FromStr;

use foundation::math::Mat4;
use foundation::{CanvasSize, PixelRect};
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Vertical field of view whose focal length matches the default camera
/// altitude (`2 * atan(1 / (2 * ALTITUDE))`), so one common unit at the focus
/// covers exactly `2^zoom` pixels.
pub const MAP_FOVY_DEG: f64 = 36.869_897_645_844_02;

/// A screen length: absolute logical pixels or a percentage of the canvas.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LengthRepr", into = "LengthRepr")]
pub enum Length {
    Pixels(f64),
    Percent(f64),
}

impl Length {
    pub const ZERO: Length = Length::Pixels(0.0);
    pub const FULL: Length = Length::Percent(100.0);

    /// Resolve against `dimension` pixels.
    ///
    /// Percentages are rounded to whole units; absolute pixels are used as is.
    pub fn resolve(self, field: &'static str, dimension: u32) -> Result<f64, ConfigurationError> {
        match self {
            Length::Pixels(px) => {
                if !px.is_finite() {
                    return Err(ConfigurationError::NonFiniteLength { field });
                }
                Ok(px)
            }
            Length::Percent(p) => {
                if !(0.0..=100.0).contains(&p) {
                    return Err(ConfigurationError::PercentOutOfRange { field, percent: p });
                }
                Ok((p * f64::from(dimension) / 100.0).round())
            }
        }
    }
}

impl From<f64> for Length {
    fn from(px: f64) -> Self {
        Length::Pixels(px)
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Pixels(px) => write!(f, "{px}"),
            Length::Percent(p) => write!(f, "{p}%"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLengthError(String);

impl fmt::Display for ParseLengthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid length `{}` (expected `N`, `Npx` or `N%`)", self.0)
    }
}

impl std::error::Error for ParseLengthError {}

impl FromStr for Length {
    type Err = ParseLengthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let err = || ParseLengthError(s.to_string());
        if let Some(p) = t.strip_suffix('%') {
            return p.trim().parse().map(Length::Percent).map_err(|_| err());
        }
        let px = t.strip_suffix("px").unwrap_or(t);
        px.trim().parse().map(Length::Pixels).map_err(|_| err())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum LengthRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<LengthRepr> for Length {
    type Error = ParseLengthError;

    fn try_from(repr: LengthRepr) -> Result<Self, Self::Error> {
        match repr {
            LengthRepr::Number(px) => Ok(Length::Pixels(px)),
            LengthRepr::Text(s) => s.parse(),
        }
    }
}

impl From<Length> for LengthRepr {
    fn from(l: Length) -> Self {
        match l {
            Length::Pixels(px) => LengthRepr::Number(px),
            Length::Percent(_) => LengthRepr::Text(l.to_string()),
        }
    }
}

fn zero() -> Length {
    Length::ZERO
}

fn full() -> Length {
    Length::FULL
}

/// Screen region of a view, top-left origin, y down.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extents {
    #[serde(default = "zero")]
    pub x: Length,
    #[serde(default = "zero")]
    pub y: Length,
    #[serde(default = "full")]
    pub width: Length,
    #[serde(default = "full")]
    pub height: Length,
}

impl Default for Extents {
    fn default() -> Self {
        Self::FULL
    }
}

impl Extents {
    pub const FULL: Extents = Extents {
        x: Length::ZERO,
        y: Length::ZERO,
        width: Length::FULL,
        height: Length::FULL,
    };

    pub fn new(
        x: impl Into<Length>,
        y: impl Into<Length>,
        width: impl Into<Length>,
        height: impl Into<Length>,
    ) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            width: width.into(),
            height: height.into(),
        }
    }

    /// Absolute pixel rectangle for `canvas`; width and height must be positive.
    pub fn resolve(&self, canvas: CanvasSize) -> Result<PixelRect, ConfigurationError> {
        let x = self.x.resolve("x", canvas.width)?;
        let y = self.y.resolve("y", canvas.height)?;
        let width = self.width.resolve("width", canvas.width)?;
        let height = self.height.resolve("height", canvas.height)?;
        if !(width > 0.0 && height > 0.0) {
            return Err(ConfigurationError::NonPositiveSize { width, height });
        }
        Ok(PixelRect::new(x, y, width, height))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectionMode {
    Perspective,
    Orthographic,
    ExplicitOrtho,
    External,
}

impl fmt::Display for ProjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProjectionMode::Perspective => "perspective",
            ProjectionMode::Orthographic => "orthographic",
            ProjectionMode::ExplicitOrtho => "explicit-ortho",
            ProjectionMode::External => "external",
        })
    }
}

/// Mode-dependent projection parameters.
///
/// Which fields are required depends on [`ProjectionMode`]:
/// - perspective / orthographic: `fovy` (degrees), `near`, `far`
/// - explicit-ortho: `left`, `right`, `top`, `bottom`, `near`, `far`
/// - external: `matrix`
///
/// For perspective and orthographic views `near`/`far` are multiples of the
/// focal distance derived from the view state.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fovy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub near: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub far: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Mat4>,
}

impl ProjectionParams {
    pub fn fov(fovy_deg: f64, near: f64, far: f64) -> Self {
        Self {
            fovy: Some(fovy_deg),
            near: Some(near),
            far: Some(far),
            ..Self::default()
        }
    }

    pub fn bounds(left: f64, right: f64, top: f64, bottom: f64, near: f64, far: f64) -> Self {
        Self {
            left: Some(left),
            right: Some(right),
            top: Some(top),
            bottom: Some(bottom),
            near: Some(near),
            far: Some(far),
            ..Self::default()
        }
    }

    pub fn external(matrix: Mat4) -> Self {
        Self {
            matrix: Some(matrix),
            ..Self::default()
        }
    }
}

/// Coordinate semantics a view declares; checked against the view state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewFrame {
    /// Web-Mercator world; view states carry longitude/latitude.
    Geospatial,
    /// Plain right-handed world space, Z up.
    #[default]
    Cartesian,
}

impl fmt::Display for ViewFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewFrame::Geospatial => "geospatial",
            ViewFrame::Cartesian => "cartesian",
        })
    }
}

/// What to do when resolved extents reach past the canvas.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Keep the full extents for the projection, clip the visible rectangle.
    #[default]
    Clip,
    /// Reject the descriptor with a configuration error.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDescriptor {
    pub id: String,
    #[serde(flatten)]
    pub extents: Extents,
    #[serde(default)]
    pub frame: ViewFrame,
    pub projection: ProjectionMode,
    #[serde(default)]
    pub params: ProjectionParams,
    #[serde(default)]
    pub overflow: OverflowPolicy,
}

impl ViewDescriptor {
    pub fn new(
        id: impl Into<String>,
        frame: ViewFrame,
        projection: ProjectionMode,
        params: ProjectionParams,
    ) -> Self {
        Self {
            id: id.into(),
            extents: Extents::FULL,
            frame,
            projection,
            params,
            overflow: OverflowPolicy::Clip,
        }
    }

    /// Perspective web map.
    pub fn map(id: impl Into<String>) -> Self {
        Self::new(
            id,
            ViewFrame::Geospatial,
            ProjectionMode::Perspective,
            ProjectionParams::fov(MAP_FOVY_DEG, 0.1, 1000.0),
        )
    }

    /// Perspective camera orbiting a target.
    pub fn orbit(id: impl Into<String>) -> Self {
        Self::new(
            id,
            ViewFrame::Cartesian,
            ProjectionMode::Perspective,
            ProjectionParams::fov(MAP_FOVY_DEG, 0.1, 1000.0),
        )
    }

    /// Perspective camera placed by position and direction; near/far in world units.
    pub fn first_person(id: impl Into<String>) -> Self {
        Self::new(
            id,
            ViewFrame::Cartesian,
            ProjectionMode::Perspective,
            ProjectionParams::fov(60.0, 0.1, 1000.0),
        )
    }

    pub fn with_extents(mut self, extents: Extents) -> Self {
        self.extents = extents;
        self
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn with_params(mut self, projection: ProjectionMode, params: ProjectionParams) -> Self {
        self.projection = projection;
        self.params = params;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Extents, Length, ProjectionMode, ViewDescriptor, ViewFrame};
    use crate::error::ConfigurationError;
    use foundation::{CanvasSize, PixelRect};
    use pretty_assertions::assert_eq;

    fn pct(p: f64) -> Length {
        Length::Percent(p)
    }

    #[test]
    fn parses_lengths() {
        assert_eq!("50%".parse::<Length>(), Ok(Length::Percent(50.0)));
        assert_eq!(" 12.5 % ".parse::<Length>(), Ok(Length::Percent(12.5)));
        assert_eq!("400".parse::<Length>(), Ok(Length::Pixels(400.0)));
        assert_eq!("400px".parse::<Length>(), Ok(Length::Pixels(400.0)));
        assert!("half".parse::<Length>().is_err());
    }

    #[test]
    fn resolves_percentages_against_canvas() {
        let e = Extents::new(pct(50.0), 0.0, pct(50.0), pct(100.0));
        assert_eq!(
            e.resolve(CanvasSize::new(800, 600)),
            Ok(PixelRect::new(400.0, 0.0, 400.0, 600.0))
        );
    }

    #[test]
    fn percentages_round_to_whole_units() {
        let e = Extents::new(pct(33.3), 0.0, pct(33.3), pct(100.0));
        let r = e.resolve(CanvasSize::new(1000, 10)).expect("resolve");
        assert_eq!(r, PixelRect::new(333.0, 0.0, 333.0, 10.0));
    }

    #[test]
    fn rejects_out_of_range_percent() {
        let e = Extents::new(pct(-5.0), 0.0, pct(50.0), pct(100.0));
        assert_eq!(
            e.resolve(CanvasSize::new(800, 600)),
            Err(ConfigurationError::PercentOutOfRange {
                field: "x",
                percent: -5.0
            })
        );
        let e = Extents::new(0.0, 0.0, pct(120.0), pct(100.0));
        assert!(matches!(
            e.resolve(CanvasSize::new(800, 600)),
            Err(ConfigurationError::PercentOutOfRange { field: "width", .. })
        ));
    }

    #[test]
    fn rejects_zero_area() {
        let e = Extents::new(0.0, 0.0, pct(0.0), pct(100.0));
        assert!(matches!(
            e.resolve(CanvasSize::new(800, 600)),
            Err(ConfigurationError::NonPositiveSize { .. })
        ));
    }

    #[test]
    fn overflowing_extents_resolve_unclipped() {
        let e = Extents::new(pct(70.0), 0.0, 400.0, pct(100.0));
        assert_eq!(
            e.resolve(CanvasSize::new(800, 600)),
            Ok(PixelRect::new(560.0, 0.0, 400.0, 600.0))
        );
    }

    #[test]
    fn descriptor_from_json_with_defaults() {
        let json = r#"{
            "id": "right",
            "x": "50%",
            "width": "50%",
            "projection": "perspective",
            "params": { "fovy": 45, "near": 0.1, "far": 100 }
        }"#;
        let d: ViewDescriptor = serde_json::from_str(json).expect("parse");
        assert_eq!(d.id, "right");
        assert_eq!(d.frame, ViewFrame::Cartesian);
        assert_eq!(d.projection, ProjectionMode::Perspective);
        assert_eq!(d.extents, Extents::new(pct(50.0), 0.0, pct(50.0), pct(100.0)));
        assert_eq!(d.params.fovy, Some(45.0));
        assert_eq!(d.params.left, None);
    }

    #[test]
    fn descriptor_json_round_trip_keeps_percentages() {
        let d = ViewDescriptor::map("inset").with_extents(Extents::new(
            pct(70.0),
            10.0,
            pct(25.0),
            pct(25.0),
        ));
        let json = serde_json::to_string(&d).expect("serialize");
        assert!(json.contains(r#""x":"70%""#), "{json}");
        let back: ViewDescriptor = serde_json::from_str(&json).expect("parse");
        assert_eq!(back, d);
    }
}
