use foundation::{CanvasSize, PixelRect};

use crate::descriptor::{ProjectionMode, ViewFrame};
use crate::view_state::ViewStateKind;

/// Inputs that cannot produce a correct camera.
///
/// These are never defaulted: a wrong camera renders silently wrong pictures.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    MissingProjectionParam {
        mode: ProjectionMode,
        param: &'static str,
    },
    InvalidProjectionParam {
        param: &'static str,
        value: f64,
        reason: &'static str,
    },
    DegenerateClipRange {
        near: f64,
        far: f64,
    },
    NonInvertibleMatrix {
        matrix: &'static str,
    },
    PercentOutOfRange {
        field: &'static str,
        percent: f64,
    },
    NonFiniteLength {
        field: &'static str,
    },
    NonPositiveSize {
        width: f64,
        height: f64,
    },
    ExceedsCanvas {
        extents: PixelRect,
        canvas: CanvasSize,
    },
    ViewStateMismatch {
        frame: ViewFrame,
        state: ViewStateKind,
    },
    InvalidViewState {
        field: &'static str,
        reason: &'static str,
    },
    DegenerateCamera {
        reason: &'static str,
    },
}

impl std::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationError::MissingProjectionParam { mode, param } => {
                write!(f, "{mode} projection requires `{param}`")
            }
            ConfigurationError::InvalidProjectionParam {
                param,
                value,
                reason,
            } => write!(f, "projection param `{param}`={value} {reason}"),
            ConfigurationError::DegenerateClipRange { near, far } => {
                write!(f, "degenerate clip range: near={near} far={far}")
            }
            ConfigurationError::NonInvertibleMatrix { matrix } => {
                write!(f, "{matrix} matrix is not invertible")
            }
            ConfigurationError::PercentOutOfRange { field, percent } => {
                write!(f, "extent `{field}` is {percent}%, outside [0, 100]")
            }
            ConfigurationError::NonFiniteLength { field } => {
                write!(f, "extent `{field}` is not a finite length")
            }
            ConfigurationError::NonPositiveSize { width, height } => {
                write!(f, "viewport resolves to zero area: {width}x{height}")
            }
            ConfigurationError::ExceedsCanvas { extents, canvas } => write!(
                f,
                "viewport ({}, {}, {}, {}) exceeds canvas {}x{}",
                extents.x, extents.y, extents.width, extents.height, canvas.width, canvas.height
            ),
            ConfigurationError::ViewStateMismatch { frame, state } => {
                write!(f, "{state} view state cannot drive a {frame} view")
            }
            ConfigurationError::InvalidViewState { field, reason } => {
                write!(f, "view state `{field}` {reason}")
            }
            ConfigurationError::DegenerateCamera { reason } => {
                write!(f, "degenerate camera: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    DuplicateId(String),
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutError::DuplicateId(id) => write!(f, "duplicate view id `{id}` in layout"),
        }
    }
}

impl std::error::Error for LayoutError {}

/// Error surfaced by layout resolution, tagged with the offending view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewError {
    Configuration {
        view_id: String,
        source: ConfigurationError,
    },
    Layout(LayoutError),
}

impl ViewError {
    pub fn configuration(view_id: impl Into<String>, source: ConfigurationError) -> Self {
        ViewError::Configuration {
            view_id: view_id.into(),
            source,
        }
    }

    /// The underlying configuration error, if this is one.
    pub fn as_configuration(&self) -> Option<&ConfigurationError> {
        match self {
            ViewError::Configuration { source, .. } => Some(source),
            ViewError::Layout(_) => None,
        }
    }
}

impl std::fmt::Display for ViewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewError::Configuration { view_id, source } => {
                write!(f, "view `{view_id}`: {source}")
            }
            ViewError::Layout(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ViewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ViewError::Configuration { source, .. } => Some(source),
            ViewError::Layout(e) => Some(e),
        }
    }
}

impl From<LayoutError> for ViewError {
    fn from(e: LayoutError) -> Self {
        ViewError::Layout(e)
    }
}
