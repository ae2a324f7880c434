//! View → viewport resolution, multi-view layout and picking.
//!
//! A [`ViewDescriptor`] says where on the canvas a view goes and how it
//! projects; a shared [`ViewState`] says where the camera is. The
//! [`ViewportFactory`] turns the pair into an immutable [`Viewport`] with
//! project/unproject, the [`LayoutManager`] does that for every view once per
//! frame, and [`pick`] finds what lies under a canvas pixel.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod factory;
pub mod hash;
pub mod layout;
pub mod picking;
pub mod projection;
pub mod resolver;
pub mod view_state;
pub mod viewport;

pub use config::*;
pub use descriptor::*;
pub use error::*;
pub use factory::*;
pub use layout::*;
pub use picking::*;
pub use projection::*;
pub use resolver::*;
pub use view_state::*;
pub use viewport::*;
