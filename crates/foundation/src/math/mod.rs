pub mod geodesy;
pub mod mat4;
pub mod precision;
pub mod vec;
pub mod web_mercator;

pub use geodesy::*;
pub use mat4::*;
pub use precision::*;
pub use vec::*;
