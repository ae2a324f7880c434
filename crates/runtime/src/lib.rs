pub mod frame;
pub mod latest;

pub use frame::*;
pub use latest::*;
