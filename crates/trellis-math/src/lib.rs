//! trellis math utilities.

pub mod math;

pub use math::info::*;
pub use math::stable::*;
