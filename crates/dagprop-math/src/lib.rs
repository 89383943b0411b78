//! Dagprop math utilities.

pub mod math;

pub use math::combine::*;
