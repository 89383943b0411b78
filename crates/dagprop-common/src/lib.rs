//! Dagprop shared types.
//!
//! This crate holds the identity types and the unified error enum shared by
//! the rest of the workspace. It has no engine logic of its own.

pub mod error;
pub mod id;

pub use error::{AdjacencyDirection, Error, PriorLocation, Result};
pub use id::{Edge, NodeId};
