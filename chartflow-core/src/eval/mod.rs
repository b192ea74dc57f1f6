//! Evaluation
//!
//! Computes node values over a built graph.
//!
//! # Concepts
//!
//! ## Resolved values
//!
//! A node resolves either to a concrete value, to a per-row transform, to a
//! scale, or to nothing at all (marks and the render root). The distinction
//! is made once, by node kind and operation, so callers never have to guess
//! from the shape of a value whether it still needs a row.
//!
//! ## Collaborators
//!
//! Field aggregation ([`aggregate`]) and scale construction ([`scale`]) are
//! plain functions and types with no knowledge of the graph. The evaluator
//! feeds them resolved inputs.

pub mod aggregate;
mod evaluator;
mod resolved;
pub mod scale;

pub use evaluator::{evaluate, Evaluation, Evaluator};
pub use resolved::{Resolved, RowTransform};
pub use scale::{BandScale, LinearScale, Scale, ScaleKind};
