//! Error Types
//!
//! Every failure the engine can report, from building the graph out of a
//! specification through evaluating it. Structural errors are raised while
//! building; semantic and context errors are raised while evaluating. None of
//! them leave a partial graph or partial result behind.

use thiserror::Error;

use crate::graph::NodeId;

/// Convenience alias used throughout the crate.
pub type Result<T, E = ChartError> = std::result::Result<T, E>;

/// Errors produced while compiling or evaluating a chart graph.
#[derive(Debug, Error)]
pub enum ChartError {
    /// A required dimension (`width` or `height`) is absent.
    #[error("specification is missing required dimension `{0}`")]
    MissingDimension(&'static str),

    /// A scale's range names something other than `width` or `height`.
    #[error("scale `{scale}` has range `{range}`; expected \"width\" or \"height\"")]
    InvalidRange { scale: String, range: String },

    /// A dataset or scale name does not resolve to a previously built node.
    #[error("unknown {kind} `{name}`")]
    UnknownReference { kind: &'static str, name: String },

    /// A node handle points outside the graph arena.
    #[error("node {0:?} does not exist in this graph")]
    UnknownNode(NodeId),

    /// Two datasets or two scales share a name.
    #[error("duplicate {kind} name `{name}`")]
    DuplicateName { kind: &'static str, name: String },

    /// An encode entry carries neither a literal nor a scale invocation.
    #[error("mark `{mark}` attribute `{attribute}` has no value, field or band")]
    InvalidEncoding { mark: String, attribute: String },

    /// The scale type cannot be turned into a transform.
    #[error("unsupported scale type `{0}`; only linear and band scales are supported")]
    UnsupportedScaleType(String),

    /// A data-manipulation node names an operation the evaluator does not know.
    #[error("unsupported data manipulation operation `{0}`")]
    UnsupportedOperation(String),

    /// The node collection contains a dependency cycle through this node.
    #[error("dependency cycle detected at node {0:?}")]
    CyclicDependency(NodeId),

    /// A per-row field lookup was requested without a row.
    #[error("field `{field}` requires a row context")]
    MissingContext { field: String },

    /// A scale domain or range could not be interpreted.
    #[error("invalid scale input: {reason}")]
    InvalidDomain { reason: String },

    /// The specification document is not valid JSON for the expected shape.
    #[error("failed to parse specification: {0}")]
    Parse(#[from] serde_json::Error),
}
