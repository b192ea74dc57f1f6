//! Graph Nodes
//!
//! This module defines the node types that live in the computation graph.
//!
//! A node is a kind tag plus a parameter bag. Edges are never stored: a node
//! depends on every node referenced anywhere inside its parameters, including
//! inside lists and nested bags.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;
use smallvec::SmallVec;

/// Stable handle to a node in a [`Graph`](super::Graph) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in its arena.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of node in the computation graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A literal value (dimensions, constant mark attributes).
    Operator,

    /// A named dataset holding its rows.
    Data,

    /// A derived value computed from other nodes. The `operation` parameter
    /// selects what is computed.
    DataManipulation,

    /// A scale: domain and range resolved into a callable transform.
    Scale,

    /// A visual mark: primitive type, source data and encoded attributes.
    Mark,

    /// The root of the graph, consumed by the rendering surface.
    Render,
}

impl NodeKind {
    /// Lower-case name used in logs and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Operator => "operator",
            NodeKind::Data => "data",
            NodeKind::DataManipulation => "data_manipulation",
            NodeKind::Scale => "scale",
            NodeKind::Mark => "mark",
            NodeKind::Render => "render",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a [`NodeKind::DataManipulation`] node computes, stored in its
/// `operation` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Distinct values of a field, in first-occurrence order.
    DistinctValues,
    /// `[min, max]` of a numeric field.
    Extent,
    /// Maximum of a numeric field.
    Max,
    /// Apply a scale to a literal, a per-row field, or request its bandwidth.
    CallScale,
}

impl Operation {
    /// Name stored in the parameter bag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::DistinctValues => "distinct_values",
            Operation::Extent => "extent",
            Operation::Max => "max",
            Operation::CallScale => "call_scale",
        }
    }

    /// Parse a stored operation name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "distinct_values" => Some(Operation::DistinctValues),
            "extent" => Some(Operation::Extent),
            "max" => Some(Operation::Max),
            "call_scale" => Some(Operation::CallScale),
            _ => None,
        }
    }
}

impl From<Operation> for Param {
    fn from(operation: Operation) -> Self {
        Param::from(operation.as_str())
    }
}

/// Ordered mapping of parameter name to value.
pub type ParamBag = IndexMap<String, Param>;

/// A single parameter value.
///
/// Parameters nest arbitrarily; any `Node` found at any depth is a dependency.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// A plain value (number, string, row collection, ...).
    Scalar(Value),

    /// A reference to another node.
    Node(NodeId),

    /// An ordered list of parameters.
    List(Vec<Param>),

    /// A nested bag of named parameters.
    Bag(ParamBag),
}

impl Param {
    /// Append every node referenced by this parameter to `out`, skipping
    /// handles that are already present.
    fn collect_nodes(&self, out: &mut SmallVec<[NodeId; 4]>) {
        match self {
            Param::Scalar(_) => {}
            Param::Node(id) => {
                if !out.contains(id) {
                    out.push(*id);
                }
            }
            Param::List(items) => {
                for item in items {
                    item.collect_nodes(out);
                }
            }
            Param::Bag(bag) => {
                for value in bag.values() {
                    value.collect_nodes(out);
                }
            }
        }
    }

    /// The scalar value, if this is a scalar.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Param::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// The referenced node, if this is a node reference.
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Param::Node(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<Value> for Param {
    fn from(value: Value) -> Self {
        Param::Scalar(value)
    }
}

impl From<NodeId> for Param {
    fn from(id: NodeId) -> Self {
        Param::Node(id)
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Scalar(Value::from(value))
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Scalar(Value::from(value))
    }
}

impl From<Vec<Param>> for Param {
    fn from(items: Vec<Param>) -> Self {
        Param::List(items)
    }
}

impl From<ParamBag> for Param {
    fn from(bag: ParamBag) -> Self {
        Param::Bag(bag)
    }
}

/// Build a parameter bag from `(name, value)` pairs, keeping their order.
pub fn bag<I, K, P>(entries: I) -> ParamBag
where
    I: IntoIterator<Item = (K, P)>,
    K: Into<String>,
    P: Into<Param>,
{
    entries
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect()
}

/// A node in the computation graph.
///
/// Nodes are immutable once they are placed in a graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Handle of this node in its arena.
    id: NodeId,

    /// What kind of node this is.
    kind: NodeKind,

    /// Parameters, possibly referencing other nodes.
    params: ParamBag,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind, params: ParamBag) -> Self {
        Self { id, kind, params }
    }

    /// Get the node's handle.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the node's kind.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Get the full parameter bag.
    pub fn params(&self) -> &ParamBag {
        &self.params
    }

    /// Look up a single parameter.
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.get(name)
    }

    /// Look up a scalar parameter.
    pub fn scalar(&self, name: &str) -> Option<&Value> {
        self.param(name).and_then(Param::as_scalar)
    }

    /// Look up a string parameter.
    pub fn str_param(&self, name: &str) -> Option<&str> {
        self.scalar(name).and_then(Value::as_str)
    }

    /// Look up a node-reference parameter.
    pub fn node_param(&self, name: &str) -> Option<NodeId> {
        self.param(name).and_then(Param::as_node)
    }

    /// Every node referenced anywhere in the parameter bag, in first-discovery
    /// order. A node referenced more than once appears once.
    pub fn dependencies(&self) -> SmallVec<[NodeId; 4]> {
        let mut deps = SmallVec::new();
        for param in self.params.values() {
            param.collect_nodes(&mut deps);
        }
        deps
    }

    /// Whether this node references `other` anywhere in its parameters.
    pub fn depends_on(&self, other: NodeId) -> bool {
        self.dependencies().contains(&other)
    }
}
