//! Computation Graph
//!
//! This module implements the computation graph that a chart specification
//! compiles into.
//!
//! # Overview
//!
//! The graph is a directed acyclic graph (DAG) where:
//!
//! - Nodes represent literals, datasets, derived values, scales, marks and
//!   the render root
//! - Edges are implicit: if A references B anywhere in its parameters, A
//!   depends on B
//!
//! Nodes live in an arena ([`Graph`]) and reference each other by [`NodeId`]
//! handles. Because edges are derived from parameters on demand, there is no
//! edge list to keep in sync and nodes never change after construction.
//!
//! Ordering and impact analysis live in [`scheduler`] and work on any slice
//! of nodes, so sub-graphs can be sorted without building a new arena.

mod node;
pub mod scheduler;

pub use node::{bag, Node, NodeId, NodeKind, Operation, Param, ParamBag};
pub use scheduler::{downstream_nodes, topological_sort};

use crate::error::{ChartError, Result};

/// Arena owning every node of one compile pass.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// All nodes, indexed by `NodeId`.
    nodes: Vec<Node>,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Handle the next added node will receive.
    ///
    /// Useful for wiring a reference before its target exists; such forward
    /// references are what make a cycle expressible.
    pub fn next_id(&self) -> NodeId {
        NodeId::from(self.nodes.len() as u32)
    }

    /// Add a node to the graph and return its handle.
    pub fn add(&mut self, kind: NodeKind, params: ParamBag) -> NodeId {
        let id = self.next_id();
        self.nodes.push(Node::new(id, kind, params));
        id
    }

    /// Get a reference to a node.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a reference to a node, failing on a dangling handle.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id).ok_or(ChartError::UnknownNode(id))
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter()
    }

    /// All handles in creation order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(Node::id).collect()
    }

    /// Resolve a list of handles to nodes.
    pub fn resolve(&self, ids: &[NodeId]) -> Result<Vec<&Node>> {
        ids.iter().map(|&id| self.node(id)).collect()
    }

    /// Sort the given handles so every node follows its in-collection
    /// dependencies.
    pub fn sorted(&self, ids: &[NodeId]) -> Result<Vec<NodeId>> {
        let nodes = self.resolve(ids)?;
        Ok(topological_sort(&nodes)?.into_iter().map(Node::id).collect())
    }

    /// Every node in the graph, topologically sorted.
    pub fn evaluation_order(&self) -> Result<Vec<NodeId>> {
        let nodes: Vec<&Node> = self.nodes.iter().collect();
        Ok(topological_sort(&nodes)?.into_iter().map(Node::id).collect())
    }

    /// The nodes that would need re-evaluation if `start` changed,
    /// topologically sorted with `start` first.
    pub fn downstream_of(&self, start: NodeId) -> Result<Vec<NodeId>> {
        let start = self.node(start)?;
        let nodes: Vec<&Node> = self.nodes.iter().collect();
        Ok(downstream_nodes(start, &nodes)?
            .into_iter()
            .map(Node::id)
            .collect())
    }

    /// Get the total number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
