//! Evaluation Scheduler
//!
//! The scheduler determines the order in which nodes are evaluated and which
//! nodes are affected by a change. It ensures that dependencies are always
//! ordered before their dependents.
//!
//! # Algorithm
//!
//! Sorting is a depth-first, post-order walk with three visitation states
//! (unvisited, in progress, done):
//!
//! 1. Walk the collection in the order given
//! 2. For each unvisited node, mark it in progress and visit its dependencies
//!    that are part of the collection
//! 3. Once every dependency is done, mark the node done and append it
//! 4. Meeting an in-progress node again means the collection has a cycle
//!
//! Visitation state lives in a table local to the call, keyed by node handle,
//! so nodes stay immutable and calls over overlapping collections never
//! interfere. Dependencies outside the collection are ignored, which is what
//! makes sorting a sub-graph possible.
//!
//! The downstream closure of a node is computed as a fixed point: starting
//! from the node itself, keep adding any node whose dependencies intersect
//! the closure until nothing changes. The closure is then sorted, so the
//! start node comes first and every consumer follows its producers.

use std::collections::{HashMap, HashSet};

use smallvec::SmallVec;

use super::node::{Node, NodeId};
use crate::error::{ChartError, Result};

/// Visitation state of a node during one sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// Perform a topological sort of the given nodes.
///
/// Returns nodes in order such that dependencies come before dependents.
/// Ties are broken by first-discovery order: the order of the input and,
/// within a node, the order its dependencies appear in its parameters.
pub fn topological_sort<'a>(nodes: &[&'a Node]) -> Result<Vec<&'a Node>> {
    let members: HashMap<NodeId, &'a Node> = nodes.iter().map(|node| (node.id(), *node)).collect();
    let mut marks: HashMap<NodeId, Visit> = HashMap::with_capacity(members.len());
    let mut sorted = Vec::with_capacity(members.len());

    for &node in nodes {
        visit(node, &members, &mut marks, &mut sorted)?;
    }

    Ok(sorted)
}

fn visit<'a>(
    node: &'a Node,
    members: &HashMap<NodeId, &'a Node>,
    marks: &mut HashMap<NodeId, Visit>,
    sorted: &mut Vec<&'a Node>,
) -> Result<()> {
    match marks.get(&node.id()) {
        Some(Visit::Done) => return Ok(()),
        Some(Visit::InProgress) => return Err(ChartError::CyclicDependency(node.id())),
        None => {}
    }

    tracing::trace!(node = %node.id(), kind = %node.kind(), "visiting node");
    marks.insert(node.id(), Visit::InProgress);

    for dep in node.dependencies() {
        if let Some(&dep_node) = members.get(&dep) {
            visit(dep_node, members, marks, sorted)?;
        }
    }

    marks.insert(node.id(), Visit::Done);
    sorted.push(node);
    Ok(())
}

/// Compute every node that transitively depends on `start`, including
/// `start` itself, in topological order.
///
/// Feeding the result to the evaluator re-computes exactly the part of the
/// graph a change to `start` can affect.
pub fn downstream_nodes<'a>(start: &'a Node, nodes: &[&'a Node]) -> Result<Vec<&'a Node>> {
    let deps: Vec<SmallVec<[NodeId; 4]>> = nodes.iter().map(|node| node.dependencies()).collect();
    let mut included: HashSet<NodeId> = HashSet::from([start.id()]);

    // Each round adds at least one node or stops, so this is bounded by the
    // collection size.
    loop {
        let mut grew = false;
        for (node, node_deps) in nodes.iter().zip(&deps) {
            if included.contains(&node.id()) {
                continue;
            }
            if node_deps.iter().any(|dep| included.contains(dep)) {
                included.insert(node.id());
                grew = true;
            }
        }
        if !grew {
            break;
        }
    }

    let mut closure = Vec::with_capacity(included.len());
    closure.push(start);
    closure.extend(
        nodes
            .iter()
            .copied()
            .filter(|node| node.id() != start.id() && included.contains(&node.id())),
    );

    tracing::debug!(start = %start.id(), affected = closure.len(), "computed downstream closure");
    topological_sort(&closure)
}
