//! Graph Evaluation
//!
//! An [`Evaluator`] runs one pass over a node sequence and produces an
//! [`Evaluation`]: the memo table holding one [`Resolved`] value per node.
//!
//! # How a Pass Works
//!
//! 1. Nodes are evaluated in the order given, which should be topological.
//!
//! 2. Each node is evaluated at most once. Later reads come from the memo.
//!
//! 3. A dependency that is not part of the sequence (or comes later in it)
//!    is evaluated on first use and memoized as well.
//!
//! 4. Scale domains and ranges are resolved without a row context. A domain
//!    that needs a per-row field fails with `MissingContext`.
//!
//! Passes are independent: nothing is invalidated automatically. After a
//! change, use the downstream closure of the changed node to decide what to
//! evaluate again.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::aggregate;
use super::resolved::{Resolved, RowTransform};
use super::scale::Scale;
use crate::config::EngineConfig;
use crate::error::{ChartError, Result};
use crate::graph::{Graph, Node, NodeId, NodeKind, Operation, Param};
use crate::spec::Row;

/// Evaluate every node of `graph` in topological order.
pub fn evaluate(graph: &Graph, config: &EngineConfig) -> Result<Evaluation> {
    let order = graph.evaluation_order()?;
    Evaluator::new(graph, config).run(&order)
}

/// Memoized results of one evaluation pass.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    values: HashMap<NodeId, Resolved>,
}

impl Evaluation {
    /// The resolved value of a node, if it was evaluated.
    pub fn get(&self, id: NodeId) -> Option<&Resolved> {
        self.values.get(&id)
    }

    /// The value of a node, with or without a row context.
    pub fn value(&self, id: NodeId, row: Option<&Row>) -> Result<Value> {
        self.get(id).ok_or(ChartError::UnknownNode(id))?.value(row)
    }

    /// Whether the node was evaluated in this pass.
    pub fn contains(&self, id: NodeId) -> bool {
        self.values.contains_key(&id)
    }

    /// Number of nodes evaluated in this pass.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Runs a single evaluation pass over a graph.
pub struct Evaluator<'g> {
    graph: &'g Graph,
    config: &'g EngineConfig,
    memo: HashMap<NodeId, Resolved>,
    in_progress: HashSet<NodeId>,
}

impl<'g> Evaluator<'g> {
    pub fn new(graph: &'g Graph, config: &'g EngineConfig) -> Self {
        Self {
            graph,
            config,
            memo: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Evaluate `order` and return the memo table.
    pub fn run(mut self, order: &[NodeId]) -> Result<Evaluation> {
        tracing::info!(nodes = order.len(), "starting evaluation pass");
        for &id in order {
            self.ensure(id)?;
        }
        Ok(Evaluation { values: self.memo })
    }

    /// Make sure `id` has a memoized value.
    fn ensure(&mut self, id: NodeId) -> Result<()> {
        if self.memo.contains_key(&id) {
            return Ok(());
        }
        let graph = self.graph;
        let node = graph.node(id)?;
        if !self.in_progress.insert(id) {
            return Err(ChartError::CyclicDependency(id));
        }

        let resolved = self.compute(node);
        self.in_progress.remove(&id);

        let resolved = resolved?;
        tracing::debug!(node = %id, kind = %node.kind(), "evaluated node");
        self.memo.insert(id, resolved);
        Ok(())
    }

    fn lookup(&mut self, id: NodeId) -> Result<&Resolved> {
        self.ensure(id)?;
        self.memo.get(&id).ok_or(ChartError::UnknownNode(id))
    }

    fn compute(&mut self, node: &'g Node) -> Result<Resolved> {
        match node.kind() {
            NodeKind::Operator => Ok(Resolved::Concrete(
                node.scalar("value").cloned().unwrap_or(Value::Null),
            )),
            NodeKind::Data => Ok(Resolved::Concrete(
                node.scalar("rows").cloned().unwrap_or(Value::Array(Vec::new())),
            )),
            NodeKind::DataManipulation => self.manipulate(node),
            NodeKind::Scale => self.build_scale(node),
            NodeKind::Mark | NodeKind::Render => {
                // Dependencies are still evaluated so the renderer finds them
                // in the memo.
                for dep in node.dependencies() {
                    self.ensure(dep)?;
                }
                Ok(Resolved::Structural)
            }
        }
    }

    fn manipulate(&mut self, node: &'g Node) -> Result<Resolved> {
        let name = node.str_param("operation").unwrap_or_default();
        let operation =
            Operation::from_name(name).ok_or_else(|| ChartError::UnsupportedOperation(name.to_string()))?;

        match operation {
            Operation::CallScale => self.call_scale(node),
            Operation::DistinctValues => {
                self.reduce_rows(node, |rows, field| Value::Array(aggregate::distinct_values(rows, field)))
            }
            Operation::Extent => self.reduce_rows(node, |rows, field| match aggregate::extent(rows, field) {
                Some((lo, hi)) => Value::Array(vec![Value::from(lo), Value::from(hi)]),
                None => Value::Array(vec![Value::Null, Value::Null]),
            }),
            Operation::Max => self.reduce_rows(node, |rows, field| {
                aggregate::max(rows, field).map(Value::from).unwrap_or(Value::Null)
            }),
        }
    }

    /// Apply an aggregation to the rows of the node's `data` input.
    fn reduce_rows(
        &mut self,
        node: &'g Node,
        reduce: impl FnOnce(Vec<&Row>, &str) -> Value,
    ) -> Result<Resolved> {
        let field = required_str(node, "field")?;
        let data = required_node(node, "data")?;
        let rows = self.lookup(data)?.as_concrete().map(rows_of).unwrap_or_default();
        Ok(Resolved::Concrete(reduce(rows, field)))
    }

    fn call_scale(&mut self, node: &'g Node) -> Result<Resolved> {
        let target = required_node(node, "scale")?;
        let scale = self
            .lookup(target)?
            .as_scale()
            .cloned()
            .ok_or_else(|| ChartError::UnsupportedOperation(format!("call_scale on non-scale node {target}")))?;

        if let Some(value) = node.param("value") {
            let input = self.param_value(value)?;
            return Ok(Resolved::Concrete(scale.apply(&input)));
        }
        if let Some(band) = node.scalar("band") {
            let fraction = band.as_f64().unwrap_or(1.0);
            return Ok(Resolved::Concrete(Value::from(scale.bandwidth() * fraction)));
        }
        if let Some(field) = node.str_param("field") {
            return Ok(Resolved::RowTransform(RowTransform::scaled_field(field, scale)));
        }

        Err(ChartError::UnsupportedOperation(
            "call_scale needs a value, band or field".to_string(),
        ))
    }

    fn build_scale(&mut self, node: &'g Node) -> Result<Resolved> {
        let scale_type = required_str(node, "type")?;
        let domain = self.param_value(required(node, "domain")?)?;
        let range = self.param_value(required(node, "range")?)?;
        let scale = Scale::build(scale_type, &domain, &range, &self.config.band)?;
        Ok(Resolved::Scale(Arc::new(scale)))
    }

    /// Resolve a parameter without a row context.
    fn param_value(&mut self, param: &Param) -> Result<Value> {
        match param {
            Param::Scalar(value) => Ok(value.clone()),
            Param::Node(id) => self.lookup(*id)?.value(None),
            Param::List(items) => items
                .iter()
                .map(|item| self.param_value(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Param::Bag(bag) => {
                let mut object = Map::new();
                for (name, item) in bag {
                    object.insert(name.clone(), self.param_value(item)?);
                }
                Ok(Value::Object(object))
            }
        }
    }
}

/// Rows of a resolved dataset value.
pub(crate) fn rows_of(value: &Value) -> Vec<&Row> {
    value
        .as_array()
        .map(|rows| rows.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default()
}

fn required<'n>(node: &'n Node, name: &str) -> Result<&'n Param> {
    node.param(name).ok_or_else(|| missing_param(node, name))
}

fn required_str<'n>(node: &'n Node, name: &str) -> Result<&'n str> {
    node.str_param(name).ok_or_else(|| missing_param(node, name))
}

fn required_node(node: &Node, name: &str) -> Result<NodeId> {
    node.node_param(name).ok_or_else(|| missing_param(node, name))
}

fn missing_param(node: &Node, name: &str) -> ChartError {
    ChartError::UnsupportedOperation(format!(
        "{} node {} is missing parameter `{}`",
        node.kind(),
        node.id(),
        name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{bag, ParamBag};
    use serde_json::json;

    fn rows(value: Value) -> Param {
        Param::Scalar(value)
    }

    fn row(value: Value) -> Row {
        serde_json::from_value(value).unwrap()
    }

    /// width, table, domain, scale, attribute: a linear x scale over `value`.
    fn linear_graph(domain: Param) -> (Graph, NodeId, NodeId) {
        let mut graph = Graph::new();
        let width = graph.add(NodeKind::Operator, bag([("value", 200.0)]));
        let table = graph.add(
            NodeKind::Data,
            bag([("rows", rows(json!([{"value": 0}, {"value": 1}])))]),
        );
        let domain = match domain {
            Param::Scalar(Value::String(operation)) => Param::Node(graph.add(
                NodeKind::DataManipulation,
                bag([
                    ("operation", Param::from(operation.as_str())),
                    ("field", Param::from("value")),
                    ("data", Param::Node(table)),
                ]),
            )),
            other => other,
        };
        let scale = graph.add(
            NodeKind::Scale,
            bag([
                ("type", Param::from("linear")),
                ("domain", domain),
                ("range", Param::List(vec![Param::from(0.0), Param::Node(width)])),
            ]),
        );
        let attribute = graph.add(
            NodeKind::DataManipulation,
            bag([
                ("operation", Param::from(Operation::CallScale)),
                ("field", Param::from("value")),
                ("data", Param::Node(table)),
                ("scale", Param::Node(scale)),
            ]),
        );
        (graph, scale, attribute)
    }

    #[test]
    fn field_attribute_resolves_per_row() {
        let (graph, _, attribute) = linear_graph(Param::from("extent"));
        let evaluation = evaluate(&graph, &EngineConfig::default()).unwrap();

        assert_eq!(evaluation.len(), graph.len());
        assert_eq!(
            evaluation.value(attribute, Some(&row(json!({"value": 0})))).unwrap(),
            json!(0.0)
        );
        assert_eq!(
            evaluation.value(attribute, Some(&row(json!({"value": 1})))).unwrap(),
            json!(200.0)
        );
        assert!(matches!(
            evaluation.value(attribute, None),
            Err(ChartError::MissingContext { .. })
        ));
    }

    #[test]
    fn aggregations_produce_concrete_values() {
        let mut graph = Graph::new();
        let table = graph.add(
            NodeKind::Data,
            bag([("rows", rows(json!([{"k": "a", "v": 4}, {"k": "b", "v": -1}, {"k": "a", "v": 2}])))]),
        );
        let mut add_aggregate = |operation: Operation, field: &str| {
            graph.add(
                NodeKind::DataManipulation,
                bag([
                    ("operation", Param::from(operation)),
                    ("field", Param::from(field)),
                    ("data", Param::Node(table)),
                ]),
            )
        };
        let distinct = add_aggregate(Operation::DistinctValues, "k");
        let extent = add_aggregate(Operation::Extent, "v");
        let max = add_aggregate(Operation::Max, "v");
        let empty = add_aggregate(Operation::Max, "missing");

        let evaluation = evaluate(&graph, &EngineConfig::default()).unwrap();
        assert_eq!(evaluation.value(distinct, None).unwrap(), json!(["a", "b"]));
        assert_eq!(evaluation.value(extent, None).unwrap(), json!([-1.0, 4.0]));
        assert_eq!(evaluation.value(max, None).unwrap(), json!(4.0));
        assert_eq!(evaluation.value(empty, None).unwrap(), Value::Null);
    }

    #[test]
    fn literal_and_band_invocations_are_context_free() {
        let mut graph = Graph::new();
        let width = graph.add(NodeKind::Operator, bag([("value", 100.0)]));
        let table = graph.add(
            NodeKind::Data,
            bag([("rows", rows(json!([{"k": "a"}, {"k": "b"}])))]),
        );
        let domain = graph.add(
            NodeKind::DataManipulation,
            bag([
                ("operation", Param::from(Operation::DistinctValues)),
                ("field", Param::from("k")),
                ("data", Param::Node(table)),
            ]),
        );
        let scale = graph.add(
            NodeKind::Scale,
            bag([
                ("type", Param::from("band")),
                ("domain", Param::Node(domain)),
                ("range", Param::List(vec![Param::from(0.0), Param::Node(width)])),
            ]),
        );
        let call = |input: (&str, Param)| {
            let mut params = ParamBag::new();
            params.insert("operation".into(), Operation::CallScale.into());
            params.insert(input.0.into(), input.1);
            params.insert("scale".into(), Param::Node(scale));
            params
        };
        let literal = graph.add(NodeKind::DataManipulation, call(("value", Param::from("b"))));
        let band = graph.add(NodeKind::DataManipulation, call(("band", Param::from(0.5))));

        let config = EngineConfig::from_json(r#"{"band": {"padding_inner": 0, "padding_outer": 0}}"#).unwrap();
        let evaluation = evaluate(&graph, &config).unwrap();
        assert_eq!(evaluation.value(literal, None).unwrap(), json!(50.0));
        assert_eq!(evaluation.value(band, None).unwrap(), json!(25.0));
        assert!(evaluation.get(scale).unwrap().as_scale().is_some());
    }

    #[test]
    fn domain_needing_a_row_is_missing_context() {
        let mut graph = Graph::new();
        let width = graph.add(NodeKind::Operator, bag([("value", 10.0)]));
        let inner = graph.add(
            NodeKind::Scale,
            bag([
                ("type", Param::from("linear")),
                ("domain", Param::List(vec![Param::from(0.0), Param::from(1.0)])),
                ("range", Param::List(vec![Param::from(0.0), Param::Node(width)])),
            ]),
        );
        let per_row = graph.add(
            NodeKind::DataManipulation,
            bag([
                ("operation", Param::from(Operation::CallScale)),
                ("field", Param::from("v")),
                ("scale", Param::Node(inner)),
            ]),
        );
        graph.add(
            NodeKind::Scale,
            bag([
                ("type", Param::from("linear")),
                ("domain", Param::List(vec![Param::from(0.0), Param::Node(per_row)])),
                ("range", Param::List(vec![Param::from(0.0), Param::Node(width)])),
            ]),
        );

        assert!(matches!(
            evaluate(&graph, &EngineConfig::default()),
            Err(ChartError::MissingContext { field }) if field == "v"
        ));
    }

    #[test]
    fn unsupported_scale_and_operation() {
        let (graph, _, _) = linear_graph(Param::from("median"));
        assert!(matches!(
            evaluate(&graph, &EngineConfig::default()),
            Err(ChartError::UnsupportedOperation(name)) if name == "median"
        ));

        let mut graph = Graph::new();
        graph.add(
            NodeKind::Scale,
            bag([
                ("type", Param::from("log")),
                ("domain", Param::List(vec![Param::from(1.0), Param::from(10.0)])),
                ("range", Param::List(vec![Param::from(0.0), Param::from(1.0)])),
            ]),
        );
        assert!(matches!(
            evaluate(&graph, &EngineConfig::default()),
            Err(ChartError::UnsupportedScaleType(name)) if name == "log"
        ));
    }

    #[test]
    fn dependencies_outside_the_order_are_pulled_in_once() {
        let (graph, scale, attribute) = linear_graph(Param::from("extent"));
        let evaluation = Evaluator::new(&graph, &EngineConfig::default())
            .run(&[attribute])
            .unwrap();

        assert!(evaluation.contains(scale));
        assert_eq!(evaluation.len(), graph.len());
    }

    #[test]
    fn cycle_met_during_evaluation_fails() {
        let mut graph = Graph::new();
        let second = NodeId::from(1);
        let first = graph.add(NodeKind::Mark, bag([("next", second)]));
        graph.add(NodeKind::Mark, bag([("next", first)]));

        let result = Evaluator::new(&graph, &EngineConfig::default()).run(&[first]);
        assert!(matches!(result, Err(ChartError::CyclicDependency(id)) if id == first));
    }

    #[test]
    fn repeated_passes_are_independent() {
        let (graph, _, attribute) = linear_graph(Param::from("extent"));
        let config = EngineConfig::default();
        let first = evaluate(&graph, &config).unwrap();
        let second = evaluate(&graph, &config).unwrap();

        let context = row(json!({"value": 0.5}));
        assert_eq!(
            first.value(attribute, Some(&context)).unwrap(),
            second.value(attribute, Some(&context)).unwrap()
        );
    }

    #[test]
    fn dangling_reference_is_unknown_node() {
        let mut graph = Graph::new();
        graph.add(NodeKind::Render, bag([("width", NodeId::from(9))]));
        assert!(matches!(
            evaluate(&graph, &EngineConfig::default()),
            Err(ChartError::UnknownNode(id)) if id == NodeId::from(9)
        ));
    }
}
