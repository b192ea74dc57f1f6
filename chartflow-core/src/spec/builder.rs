//! Graph Builder
//!
//! Walks a [`Specification`] and allocates the nodes it describes. Nothing is
//! evaluated here; the builder only wires structure.
//!
//! Nodes are created in a fixed order: width, height, datasets, scales,
//! marks, and finally the render node. Scales look up datasets and marks look
//! up datasets and scales by name, so every name must be defined by an
//! earlier section.

use indexmap::IndexMap;
use serde_json::Value;

use super::{EncodeEntry, MarkSpec, ScaleSpec, Specification};
use crate::error::{ChartError, Result};
use crate::graph::{bag, Graph, NodeId, NodeKind, Operation, Param, ParamBag};

/// Build the computation graph for a specification.
pub fn parse(spec: &Specification) -> Result<ChartGraph> {
    GraphBuilder::build(spec)
}

/// A built graph together with handles to its well-known nodes.
#[derive(Debug, Clone)]
pub struct ChartGraph {
    graph: Graph,
    width: NodeId,
    height: NodeId,
    render: NodeId,
    datasets: IndexMap<String, NodeId>,
    scales: IndexMap<String, NodeId>,
    marks: Vec<NodeId>,
}

impl ChartGraph {
    /// The node arena.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The width literal.
    pub fn width(&self) -> NodeId {
        self.width
    }

    /// The height literal.
    pub fn height(&self) -> NodeId {
        self.height
    }

    /// The render root, created last.
    pub fn render(&self) -> NodeId {
        self.render
    }

    /// Mark nodes in specification order.
    pub fn marks(&self) -> &[NodeId] {
        &self.marks
    }

    /// The data node of a named dataset.
    pub fn dataset(&self, name: &str) -> Option<NodeId> {
        self.datasets.get(name).copied()
    }

    /// The scale node of a named scale.
    pub fn scale(&self, name: &str) -> Option<NodeId> {
        self.scales.get(name).copied()
    }

    /// All nodes in topological order.
    pub fn evaluation_order(&self) -> Result<Vec<NodeId>> {
        self.graph.evaluation_order()
    }

    /// Nodes affected by a change to `node`, in topological order.
    pub fn downstream_of(&self, node: NodeId) -> Result<Vec<NodeId>> {
        self.graph.downstream_of(node)
    }
}

/// Incrementally allocates the nodes of one specification.
pub struct GraphBuilder {
    graph: Graph,
    width: NodeId,
    height: NodeId,
    datasets: IndexMap<String, NodeId>,
    scales: IndexMap<String, NodeId>,
    marks: Vec<NodeId>,
}

impl GraphBuilder {
    /// Build the whole graph for `spec`.
    pub fn build(spec: &Specification) -> Result<ChartGraph> {
        let width = spec.width.ok_or(ChartError::MissingDimension("width"))?;
        let height = spec.height.ok_or(ChartError::MissingDimension("height"))?;

        let mut builder = Self::new(width, height);
        for dataset in &spec.data {
            builder.add_dataset(&dataset.name, &dataset.rows)?;
        }
        for scale in &spec.scales {
            builder.add_scale(scale)?;
        }
        for mark in &spec.marks {
            builder.add_mark(mark)?;
        }

        let chart = builder.finish();
        tracing::info!(
            nodes = chart.graph.len(),
            datasets = chart.datasets.len(),
            scales = chart.scales.len(),
            marks = chart.marks.len(),
            "built chart graph"
        );
        Ok(chart)
    }

    /// Start a graph holding only the two dimension literals.
    pub fn new(width: f64, height: f64) -> Self {
        let mut graph = Graph::new();
        let width = graph.add(NodeKind::Operator, bag([("value", width)]));
        let height = graph.add(NodeKind::Operator, bag([("value", height)]));
        Self {
            graph,
            width,
            height,
            datasets: IndexMap::new(),
            scales: IndexMap::new(),
            marks: Vec::new(),
        }
    }

    /// Add a dataset node holding `rows`.
    pub fn add_dataset(&mut self, name: &str, rows: &[super::Row]) -> Result<NodeId> {
        if self.datasets.contains_key(name) {
            return Err(ChartError::DuplicateName {
                kind: "dataset",
                name: name.to_string(),
            });
        }

        let rows = Value::Array(rows.iter().cloned().map(Value::Object).collect());
        let id = self.graph.add(
            NodeKind::Data,
            bag([("name", Param::from(name)), ("rows", Param::Scalar(rows))]),
        );
        self.datasets.insert(name.to_string(), id);
        Ok(id)
    }

    /// Add a scale node and the node computing its domain.
    pub fn add_scale(&mut self, scale: &ScaleSpec) -> Result<NodeId> {
        if self.scales.contains_key(&scale.name) {
            return Err(ChartError::DuplicateName {
                kind: "scale",
                name: scale.name.clone(),
            });
        }

        let range = match scale.range.as_str() {
            "width" => Param::List(vec![Param::from(0.0), Param::Node(self.width)]),
            "height" => Param::List(vec![Param::Node(self.height), Param::from(0.0)]),
            other => {
                return Err(ChartError::InvalidRange {
                    scale: scale.name.clone(),
                    range: other.to_string(),
                })
            }
        };

        let data = self.lookup_dataset(&scale.domain.data)?;
        let domain = if scale.scale_type == "band" {
            Param::Node(self.aggregate(Operation::DistinctValues, &scale.domain.field, data))
        } else if scale.zero_anchored() {
            // Assumes the field is non-negative; a negative maximum yields a
            // reversed domain.
            let max = self.aggregate(Operation::Max, &scale.domain.field, data);
            Param::List(vec![Param::from(0.0), Param::Node(max)])
        } else {
            Param::Node(self.aggregate(Operation::Extent, &scale.domain.field, data))
        };

        let id = self.graph.add(
            NodeKind::Scale,
            bag([
                ("name", Param::from(scale.name.as_str())),
                ("type", Param::from(scale.scale_type.as_str())),
                ("domain", domain),
                ("range", range),
            ]),
        );
        self.scales.insert(scale.name.clone(), id);
        Ok(id)
    }

    /// Add a mark node and one node per encoded attribute.
    pub fn add_mark(&mut self, mark: &MarkSpec) -> Result<NodeId> {
        let data = self.lookup_dataset(&mark.from.data)?;

        let mut attributes = Vec::with_capacity(mark.encode.len());
        for (name, entry) in &mark.encode {
            let value = self.add_attribute(mark, name, entry, data)?;
            attributes.push(Param::Bag(bag([
                ("name", Param::from(name.as_str())),
                ("value", Param::Node(value)),
            ])));
        }

        let id = self.graph.add(
            NodeKind::Mark,
            bag([
                ("type", Param::from(mark.mark_type.as_str())),
                ("data", Param::Node(data)),
                ("attributes", Param::List(attributes)),
            ]),
        );
        self.marks.push(id);
        Ok(id)
    }

    /// Append the render node and hand back the finished chart.
    pub fn finish(mut self) -> ChartGraph {
        let marks = self.marks.iter().copied().map(Param::Node).collect();
        let render = self.graph.add(
            NodeKind::Render,
            bag([
                ("marks", Param::List(marks)),
                ("width", Param::Node(self.width)),
                ("height", Param::Node(self.height)),
            ]),
        );

        ChartGraph {
            graph: self.graph,
            width: self.width,
            height: self.height,
            render,
            datasets: self.datasets,
            scales: self.scales,
            marks: self.marks,
        }
    }

    fn add_attribute(
        &mut self,
        mark: &MarkSpec,
        name: &str,
        entry: &EncodeEntry,
        data: NodeId,
    ) -> Result<NodeId> {
        let invalid = || ChartError::InvalidEncoding {
            mark: mark.mark_type.clone(),
            attribute: name.to_string(),
        };

        let Some(scale_name) = &entry.scale else {
            let value = entry.value.clone().ok_or_else(invalid)?;
            return Ok(self.graph.add(NodeKind::Operator, bag([("value", Param::Scalar(value))])));
        };

        let scale = self.lookup_scale(scale_name)?;
        let input = if let Some(value) = &entry.value {
            ("value", Param::Scalar(value.clone()))
        } else if let Some(band) = &entry.band {
            let fraction = match band {
                Value::Bool(true) => 1.0,
                other => other.as_f64().ok_or_else(invalid)?,
            };
            ("band", Param::from(fraction))
        } else if let Some(field) = &entry.field {
            ("field", Param::from(field.as_str()))
        } else {
            return Err(invalid());
        };

        let mut params = ParamBag::new();
        params.insert("operation".into(), Operation::CallScale.into());
        params.insert(input.0.into(), input.1);
        params.insert("data".into(), Param::Node(data));
        params.insert("scale".into(), Param::Node(scale));
        Ok(self.graph.add(NodeKind::DataManipulation, params))
    }

    fn aggregate(&mut self, operation: Operation, field: &str, data: NodeId) -> NodeId {
        self.graph.add(
            NodeKind::DataManipulation,
            bag([
                ("operation", Param::from(operation)),
                ("field", Param::from(field)),
                ("data", Param::Node(data)),
            ]),
        )
    }

    fn lookup_dataset(&self, name: &str) -> Result<NodeId> {
        self.datasets
            .get(name)
            .copied()
            .ok_or_else(|| ChartError::UnknownReference {
                kind: "dataset",
                name: name.to_string(),
            })
    }

    fn lookup_scale(&self, name: &str) -> Result<NodeId> {
        self.scales
            .get(name)
            .copied()
            .ok_or_else(|| ChartError::UnknownReference {
                kind: "scale",
                name: name.to_string(),
            })
    }
}
