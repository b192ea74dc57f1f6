//! Rendering
//!
//! Hands an evaluated chart to a drawing surface.
//!
//! [`ChartOutput`] is what the engine produces: the resolved dimensions and
//! one [`MarkDescriptor`] per mark. [`draw`] walks it and drives any
//! [`RenderSurface`], instantiating one primitive per row of each mark and
//! resolving every encoded attribute with that row as context.
//!
//! A second coordinate (`x2`, `y2`) paired with its first coordinate (`x`,
//! `y`) is emitted as a length (`width`, `height`) instead. This is a drawing
//! convention and never shows up in the graph.

pub mod svg;

use serde_json::Value;

use crate::error::{ChartError, Result};
use crate::eval::{Evaluation, Resolved};
use crate::graph::{Graph, NodeId, Param};
use crate::spec::{ChartGraph, Row};

pub use svg::SvgSurface;

/// A target that primitives can be drawn onto.
pub trait RenderSurface {
    /// Called once before any primitive, with the drawing area size.
    fn begin(&mut self, width: f64, height: f64);

    /// Start a new primitive of the given type (`rect`, `circle`, ...).
    /// Subsequent attributes apply to it.
    fn push_primitive(&mut self, primitive: &str);

    /// Set an attribute on the current primitive.
    fn set_attribute(&mut self, name: &str, value: &Value);

    /// Called once after the last primitive.
    fn finish(&mut self) {}
}

/// The evaluated chart, ready for drawing.
#[derive(Debug, Clone)]
pub struct ChartOutput {
    pub width: f64,
    pub height: f64,
    pub marks: Vec<MarkDescriptor>,
}

/// One evaluated mark.
#[derive(Debug, Clone)]
pub struct MarkDescriptor {
    /// Primitive type drawn once per row.
    pub primitive: String,
    /// Rows of the source dataset.
    pub rows: Vec<Row>,
    /// Attribute name and its resolved value, in encoding order.
    pub attributes: Vec<(String, Resolved)>,
}

impl MarkDescriptor {
    /// Resolve an attribute for one row.
    pub fn attribute(&self, name: &str, row: &Row) -> Option<Result<Value>> {
        self.attributes
            .iter()
            .find(|(attribute, _)| attribute == name)
            .map(|(_, resolved)| resolved.value(Some(row)))
    }
}

impl ChartOutput {
    /// Collect the output of an evaluated chart.
    pub fn collect(chart: &ChartGraph, evaluation: &Evaluation) -> Result<Self> {
        Self::from_render_node(chart.graph(), chart.render(), evaluation)
    }

    /// Collect the output reachable from a render node.
    pub fn from_render_node(graph: &Graph, render: NodeId, evaluation: &Evaluation) -> Result<Self> {
        let node = graph.node(render)?;
        let width = dimension(node.node_param("width"), evaluation, "width")?;
        let height = dimension(node.node_param("height"), evaluation, "height")?;

        let marks = match node.param("marks") {
            Some(Param::List(marks)) => marks
                .iter()
                .filter_map(Param::as_node)
                .map(|mark| mark_descriptor(graph, mark, evaluation))
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };

        Ok(Self { width, height, marks })
    }
}

fn dimension(node: Option<NodeId>, evaluation: &Evaluation, name: &'static str) -> Result<f64> {
    let node = node.ok_or(ChartError::MissingDimension(name))?;
    evaluation
        .value(node, None)?
        .as_f64()
        .ok_or(ChartError::MissingDimension(name))
}

fn mark_descriptor(graph: &Graph, mark: NodeId, evaluation: &Evaluation) -> Result<MarkDescriptor> {
    let node = graph.node(mark)?;
    let primitive = node.str_param("type").unwrap_or_default().to_string();

    let rows = match node.node_param("data") {
        Some(data) => match evaluation.value(data, None)? {
            Value::Array(rows) => rows
                .into_iter()
                .filter_map(|row| match row {
                    Value::Object(row) => Some(row),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        },
        None => Vec::new(),
    };

    let mut attributes = Vec::new();
    if let Some(Param::List(entries)) = node.param("attributes") {
        for entry in entries {
            let Param::Bag(entry) = entry else { continue };
            let name = entry.get("name").and_then(Param::as_scalar).and_then(Value::as_str);
            let value = entry.get("value").and_then(Param::as_node);
            if let (Some(name), Some(value)) = (name, value) {
                let resolved = evaluation.get(value).ok_or(ChartError::UnknownNode(value))?;
                attributes.push((name.to_string(), resolved.clone()));
            }
        }
    }

    Ok(MarkDescriptor {
        primitive,
        rows,
        attributes,
    })
}

/// Draw an evaluated chart onto `surface`.
pub fn draw<S: RenderSurface + ?Sized>(output: &ChartOutput, surface: &mut S) -> Result<()> {
    surface.begin(output.width, output.height);

    for mark in &output.marks {
        tracing::debug!(primitive = %mark.primitive, rows = mark.rows.len(), "drawing mark");
        for row in &mark.rows {
            surface.push_primitive(&mark.primitive);
            for (name, resolved) in &mark.attributes {
                let value = resolved.value(Some(row))?;
                match paired_length(name) {
                    Some((first, length)) => match mark.attribute(first, row).transpose()? {
                        Some(start) => surface.set_attribute(length, &difference(&value, &start)),
                        None => surface.set_attribute(name, &value),
                    },
                    None => surface.set_attribute(name, &value),
                }
            }
        }
    }

    surface.finish();
    Ok(())
}

/// For a second coordinate, the first coordinate it pairs with and the
/// length attribute that replaces it.
fn paired_length(name: &str) -> Option<(&'static str, &'static str)> {
    match name {
        "x2" => Some(("x", "width")),
        "y2" => Some(("y", "height")),
        _ => None,
    }
}

fn difference(end: &Value, start: &Value) -> Value {
    match (end.as_f64(), start.as_f64()) {
        (Some(end), Some(start)) => Value::from(end - start),
        _ => Value::Null,
    }
}
