//! Chart Specification
//!
//! The declarative input document: dimensions, datasets, scales and marks.
//! Only the shape is modelled here; [`builder`] turns a specification into a
//! computation graph and performs the presence checks the graph needs.
//!
//! ```json
//! {
//!   "width": 200,
//!   "height": 100,
//!   "data": [{ "name": "table", "rows": [{ "value": 0 }, { "value": 1 }] }],
//!   "scales": [{
//!     "name": "x", "type": "linear",
//!     "domain": { "data": "table", "field": "value" },
//!     "range": "width"
//!   }],
//!   "marks": [{
//!     "type": "circle",
//!     "from": { "data": "table" },
//!     "encode": { "cx": { "scale": "x", "field": "value" }, "r": { "value": 2 } }
//!   }]
//! }
//! ```

pub mod builder;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

pub use builder::{parse, ChartGraph, GraphBuilder};

/// A single data row: field name to value.
pub type Row = Map<String, Value>;

/// A complete chart specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    /// Width of the drawing area. Required.
    #[serde(default)]
    pub width: Option<f64>,

    /// Height of the drawing area. Required.
    #[serde(default)]
    pub height: Option<f64>,

    /// Named datasets.
    #[serde(default)]
    pub data: Vec<DataSpec>,

    /// Named scales.
    #[serde(default)]
    pub scales: Vec<ScaleSpec>,

    /// Marks, drawn in order.
    #[serde(default)]
    pub marks: Vec<MarkSpec>,
}

impl Specification {
    /// Parse a specification from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Create a specification with just dimensions.
    pub fn with_size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }
}

/// A named, ordered collection of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSpec {
    pub name: String,
    #[serde(default, alias = "values")]
    pub rows: Vec<Row>,
}

/// A scale definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleSpec {
    pub name: String,

    /// Scale type, e.g. `linear` or `band`.
    #[serde(rename = "type")]
    pub scale_type: String,

    /// Where the domain comes from.
    pub domain: DomainSpec,

    /// Which dimension the range spans: `width` or `height`.
    pub range: String,

    /// Anchor the domain at zero. Defaults to true for linear, sqrt and pow
    /// scales.
    #[serde(default)]
    pub zero: Option<bool>,
}

impl ScaleSpec {
    /// Whether the domain should start at zero.
    pub fn zero_anchored(&self) -> bool {
        self.zero
            .unwrap_or_else(|| matches!(self.scale_type.as_str(), "linear" | "sqrt" | "pow"))
    }
}

/// A field of a named dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainSpec {
    pub data: String,
    pub field: String,
}

/// A visual mark instantiated once per row of its source data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkSpec {
    /// Primitive type, e.g. `rect` or `circle`.
    #[serde(rename = "type")]
    pub mark_type: String,

    pub from: FromSpec,

    /// Attribute name to encoding, in document order.
    #[serde(default)]
    pub encode: IndexMap<String, EncodeEntry>,
}

/// Source dataset of a mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FromSpec {
    pub data: String,
}

/// How one attribute of a mark is computed.
///
/// Without a scale the entry is a literal `value`. With a scale it is a
/// scale invocation on a literal `value`, on a per-row `field`, or a
/// `band` width request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodeEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Fraction of the bandwidth; `true` means the whole band.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_document() {
        let spec = Specification::from_json(
            r#"{
                "width": 200,
                "height": 100,
                "data": [{"name": "table", "values": [{"value": 0}, {"value": 1}]}],
                "scales": [{
                    "name": "x", "type": "linear",
                    "domain": {"data": "table", "field": "value"},
                    "range": "width"
                }],
                "marks": [{
                    "type": "circle",
                    "from": {"data": "table"},
                    "encode": {
                        "cy": {"value": 1},
                        "cx": {"scale": "x", "field": "value"}
                    }
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(spec.width, Some(200.0));
        assert_eq!(spec.data[0].rows.len(), 2);
        assert!(spec.scales[0].zero_anchored());

        let attributes: Vec<&str> = spec.marks[0].encode.keys().map(String::as_str).collect();
        assert_eq!(attributes, vec!["cy", "cx"]);
        assert_eq!(spec.marks[0].encode["cx"].field.as_deref(), Some("value"));
    }

    #[test]
    fn encoding_order_survives_value_input() {
        let mark: MarkSpec = serde_json::from_value(serde_json::json!({
            "type": "rect",
            "from": {"data": "table"},
            "encode": {
                "y": {"value": 0},
                "x": {"value": 1},
                "fill": {"value": "red"},
                "width": {"value": 2}
            }
        }))
        .unwrap();

        let attributes: Vec<&str> = mark.encode.keys().map(String::as_str).collect();
        assert_eq!(attributes, vec!["y", "x", "fill", "width"]);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let spec = Specification::from_json(r#"{"height": 10}"#).unwrap();
        assert_eq!(spec.width, None);
        assert!(spec.data.is_empty());
        assert!(spec.scales.is_empty());
        assert!(spec.marks.is_empty());
    }

    #[test]
    fn zero_anchoring_defaults_by_type() {
        let scale = |scale_type: &str, zero: Option<bool>| ScaleSpec {
            name: "s".into(),
            scale_type: scale_type.into(),
            domain: DomainSpec {
                data: "d".into(),
                field: "f".into(),
            },
            range: "width".into(),
            zero,
        };

        assert!(scale("linear", None).zero_anchored());
        assert!(scale("sqrt", None).zero_anchored());
        assert!(scale("pow", None).zero_anchored());
        assert!(!scale("band", None).zero_anchored());
        assert!(!scale("log", None).zero_anchored());
        assert!(!scale("linear", Some(false)).zero_anchored());
        assert!(scale("band", Some(true)).zero_anchored());
    }

    #[test]
    fn wrong_shape_is_a_parse_error() {
        assert!(Specification::from_json(r#"{"width": "wide"}"#).is_err());
    }
}
