//! Resolved node values.

use std::fmt::{self, Debug};
use std::sync::Arc;

use serde_json::Value;

use super::scale::Scale;
use crate::error::{ChartError, Result};
use crate::spec::Row;

/// The result of evaluating one node.
#[derive(Clone)]
pub enum Resolved {
    /// A value that does not depend on any row.
    Concrete(Value),

    /// A value computed per row, e.g. a field passed through a scale.
    RowTransform(RowTransform),

    /// A constructed scale transform.
    Scale(Arc<Scale>),

    /// Marks and the render root carry no data-level value.
    Structural,
}

impl Resolved {
    /// The value for `row`, or the context-free value when `row` is `None`.
    ///
    /// Row transforms fail with [`ChartError::MissingContext`] without a row.
    /// Scales and structural nodes have no value and yield `null`.
    pub fn value(&self, row: Option<&Row>) -> Result<Value> {
        match self {
            Resolved::Concrete(value) => Ok(value.clone()),
            Resolved::RowTransform(transform) => match row {
                Some(row) => Ok(transform.apply(row)),
                None => Err(ChartError::MissingContext {
                    field: transform.field().to_string(),
                }),
            },
            Resolved::Scale(_) | Resolved::Structural => Ok(Value::Null),
        }
    }

    pub fn as_concrete(&self) -> Option<&Value> {
        match self {
            Resolved::Concrete(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_scale(&self) -> Option<&Arc<Scale>> {
        match self {
            Resolved::Scale(scale) => Some(scale),
            _ => None,
        }
    }

    /// Whether evaluating this value needs a row.
    pub fn needs_row(&self) -> bool {
        matches!(self, Resolved::RowTransform(_))
    }
}

impl Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Concrete(value) => f.debug_tuple("Concrete").field(value).finish(),
            Resolved::RowTransform(transform) => f.debug_tuple("RowTransform").field(transform).finish(),
            Resolved::Scale(scale) => f.debug_tuple("Scale").field(&scale.kind()).finish(),
            Resolved::Structural => f.write_str("Structural"),
        }
    }
}

/// A per-row computation reading one field.
#[derive(Clone)]
pub struct RowTransform {
    /// Field read from each row.
    field: String,

    /// The computation, given the whole row.
    transform: Arc<dyn Fn(&Row) -> Value + Send + Sync>,
}

impl RowTransform {
    pub fn new<F>(field: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&Row) -> Value + Send + Sync + 'static,
    {
        Self {
            field: field.into(),
            transform: Arc::new(transform),
        }
    }

    /// Read `field` from each row and pass it through `scale`. Rows without
    /// the field pass `null`.
    pub fn scaled_field(field: impl Into<String>, scale: Arc<Scale>) -> Self {
        let field = field.into();
        let key = field.clone();
        Self::new(field, move |row: &Row| {
            scale.apply(row.get(&key).unwrap_or(&Value::Null))
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn apply(&self, row: &Row) -> Value {
        (self.transform)(row)
    }
}

impl Debug for RowTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowTransform")
            .field("field", &self.field)
            .finish_non_exhaustive()
    }
}
