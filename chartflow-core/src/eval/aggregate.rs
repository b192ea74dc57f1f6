//! Field aggregation over row collections.
//!
//! Missing fields and non-numeric values are skipped by the numeric helpers.
//! Numeric strings count as numbers, matching how scales read their input.

use serde_json::Value;

use crate::spec::Row;

/// Distinct values of `field`, in first-occurrence order. Rows without the
/// field are skipped.
pub fn distinct_values<'a, I>(rows: I, field: &str) -> Vec<Value>
where
    I: IntoIterator<Item = &'a Row>,
{
    let mut values: Vec<Value> = Vec::new();
    for value in rows.into_iter().filter_map(|row| row.get(field)) {
        if !value.is_null() && !values.contains(value) {
            values.push(value.clone());
        }
    }
    values
}

/// `(min, max)` of the numeric values of `field`, or `None` if there are none.
pub fn extent<'a, I>(rows: I, field: &str) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = &'a Row>,
{
    numbers(rows, field).into_iter().fold(None, |acc, n| match acc {
        None => Some((n, n)),
        Some((lo, hi)) => Some((lo.min(n), hi.max(n))),
    })
}

/// Maximum of the numeric values of `field`, or `None` if there are none.
pub fn max<'a, I>(rows: I, field: &str) -> Option<f64>
where
    I: IntoIterator<Item = &'a Row>,
{
    numbers(rows, field).into_iter().reduce(f64::max)
}

/// Numeric reading of a value; numeric strings are accepted.
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn numbers<'a, I>(rows: I, field: &str) -> Vec<f64>
where
    I: IntoIterator<Item = &'a Row>,
{
    rows.into_iter()
        .filter_map(|row| row.get(field))
        .filter_map(number)
        .filter(|n| !n.is_nan())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn extent_and_max_skip_non_numeric() {
        let rows = rows(json!([
            {"v": 3}, {"v": -2.5}, {"v": "x"}, {"w": 100}, {"v": null}, {"v": 7}
        ]));
        assert_eq!(extent(&rows, "v"), Some((-2.5, 7.0)));
        assert_eq!(max(&rows, "v"), Some(7.0));
    }

    #[test]
    fn numeric_strings_count_as_numbers() {
        let rows = rows(json!([{"v": "0"}, {"v": " 12.5 "}, {"v": "abc"}, {"v": 4}]));
        assert_eq!(extent(&rows, "v"), Some((0.0, 12.5)));
        assert_eq!(max(&rows, "v"), Some(12.5));
        assert_eq!(number(&json!(true)), None);
    }

    #[test]
    fn empty_input_has_no_extent() {
        let rows = rows(json!([{"v": "a"}]));
        assert_eq!(extent(&rows, "v"), None);
        assert_eq!(max(&rows, "v"), None);
        assert_eq!(extent(&[], "v"), None);
    }

    #[test]
    fn distinct_values_keep_first_occurrence_order() {
        let rows = rows(json!([
            {"k": "b"}, {"k": "a"}, {"k": "b"}, {"k": 1}, {"other": "z"}, {"k": "a"}
        ]));
        assert_eq!(
            distinct_values(&rows, "k"),
            vec![json!("b"), json!("a"), json!(1)]
        );
    }
}
