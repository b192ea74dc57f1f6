//! Scale Construction
//!
//! Turns a resolved domain and range into a callable transform. Two scale
//! types are supported:
//!
//! - linear: interpolates a numeric domain interval onto the range
//! - band: splits the range into equal bands, one per domain value
//!
//! Band layout follows the usual inner/outer padding model: the range is cut
//! into `n - inner + 2 * outer` steps, bands are `step * (1 - inner)` wide and
//! leftover space is distributed according to `align`.

use serde_json::Value;

use super::aggregate::number;
use crate::config::BandConfig;
use crate::error::{ChartError, Result};

/// The supported scale types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleKind {
    Linear,
    Band,
}

impl ScaleKind {
    /// Parse a scale type name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "linear" => Ok(ScaleKind::Linear),
            "band" => Ok(ScaleKind::Band),
            other => Err(ChartError::UnsupportedScaleType(other.to_string())),
        }
    }
}

/// A constructed scale transform.
#[derive(Debug, Clone, PartialEq)]
pub enum Scale {
    Linear(LinearScale),
    Band(BandScale),
}

impl Scale {
    /// Build a scale of the named type from resolved domain and range values.
    pub fn build(scale_type: &str, domain: &Value, range: &Value, band: &BandConfig) -> Result<Self> {
        let range = interval(range, "range")?;
        match ScaleKind::from_name(scale_type)? {
            ScaleKind::Linear => Ok(Scale::Linear(LinearScale::new(linear_domain(domain)?, range))),
            ScaleKind::Band => {
                let domain = domain.as_array().ok_or_else(|| ChartError::InvalidDomain {
                    reason: format!("band domain must be a list, got {domain}"),
                })?;
                Ok(Scale::Band(BandScale::new(domain.clone(), range, band)))
            }
        }
    }

    /// Map a domain value to the range. Values the scale cannot place map to
    /// `null`.
    pub fn apply(&self, input: &Value) -> Value {
        let mapped = match self {
            Scale::Linear(scale) => number(input).map(|x| scale.apply(x)),
            Scale::Band(scale) => scale.apply(input),
        };
        mapped.map(Value::from).unwrap_or(Value::Null)
    }

    /// Width of one band; zero for continuous scales.
    pub fn bandwidth(&self) -> f64 {
        match self {
            Scale::Linear(_) => 0.0,
            Scale::Band(scale) => scale.bandwidth(),
        }
    }

    pub fn kind(&self) -> ScaleKind {
        match self {
            Scale::Linear(_) => ScaleKind::Linear,
            Scale::Band(_) => ScaleKind::Band,
        }
    }
}

/// Linear interpolation from a numeric domain onto a numeric range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// Map `x`. A zero-width domain maps everything to the middle of the range.
    pub fn apply(&self, x: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        let t = if span == 0.0 { 0.5 } else { (x - d0) / span };
        r0 * (1.0 - t) + r1 * t
    }
}

/// Evenly spaced bands, one per domain value.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    domain: Vec<Value>,
    starts: Vec<f64>,
    bandwidth: f64,
    step: f64,
}

impl BandScale {
    pub fn new(domain: Vec<Value>, range: (f64, f64), config: &BandConfig) -> Self {
        let n = domain.len() as f64;
        let inner = config.padding_inner.clamp(0.0, 1.0);
        let outer = config.padding_outer.max(0.0);
        let reversed = range.1 < range.0;
        let (mut start, stop) = if reversed { (range.1, range.0) } else { range };

        let step = (stop - start) / (n - inner + outer * 2.0).max(1.0);
        start += (stop - start - step * (n - inner)) * config.align;
        let bandwidth = step * (1.0 - inner);

        let mut starts: Vec<f64> = (0..domain.len()).map(|i| start + step * i as f64).collect();
        if reversed {
            starts.reverse();
        }

        Self {
            domain,
            starts,
            bandwidth,
            step,
        }
    }

    /// Start of the band for `input`, if it is part of the domain.
    pub fn apply(&self, input: &Value) -> Option<f64> {
        self.domain
            .iter()
            .position(|value| value == input)
            .map(|index| self.starts[index])
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Distance between the starts of adjacent bands.
    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn domain(&self) -> &[Value] {
        &self.domain
    }
}

/// A linear domain. Missing ends (an aggregate over no numeric rows) collapse
/// onto the known end, or onto zero when both are missing.
fn linear_domain(value: &Value) -> Result<(f64, f64)> {
    match value.as_array().map(Vec::as_slice) {
        Some([Value::Null, Value::Null]) => Ok((0.0, 0.0)),
        Some([Value::Null, end]) | Some([end, Value::Null]) => {
            let end = number(end).ok_or_else(|| ChartError::InvalidDomain {
                reason: format!("domain must be two numbers, got {value}"),
            })?;
            Ok((end, end))
        }
        _ => interval(value, "domain"),
    }
}

fn interval(value: &Value, what: &str) -> Result<(f64, f64)> {
    let invalid = || ChartError::InvalidDomain {
        reason: format!("{what} must be two numbers, got {value}"),
    };
    match value.as_array().map(Vec::as_slice) {
        Some([lo, hi]) => Ok((number(lo).ok_or_else(invalid)?, number(hi).ok_or_else(invalid)?)),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn no_padding() -> BandConfig {
        BandConfig {
            padding_inner: 0.0,
            padding_outer: 0.0,
            align: 0.5,
        }
    }

    #[test]
    fn linear_maps_domain_ends_to_range_ends() {
        let scale = Scale::build("linear", &json!([0, 1]), &json!([0, 200]), &BandConfig::default()).unwrap();
        assert_eq!(scale.apply(&json!(0)), json!(0.0));
        assert_eq!(scale.apply(&json!(1)), json!(200.0));
        assert_eq!(scale.apply(&json!(0.25)), json!(50.0));
        assert_eq!(scale.kind(), ScaleKind::Linear);
    }

    #[test]
    fn linear_handles_inverted_range_and_degenerate_domain() {
        let flipped = LinearScale::new((0.0, 10.0), (100.0, 0.0));
        assert!(close(flipped.apply(0.0), 100.0));
        assert!(close(flipped.apply(10.0), 0.0));

        let flat = LinearScale::new((3.0, 3.0), (0.0, 80.0));
        assert!(close(flat.apply(3.0), 40.0));
        assert!(close(flat.apply(99.0), 40.0));
    }

    #[test]
    fn linear_rejects_unplaceable_inputs() {
        let scale = Scale::Linear(LinearScale::new((0.0, 1.0), (0.0, 10.0)));
        assert_eq!(scale.apply(&json!("0.5")), json!(5.0));
        assert_eq!(scale.apply(&json!("abc")), Value::Null);
        assert_eq!(scale.apply(&Value::Null), Value::Null);
        assert_eq!(scale.bandwidth(), 0.0);
    }

    #[test]
    fn linear_domain_with_missing_ends_collapses() {
        let config = BandConfig::default();
        let empty = Scale::build("linear", &json!([0.0, null]), &json!([0, 200]), &config).unwrap();
        assert_eq!(empty, Scale::Linear(LinearScale::new((0.0, 0.0), (0.0, 200.0))));
        assert_eq!(empty.apply(&json!(7)), json!(100.0));

        let unknown = Scale::build("linear", &json!([null, null]), &json!([0, 200]), &config).unwrap();
        assert_eq!(unknown, empty);
    }

    #[test]
    fn band_without_padding_splits_range_evenly() {
        let scale = BandScale::new(vec![json!("a"), json!("b"), json!("c")], (0.0, 90.0), &no_padding());
        assert!(close(scale.bandwidth(), 30.0));
        assert!(close(scale.apply(&json!("a")).unwrap(), 0.0));
        assert!(close(scale.apply(&json!("b")).unwrap(), 30.0));
        assert!(close(scale.apply(&json!("c")).unwrap(), 60.0));
        assert_eq!(scale.apply(&json!("d")), None);
    }

    #[test]
    fn band_with_default_padding() {
        let scale = BandScale::new(vec![json!("a"), json!("b"), json!("c")], (0.0, 100.0), &BandConfig::default());
        let step = 100.0 / 3.1;
        assert!(close(scale.step(), step));
        assert!(close(scale.bandwidth(), step * 0.9));
        assert!(close(scale.apply(&json!("a")).unwrap(), (100.0 - step * 2.9) / 2.0));
    }

    #[test]
    fn band_with_reversed_range_runs_backwards() {
        let scale = BandScale::new(vec![json!(1), json!(2)], (100.0, 0.0), &no_padding());
        assert!(close(scale.apply(&json!(1)).unwrap(), 50.0));
        assert!(close(scale.apply(&json!(2)).unwrap(), 0.0));
    }

    #[test]
    fn unsupported_type_and_bad_intervals() {
        let config = BandConfig::default();
        assert!(matches!(
            Scale::build("sqrt", &json!([0, 1]), &json!([0, 1]), &config),
            Err(ChartError::UnsupportedScaleType(name)) if name == "sqrt"
        ));
        assert!(matches!(
            Scale::build("linear", &json!(["low", "high"]), &json!([0, 1]), &config),
            Err(ChartError::InvalidDomain { .. })
        ));
        assert!(matches!(
            Scale::build("band", &json!(3), &json!([0, 1]), &config),
            Err(ChartError::InvalidDomain { .. })
        ));
    }
}
