//! Engine Configuration
//!
//! Tunables that affect how scales are constructed during evaluation. The
//! graph structure never depends on configuration, only the values computed
//! from it.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Top-level configuration for a compile/evaluate pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Layout parameters for band scales.
    pub band: BandConfig,
}

impl EngineConfig {
    /// Parse a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Band scale layout, expressed as fractions of a band step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandConfig {
    /// Space between adjacent bands.
    pub padding_inner: f64,
    /// Space before the first band and after the last one.
    pub padding_outer: f64,
    /// Where leftover space goes: 0 = start, 0.5 = centered, 1 = end.
    pub align: f64,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            padding_inner: 0.1,
            padding_outer: 0.1,
            align: 0.5,
        }
    }
}
