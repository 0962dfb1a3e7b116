//! Processing parameters and their range rules
//!
//! A parameter carries a human-written range descriptor such as
//! `"0 --> 100"` or `"any positive integer"`. The descriptor is resolved into
//! a [`RangeSpec`] which is what values are checked against.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Token separating the two endpoints of a bounded range descriptor
const RANGE_SEPARATOR: &str = "-->";

/// Resolved numeric bounds a parameter value must satisfy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeSpec {
    /// Inclusive `[low, high]`
    Bounded { low: f64, high: f64 },
    /// Any value >= 0
    PositiveOnly,
    /// Any value <= -1
    NegativeOnly,
    /// Any finite value
    Unbounded,
}

impl RangeSpec {
    /// Resolved lower and upper bounds (inclusive)
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            RangeSpec::Bounded { low, high } => (low, high),
            RangeSpec::PositiveOnly => (0.0, f64::INFINITY),
            RangeSpec::NegativeOnly => (f64::NEG_INFINITY, -1.0),
            RangeSpec::Unbounded => (f64::NEG_INFINITY, f64::INFINITY),
        }
    }

    /// Short human-readable form of the resolved bounds
    pub fn describe(&self) -> String {
        match *self {
            RangeSpec::Bounded { low, high } => format!("{} --> {}", low, high),
            RangeSpec::PositiveOnly => ">= 0".to_string(),
            RangeSpec::NegativeOnly => "<= -1".to_string(),
            RangeSpec::Unbounded => "any number".to_string(),
        }
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Parse a range descriptor into a [`RangeSpec`]
///
/// Never fails: descriptors that match none of the known shapes, or whose
/// endpoints are not numbers, resolve to [`RangeSpec::Unbounded`].
pub fn parse_range(descriptor: &str) -> RangeSpec {
    let normalized = descriptor.trim().to_lowercase();

    match normalized.as_str() {
        "any positive integer" => return RangeSpec::PositiveOnly,
        "any negative integer" => return RangeSpec::NegativeOnly,
        _ => {}
    }

    let Some((left, right)) = normalized.split_once(RANGE_SEPARATOR) else {
        return RangeSpec::Unbounded;
    };

    let (Some(a), Some(b)) = (parse_endpoint(left), parse_endpoint(right)) else {
        return RangeSpec::Unbounded;
    };

    if a < 0.0 && b < 0.0 {
        // Both negative: the more negative endpoint is the lower bound
        RangeSpec::Bounded {
            low: a.min(b),
            high: a.max(b),
        }
    } else {
        RangeSpec::Bounded { low: a, high: b }
    }
}

fn parse_endpoint(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Check a value against a resolved range (inclusive on both ends)
pub fn is_valid(value: f64, spec: &RangeSpec) -> bool {
    if !value.is_finite() {
        return false;
    }
    let (low, high) = spec.bounds();
    value >= low && value <= high
}

/// A tunable processing parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "Parameter name")]
    pub name: String,
    #[serde(rename = "Value", default)]
    pub value: Option<f64>,
    #[serde(rename = "Range")]
    pub range: String,
    #[serde(rename = "Default value")]
    pub default_value: f64,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Code variable name")]
    pub variable_key: String,
}

impl Parameter {
    pub fn range_spec(&self) -> RangeSpec {
        parse_range(&self.range)
    }

    /// Current value, falling back to the default when unset
    pub fn effective_value(&self) -> f64 {
        self.value.unwrap_or(self.default_value)
    }
}

/// Built-in parameter set used when no preset file is given
pub fn default_parameters() -> Vec<Parameter> {
    vec![
        Parameter {
            name: "Par 1".to_string(),
            value: Some(80.0),
            range: "0 --> 100".to_string(),
            default_value: 70.0,
            description: "minimum allowed".to_string(),
            variable_key: "par_1".to_string(),
        },
        Parameter {
            name: "Par 2".to_string(),
            value: Some(-90.0),
            range: "-40 --> -120".to_string(),
            default_value: -90.0,
            description: "minimum".to_string(),
            variable_key: "par_2".to_string(),
        },
        Parameter {
            name: "Par 3".to_string(),
            value: Some(80.0),
            range: "any positive integer".to_string(),
            default_value: 70.0,
            description: "minimum allowed par".to_string(),
            variable_key: "par_3".to_string(),
        },
        Parameter {
            name: "Par 4".to_string(),
            value: Some(-90.0),
            range: "any negative integer".to_string(),
            default_value: -90.0,
            description: "minimum".to_string(),
            variable_key: "par_4".to_string(),
        },
    ]
}

/// Load a parameter preset (a YAML list using the preset field names)
pub fn load_preset(path: &Path) -> Result<Vec<Parameter>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameter preset {}", path.display()))?;
    let parameters: Vec<Parameter> = serde_yaml::from_str(&contents)
        .with_context(|| format!("Invalid parameter preset {}", path.display()))?;
    if parameters.is_empty() {
        anyhow::bail!("Parameter preset {} is empty", path.display());
    }
    Ok(parameters)
}
