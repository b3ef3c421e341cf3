//! Hyperparameter distributions and sampled configurations

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Distribution of a single hyperparameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Distribution {
    /// Integers in `[low, high)`
    IntUniform { low: i64, high: i64 },
    /// Reals in `[loc, loc + scale]`
    Uniform { loc: f64, scale: f64 },
    /// Reals in `[low, high]` with a uniform logarithm
    LogUniform { low: f64, high: f64 },
    /// One of the listed options
    Choice(Vec<String>),
}

impl Distribution {
    pub fn choice(options: &[&str]) -> Self {
        Distribution::Choice(options.iter().map(|x| x.to_string()).collect())
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> ParamValue {
        match self {
            Distribution::IntUniform { low, high } => ParamValue::Int(rng.gen_range(*low..*high)),
            Distribution::Uniform { loc, scale } => {
                ParamValue::Float(loc + scale * rng.gen::<f64>())
            }
            Distribution::LogUniform { low, high } => {
                let (a, b) = (low.ln(), high.ln());
                ParamValue::Float((a + (b - a) * rng.gen::<f64>()).exp())
            }
            Distribution::Choice(options) => {
                ParamValue::Text(options[rng.gen_range(0..options.len())].clone())
            }
        }
    }

    /// Whether `value` can be drawn from this distribution
    pub fn contains(&self, value: &ParamValue) -> bool {
        match (self, value) {
            (Distribution::IntUniform { low, high }, ParamValue::Int(x)) => low <= x && x < high,
            (Distribution::Uniform { loc, scale }, ParamValue::Float(x)) => {
                *loc <= *x && *x <= loc + scale
            }
            (Distribution::LogUniform { low, high }, ParamValue::Float(x)) => {
                // exp(ln(x)) may land a rounding error outside of the interval
                let tolerance = 1e-12 * high.abs();
                low - tolerance <= *x && *x <= high + tolerance
            }
            (Distribution::Choice(options), ParamValue::Text(x)) => options.contains(x),
            _ => false,
        }
    }

    fn check(&self, name: &str) -> Result<()> {
        let valid = match self {
            Distribution::IntUniform { low, high } => low < high,
            Distribution::Uniform { loc, scale } => loc.is_finite() && scale.is_finite() && *scale >= 0.0,
            Distribution::LogUniform { low, high } => *low > 0.0 && low <= high && high.is_finite(),
            Distribution::Choice(options) => !options.is_empty(),
        };

        if valid {
            Ok(())
        } else {
            Err(PipelineError::InvalidParam {
                name: name.to_string(),
                reason: format!("empty or malformed distribution {:?}", self),
            })
        }
    }
}

/// A sampled hyperparameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParamValue::Int(x) => write!(f, "{}", x),
            ParamValue::Float(x) => write!(f, "{:.6}", x),
            ParamValue::Text(x) => write!(f, "{}", x),
        }
    }
}

/// One configuration, keyed by hyperparameter name
pub type ParamSet = BTreeMap<String, ParamValue>;

/// Render a configuration as `name=value` pairs
pub fn describe(params: &ParamSet) -> String {
    params
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(", ")
}

fn lookup<'a>(params: &'a ParamSet, name: &str) -> Result<&'a ParamValue> {
    params.get(name).ok_or_else(|| PipelineError::InvalidParam {
        name: name.to_string(),
        reason: "missing from the configuration".to_string(),
    })
}

fn wrong_kind(name: &str, expected: &str, value: &ParamValue) -> PipelineError {
    PipelineError::InvalidParam {
        name: name.to_string(),
        reason: format!("expected {}, got `{}`", expected, value),
    }
}

/// Read an integer hyperparameter that has to be positive
pub fn get_count(params: &ParamSet, name: &str) -> Result<usize> {
    match lookup(params, name)? {
        ParamValue::Int(x) if *x > 0 => Ok(*x as usize),
        other => Err(wrong_kind(name, "a positive integer", other)),
    }
}

pub fn get_float(params: &ParamSet, name: &str) -> Result<f64> {
    match lookup(params, name)? {
        ParamValue::Float(x) if x.is_finite() => Ok(*x),
        ParamValue::Int(x) => Ok(*x as f64),
        other => Err(wrong_kind(name, "a finite number", other)),
    }
}

pub fn get_text<'a>(params: &'a ParamSet, name: &str) -> Result<&'a str> {
    match lookup(params, name)? {
        ParamValue::Text(x) => Ok(x),
        other => Err(wrong_kind(name, "a string", other)),
    }
}

/// Ordered list of named hyperparameter distributions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchSpace {
    entries: Vec<(String, Distribution)>,
}

impl SearchSpace {
    pub fn new() -> Self {
        SearchSpace::default()
    }

    /// Append a hyperparameter, replacing an earlier entry of the same name
    pub fn with<I: Into<String>>(mut self, name: I, distribution: Distribution) -> Self {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = distribution,
            None => self.entries.push((name, distribution)),
        }
        self
    }

    pub fn entries(&self) -> &[(String, Distribution)] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&Distribution> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, distribution)| distribution)
    }

    pub fn check(&self) -> Result<()> {
        self.entries
            .iter()
            .try_for_each(|(name, distribution)| distribution.check(name))
    }

    /// Draw one configuration, hyperparameters are sampled in declaration order
    pub fn sample<R: Rng>(&self, rng: &mut R) -> ParamSet {
        self.entries
            .iter()
            .map(|(name, distribution)| (name.clone(), distribution.sample(rng)))
            .collect()
    }

    /// Draw `n` configurations from one generator
    pub fn sample_n<R: Rng>(&self, n: usize, rng: &mut R) -> Vec<ParamSet> {
        (0..n).map(|_| self.sample(rng)).collect()
    }

    /// Whether every hyperparameter of the space is set to a value it can draw
    pub fn contains(&self, params: &ParamSet) -> bool {
        self.entries.iter().all(|(name, distribution)| {
            params
                .get(name)
                .map_or(false, |value| distribution.contains(value))
        })
    }
}
