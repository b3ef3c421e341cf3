//! Descriptive statistics of table columns

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::table::Table;

/// Summary of a numeric column, missing values are skipped
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation, NaN for fewer than two values
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Quantile with linear interpolation between the closest ranks
///
/// `sorted` must be in ascending order and `q` within [0, 1].
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Quantiles of a column at every requested level
pub fn quantiles(values: &[f64], levels: &[f64]) -> Vec<f64> {
    let sorted = sorted_values(values);
    levels.iter().map(|q| quantile(&sorted, *q)).collect()
}

fn sorted_values(values: &[f64]) -> Vec<f64> {
    let mut sorted = values
        .iter()
        .cloned()
        .filter(|x| !x.is_nan())
        .collect::<Vec<_>>();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

impl NumericSummary {
    pub fn from_values(name: &str, values: &[f64]) -> NumericSummary {
        let sorted = sorted_values(values);
        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std = if count > 1 {
            (sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (count - 1) as f64).sqrt()
        } else {
            f64::NAN
        };

        NumericSummary {
            name: name.to_string(),
            count,
            mean,
            std,
            min: sorted.first().cloned().unwrap_or(f64::NAN),
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted.last().cloned().unwrap_or(f64::NAN),
        }
    }
}

/// Summaries of the given numeric columns
pub fn describe(table: &Table, names: &[String]) -> Result<Vec<NumericSummary>> {
    names
        .iter()
        .map(|name| Ok(NumericSummary::from_values(name, table.numeric(name)?)))
        .collect()
}

/// Count of one feature value with and without the outcome
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyRow {
    pub feature: String,
    pub value: String,
    pub count_without: usize,
    pub pct_without: f64,
    pub count_with: usize,
    pub pct_with: f64,
}

/// Cross tabulation of every value of `feature` against the binary `target`
///
/// Percentages are relative to the number of samples holding the value.
pub fn frequency_table(table: &Table, feature: &str, target: &str) -> Result<Vec<FrequencyRow>> {
    let column = table.column(feature)?;
    let outcome = table.binary(target)?;
    if column.len() != outcome.len() {
        return Err(Error::LengthMismatch {
            expected: outcome.len(),
            actual: column.len(),
        });
    }

    let mut counts: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for (idx, present) in outcome.iter().enumerate() {
        let entry = counts.entry(column.cell(idx)).or_insert((0, 0));
        if *present {
            entry.1 += 1;
        } else {
            entry.0 += 1;
        }
    }

    Ok(counts
        .into_iter()
        .map(|(value, (without, with))| {
            let total = (without + with) as f64;
            FrequencyRow {
                feature: feature.to_string(),
                value,
                count_without: without,
                pct_without: 100.0 * without as f64 / total,
                count_with: with,
                pct_with: 100.0 * with as f64 / total,
            }
        })
        .collect())
}
