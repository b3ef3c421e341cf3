//! Chi-square test of independence between a categorical feature and the binary outcome

use std::collections::BTreeMap;

use ndarray::Array2;
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::error::{Error, Result};
use crate::table::Table;

/// Contingency table of one feature against the outcome with its test statistic
#[derive(Debug, Clone)]
pub struct ChiSquareTest {
    pub feature: String,
    /// Distinct feature values, in ascending order, one per row of `observed`
    pub categories: Vec<String>,
    /// Counts with columns (outcome absent, outcome present)
    pub observed: Array2<f64>,
    pub statistic: f64,
    pub dof: usize,
    pub p_value: f64,
}

/// Count feature values against the boolean outcome
pub fn contingency_table(values: &[String], outcome: &[bool]) -> Result<(Vec<String>, Array2<f64>)> {
    if values.len() != outcome.len() {
        return Err(Error::LengthMismatch {
            expected: outcome.len(),
            actual: values.len(),
        });
    }

    let mut counts: BTreeMap<&str, [f64; 2]> = BTreeMap::new();
    for (value, present) in values.iter().zip(outcome) {
        counts.entry(value.as_str()).or_insert([0.0; 2])[*present as usize] += 1.0;
    }

    let mut observed = Array2::zeros((counts.len(), 2));
    let mut categories = Vec::with_capacity(counts.len());
    for (row, (category, count)) in counts.into_iter().enumerate() {
        categories.push(category.to_string());
        observed[(row, 0)] = count[0];
        observed[(row, 1)] = count[1];
    }

    Ok((categories, observed))
}

/// Pearson's chi-square statistic and its degrees of freedom
///
/// With a single degree of freedom Yates' continuity correction moves every observed count by at
/// most one half towards its expected count.
pub fn chi_square_statistic(observed: &Array2<f64>) -> Result<(f64, usize)> {
    let (nrows, ncols) = observed.dim();
    if nrows < 2 || ncols < 2 {
        return Err(Error::DegenerateStatistic(format!(
            "contingency table of shape {}x{} has no degree of freedom",
            nrows, ncols
        )));
    }

    let total = observed.sum();
    let row_sums = observed.sum_axis(ndarray::Axis(1));
    let col_sums = observed.sum_axis(ndarray::Axis(0));
    let dof = (nrows - 1) * (ncols - 1);

    let mut statistic = 0.0;
    for ((i, j), count) in observed.indexed_iter() {
        let expected = row_sums[i] * col_sums[j] / total;
        if expected <= 0.0 || expected.is_nan() {
            return Err(Error::DegenerateStatistic(format!(
                "zero expected frequency in cell ({}, {})",
                i, j
            )));
        }

        let count = if dof == 1 {
            let diff = expected - count;
            count + diff.signum() * diff.abs().min(0.5)
        } else {
            *count
        };
        statistic += (count - expected).powi(2) / expected;
    }

    Ok((statistic, dof))
}

/// Upper tail probability of the chi-square distribution
pub fn chi_square_p_value(statistic: f64, dof: usize) -> Result<f64> {
    let distribution = ChiSquared::new(dof as f64)
        .map_err(|err| Error::DegenerateStatistic(err.to_string()))?;

    Ok((1.0 - distribution.cdf(statistic)).max(0.0))
}

impl ChiSquareTest {
    /// Test the association between `feature` and the binary `target` column of a table
    ///
    /// Numeric feature values, such as indicator flags, are compared by their rendered form.
    pub fn from_table(table: &Table, feature: &str, target: &str) -> Result<ChiSquareTest> {
        let column = table.column(feature)?;
        let values = (0..column.len()).map(|idx| column.cell(idx)).collect::<Vec<_>>();
        let outcome = table.binary(target)?.to_vec();

        let (categories, observed) = contingency_table(&values, &outcome)?;
        let (statistic, dof) = chi_square_statistic(&observed)?;
        let p_value = chi_square_p_value(statistic, dof)?;

        Ok(ChiSquareTest {
            feature: feature.to_string(),
            categories,
            observed,
            statistic,
            dof,
            p_value,
        })
    }
}
