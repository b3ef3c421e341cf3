//! Partition of table columns into model features

use crate::error::{Error, Result};
use crate::table::{Column, Table};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Categorical and numeric feature names of a table
///
/// Both lists are disjoint and never contain the identifier or the target column.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureSet {
    pub categorical: Vec<String>,
    pub numeric: Vec<String>,
}

impl FeatureSet {
    /// Classify the columns of `table`
    ///
    /// String columns are categorical. Numeric columns whose name starts with `flag_prefix` are
    /// binary indicators and therefore categorical as well; all other numeric columns are numeric
    /// features. Categorical features list the string columns first and the indicators after
    /// them, both in table order.
    ///
    /// A table without columns yields two empty lists. Otherwise the identifier and the target
    /// must be present and every indicator column may only hold 0, 1 or missing values.
    pub fn classify(
        table: &Table,
        id_column: &str,
        target: &str,
        flag_prefix: &str,
    ) -> Result<FeatureSet> {
        if table.ncols() == 0 {
            return Ok(FeatureSet::default());
        }
        for name in &[id_column, target] {
            if !table.contains(name) {
                return Err(Error::MissingColumn(name.to_string()));
            }
        }

        let mut strings = Vec::new();
        let mut flags = Vec::new();
        let mut numeric = Vec::new();
        for (name, column) in table.iter() {
            if name == id_column || name == target {
                continue;
            }

            match column {
                Column::Categorical(_) => strings.push(name.to_string()),
                Column::Numeric(values) if name.starts_with(flag_prefix) => {
                    if values
                        .iter()
                        .any(|x| !x.is_nan() && *x != 0.0 && *x != 1.0)
                    {
                        return Err(Error::NotBinary(name.to_string()));
                    }
                    flags.push(name.to_string());
                }
                Column::Numeric(_) => numeric.push(name.to_string()),
            }
        }
        strings.extend(flags);

        Ok(FeatureSet {
            categorical: strings,
            numeric,
        })
    }

    /// All feature names, categorical first
    pub fn all(&self) -> Vec<String> {
        self.categorical
            .iter()
            .chain(self.numeric.iter())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.categorical.len() + self.numeric.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
