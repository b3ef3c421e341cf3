//! One-hot encoding of categorical columns

use std::collections::BTreeSet;

use crate::error::{PreprocessingError, Result};
use cardio::dataset::DatasetBase;
use cardio::table::Table;
use cardio::traits::{Fit, Transformer};
use ndarray::Array2;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Which category of a column is left out of the encoding
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropPolicy {
    /// Keep one indicator per category
    None,
    /// Drop the first category in ascending order, it becomes the reference level
    First,
}

/// One-hot encoder of every column of a table
///
/// Categories are collected per column while fitting and sorted in ascending order. Numeric
/// columns are encoded by their rendered values, so a 0/1 indicator column has the categories
/// `"0"` and `"1"`. Values not seen during fitting are encoded as all-zero vectors.
#[derive(Clone, Debug)]
pub struct OneHotEncoder {
    drop: DropPolicy,
}

impl Default for OneHotEncoder {
    fn default() -> Self {
        OneHotEncoder {
            drop: DropPolicy::None,
        }
    }
}

impl OneHotEncoder {
    pub fn new() -> Self {
        OneHotEncoder::default()
    }

    /// Sets the category to leave out of every column
    pub fn drop(mut self, drop: DropPolicy) -> Self {
        self.drop = drop;
        self
    }
}

impl<T> Fit<Table, T, PreprocessingError> for OneHotEncoder {
    type Object = FittedOneHotEncoder;

    fn fit(&self, dataset: &DatasetBase<Table, T>) -> Result<Self::Object> {
        let table = dataset.records();
        if table.nrows() == 0 {
            return Err(PreprocessingError::NotEnoughSamples);
        }

        let columns = table
            .iter()
            .map(|(name, column)| {
                let categories = (0..column.len())
                    .map(|idx| column.cell(idx))
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect::<Vec<_>>();
                let skip = match self.drop {
                    DropPolicy::First => 1,
                    DropPolicy::None => 0,
                };
                let encoded = categories.into_iter().skip(skip).collect();

                EncodedColumn {
                    name: name.to_string(),
                    categories: encoded,
                }
            })
            .collect();

        Ok(FittedOneHotEncoder { columns })
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
struct EncodedColumn {
    name: String,
    categories: Vec<String>,
}

/// Fitted one-hot encoder with the indicator categories of every column
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct FittedOneHotEncoder {
    columns: Vec<EncodedColumn>,
}

impl FittedOneHotEncoder {
    /// Categories with an indicator for the column `name`
    pub fn categories(&self, name: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.categories.as_slice())
    }

    /// Number of indicator columns produced by the encoder
    pub fn nfeatures_out(&self) -> usize {
        self.columns.iter().map(|c| c.categories.len()).sum()
    }

    /// Names of the indicator columns, formatted as `{column}_{category}`
    pub fn feature_names_out(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|c| {
                c.categories
                    .iter()
                    .map(move |category| format!("{}_{}", c.name, category))
            })
            .collect()
    }

    /// Encode the fitted columns of `table`
    pub fn try_transform(&self, table: &Table) -> Result<Array2<f64>> {
        let mut encoded = Array2::zeros((table.nrows(), self.nfeatures_out()));

        let mut offset = 0;
        for encoded_column in &self.columns {
            let column = table.column(&encoded_column.name)?;
            for row in 0..table.nrows() {
                let value = column.cell(row);
                if let Ok(idx) = encoded_column
                    .categories
                    .binary_search_by(|c| c.as_str().cmp(value.as_str()))
                {
                    encoded[(row, offset + idx)] = 1.0;
                }
            }
            offset += encoded_column.categories.len();
        }

        Ok(encoded)
    }
}

impl Transformer<&Table, Result<Array2<f64>>> for FittedOneHotEncoder {
    fn transform(&self, table: &Table) -> Result<Array2<f64>> {
        self.try_transform(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardio::table::Column;
    use ndarray::array;

    fn table(values: &[&str]) -> Table {
        Table::from_columns(vec![(
            "glucose",
            Column::Categorical(values.iter().map(|x| x.to_string()).collect()),
        )])
        .unwrap()
    }

    #[test]
    fn encodes_sorted_categories() {
        let train = DatasetBase::new(table(&["normal", "high", "very_high", "normal"]), ());
        let encoder = OneHotEncoder::new().fit(&train).unwrap();

        assert_eq!(
            encoder.feature_names_out(),
            vec!["glucose_high", "glucose_normal", "glucose_very_high"]
        );
        let encoded = encoder.try_transform(train.records()).unwrap();
        assert_eq!(
            encoded,
            array![[0., 1., 0.], [1., 0., 0.], [0., 0., 1.], [0., 1., 0.]]
        );
    }

    #[test]
    fn drops_reference_level() {
        let train = DatasetBase::new(table(&["normal", "high", "very_high"]), ());
        let encoder = OneHotEncoder::new()
            .drop(DropPolicy::First)
            .fit(&train)
            .unwrap();

        assert_eq!(encoder.categories("glucose").unwrap(), &["normal", "very_high"]);
        let encoded = encoder.try_transform(train.records()).unwrap();
        assert_eq!(encoded, array![[1., 0.], [0., 0.], [0., 1.]]);
    }

    #[test]
    fn unseen_category_is_all_zero() {
        let train = DatasetBase::new(table(&["normal", "high"]), ());
        let encoder = OneHotEncoder::new().fit(&train).unwrap();

        let encoded = encoder.transform(&table(&["check"])).unwrap();
        assert_eq!(encoded, array![[0., 0.]]);
    }

    #[test]
    fn numeric_flags_use_rendered_values() {
        let flags = Table::from_columns(vec![("flag_smoker", Column::Numeric(vec![0., 1., 1.]))])
            .unwrap();
        let encoder = OneHotEncoder::new()
            .drop(DropPolicy::First)
            .fit(&DatasetBase::new(flags.clone(), ()))
            .unwrap();

        assert_eq!(encoder.feature_names_out(), vec!["flag_smoker_1"]);
        assert_eq!(encoder.try_transform(&flags).unwrap(), array![[0.], [1.], [1.]]);
    }

    #[test]
    fn missing_column_is_an_error() {
        let train = DatasetBase::new(table(&["normal"]), ());
        let encoder = OneHotEncoder::new().fit(&train).unwrap();
        let other = Table::from_columns(vec![("gender", Column::Categorical(vec!["male".into()]))])
            .unwrap();

        assert!(encoder.try_transform(&other).is_err());
    }
}
