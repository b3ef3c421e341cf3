//! Joint preprocessing of numeric and categorical columns
//!
//! Numeric columns are standardized, categorical columns are one-hot encoded with the first
//! category of every column dropped. The output matrix holds the scaled numeric columns first,
//! followed by the indicator columns.

use std::collections::HashSet;

use crate::error::{PreprocessingError, Result};
use crate::linear_scaling::{FittedLinearScaler, LinearScaler};
use crate::one_hot::{DropPolicy, FittedOneHotEncoder, OneHotEncoder};
use cardio::dataset::DatasetBase;
use cardio::table::Table;
use cardio::traits::{Fit, Transformer};
use ndarray::{concatenate, Array2, Axis};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Column layout of the preprocessing stage
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnTransformer {
    numeric: Vec<String>,
    categorical: Vec<String>,
}

impl ColumnTransformer {
    pub fn new<I: Into<String>, J: Into<String>>(numeric: Vec<I>, categorical: Vec<J>) -> Self {
        ColumnTransformer {
            numeric: numeric.into_iter().map(Into::into).collect(),
            categorical: categorical.into_iter().map(Into::into).collect(),
        }
    }

    pub fn numeric(&self) -> &[String] {
        &self.numeric
    }

    pub fn categorical(&self) -> &[String] {
        &self.categorical
    }

    fn check(&self) -> Result<()> {
        if self.numeric.is_empty() && self.categorical.is_empty() {
            return Err(PreprocessingError::NoFeatures);
        }

        let mut seen = HashSet::new();
        for name in self.numeric.iter().chain(self.categorical.iter()) {
            if !seen.insert(name.as_str()) {
                return Err(PreprocessingError::DuplicateColumn(name.clone()));
            }
        }

        Ok(())
    }
}

impl<T> Fit<Table, T, PreprocessingError> for ColumnTransformer {
    type Object = FittedColumnTransformer;

    fn fit(&self, dataset: &DatasetBase<Table, T>) -> Result<Self::Object> {
        self.check()?;
        let table = dataset.records();
        if table.nrows() == 0 {
            return Err(PreprocessingError::NotEnoughSamples);
        }

        let scaler = if self.numeric.is_empty() {
            None
        } else {
            let numeric = DatasetBase::new(table.to_array(&self.numeric)?, ());
            Some(LinearScaler::standard().fit(&numeric)?)
        };

        let encoder = if self.categorical.is_empty() {
            None
        } else {
            let categorical = DatasetBase::new(table.select_columns(&self.categorical)?, ());
            Some(
                OneHotEncoder::new()
                    .drop(DropPolicy::First)
                    .fit(&categorical)?,
            )
        };

        Ok(FittedColumnTransformer {
            numeric: self.numeric.clone(),
            categorical: self.categorical.clone(),
            scaler,
            encoder,
        })
    }
}

/// Preprocessing stage fitted on a training table
///
/// Holds the means and standard deviations of the numeric columns and the categories of the
/// categorical ones, so transforming the same table twice yields the same matrix.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct FittedColumnTransformer {
    numeric: Vec<String>,
    categorical: Vec<String>,
    scaler: Option<FittedLinearScaler<f64>>,
    encoder: Option<FittedOneHotEncoder>,
}

impl FittedColumnTransformer {
    pub fn scaler(&self) -> Option<&FittedLinearScaler<f64>> {
        self.scaler.as_ref()
    }

    pub fn encoder(&self) -> Option<&FittedOneHotEncoder> {
        self.encoder.as_ref()
    }

    /// Names of the output columns, numeric names first, then `{column}_{category}` indicators
    pub fn feature_names_out(&self) -> Vec<String> {
        let mut names = self.numeric.clone();
        if let Some(encoder) = &self.encoder {
            names.extend(encoder.feature_names_out());
        }
        names
    }

    pub fn nfeatures_out(&self) -> usize {
        self.numeric.len() + self.encoder.as_ref().map_or(0, |e| e.nfeatures_out())
    }

    /// Transform the columns of `table` into a feature matrix
    ///
    /// Columns not named during fitting are ignored. Fails if a fitted column is missing.
    pub fn try_transform(&self, table: &Table) -> Result<Array2<f64>> {
        let mut blocks = Vec::with_capacity(2);
        if let Some(scaler) = &self.scaler {
            blocks.push(scaler.try_transform(table.to_array(&self.numeric)?)?);
        }
        if let Some(encoder) = &self.encoder {
            blocks.push(encoder.try_transform(table)?);
        }

        let views = blocks.iter().map(|b| b.view()).collect::<Vec<_>>();
        Ok(concatenate(Axis(1), &views).map_err(cardio::error::Error::from)?)
    }

    /// Transform the records of a dataset, keeping its targets and weights
    pub fn transform_dataset<T>(
        &self,
        dataset: DatasetBase<Table, T>,
    ) -> Result<DatasetBase<Array2<f64>, T>> {
        let records = self.try_transform(dataset.records())?;
        let names = self.feature_names_out();

        Ok(dataset.with_records(records).with_feature_names(names))
    }
}

impl Transformer<&Table, Result<Array2<f64>>> for FittedColumnTransformer {
    fn transform(&self, table: &Table) -> Result<Array2<f64>> {
        self.try_transform(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cardio::features::FeatureSet;
    use cardio::table::Column;
    use cardio_datasets::{cohort, ID_COLUMN, TARGET};
    use ndarray::array;
    use rand::{rngs::SmallRng, SeedableRng};

    fn small_table() -> Table {
        Table::from_columns(vec![
            ("age_years", Column::Numeric(vec![40., 50., 60.])),
            (
                "cholesterol",
                Column::Categorical(vec![
                    "cholesterol_normal".into(),
                    "cholesterol_above_normal".into(),
                    "cholesterol_normal".into(),
                ]),
            ),
            ("flag_smoker", Column::Numeric(vec![0., 1., 0.])),
        ])
        .unwrap()
    }

    #[test]
    fn numeric_columns_come_first() {
        let table = small_table();
        let transformer = ColumnTransformer::new(vec!["age_years"], vec!["cholesterol", "flag_smoker"])
            .fit(&DatasetBase::new(table.clone(), ()))
            .unwrap();

        assert_eq!(
            transformer.feature_names_out(),
            vec!["age_years", "cholesterol_cholesterol_normal", "flag_smoker_1"]
        );

        let scale = (200.0f64 / 3.0).sqrt();
        let out = transformer.try_transform(&table).unwrap();
        assert_abs_diff_eq!(
            out,
            array![
                [-10. / scale, 1., 0.],
                [0., 0., 1.],
                [10. / scale, 1., 0.]
            ],
            epsilon = 1e-12
        );
    }

    #[test]
    fn transform_is_deterministic() {
        let mut rng = SmallRng::seed_from_u64(42);
        let table = cohort(300, 0.3, &mut rng).unwrap();
        let features = FeatureSet::classify(&table, ID_COLUMN, TARGET, "flag_").unwrap();

        let transformer = ColumnTransformer::new(features.numeric.clone(), features.categorical.clone())
            .fit(&DatasetBase::new(table.clone(), ()))
            .unwrap();

        let first = transformer.transform(&table).unwrap();
        let second = transformer.transform(&table).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.ncols(), transformer.nfeatures_out());
        assert_eq!(first.nrows(), 300);
    }

    #[test]
    fn unseen_category_encodes_to_zero() {
        let transformer = ColumnTransformer::new(Vec::<String>::new(), vec!["cholesterol"])
            .fit(&DatasetBase::new(small_table(), ()))
            .unwrap();

        let unseen = Table::from_columns(vec![(
            "cholesterol",
            Column::Categorical(vec!["check".into()]),
        )])
        .unwrap();
        assert_eq!(transformer.try_transform(&unseen).unwrap(), array![[0.]]);
    }

    #[test]
    fn keeps_targets() {
        let table = small_table();
        let dataset = DatasetBase::new(table, array![true, false, true]);
        let transformer = ColumnTransformer::new(vec!["age_years"], Vec::<String>::new())
            .fit(&dataset)
            .unwrap();

        let transformed = transformer.transform_dataset(dataset).unwrap();
        assert_eq!(transformed.targets(), &array![true, false, true]);
        assert_eq!(transformed.feature_names(), vec!["age_years"]);
    }

    #[test]
    fn rejects_invalid_layouts() {
        let dataset = DatasetBase::new(small_table(), ());

        assert!(matches!(
            ColumnTransformer::new(Vec::<String>::new(), Vec::<String>::new()).fit(&dataset),
            Err(PreprocessingError::NoFeatures)
        ));
        assert!(matches!(
            ColumnTransformer::new(vec!["age_years"], vec!["age_years"]).fit(&dataset),
            Err(PreprocessingError::DuplicateColumn(_))
        ));
        assert!(ColumnTransformer::new(vec!["height"], Vec::<String>::new())
            .fit(&dataset)
            .is_err());
    }
}
