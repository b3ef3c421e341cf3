//! A classifier of any family composed with the column preprocessing
//!
//! [`PipelineParams`] is fitted on a raw patient [`Table`]: the column transformer learns its
//! statistics on that table only, then the classifier is fitted on the transformed matrix. The
//! resulting [`FittedPipeline`] applies both steps to new tables.

use cardio::prelude::{DatasetBase, Fit, PredictProba, Table};
use cardio_ensemble::{AdaBoost, AdaBoostValidParams, GradientBoosting, GradientBoostingValidParams};
use cardio_logistic::{FittedLogisticRegression, LogisticRegressionValidParams};
use cardio_preprocessing::{ColumnTransformer, FittedColumnTransformer};
use cardio_trees::{DecisionTree, DecisionTreeValidParams, RandomForest, RandomForestValidParams};
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Validated hyperparameters of one classifier
#[derive(Debug, Clone, PartialEq)]
pub enum ModelParams {
    LogisticRegression(LogisticRegressionValidParams<f64, bool>),
    DecisionTree(DecisionTreeValidParams<f64, bool>),
    RandomForest(RandomForestValidParams<f64, bool>),
    AdaBoost(AdaBoostValidParams<f64, bool>),
    GradientBoosting(GradientBoostingValidParams<f64, bool>),
}

/// A fitted classifier of any family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FittedModel {
    LogisticRegression(FittedLogisticRegression<f64, bool>),
    DecisionTree(DecisionTree<f64, bool>),
    RandomForest(RandomForest<f64, bool>),
    AdaBoost(AdaBoost<f64, bool>),
    GradientBoosting(GradientBoosting<f64, bool>),
}

impl Fit<Array2<f64>, Array1<bool>, PipelineError> for ModelParams {
    type Object = FittedModel;

    fn fit(&self, dataset: &DatasetBase<Array2<f64>, Array1<bool>>) -> Result<FittedModel> {
        let model = match self {
            ModelParams::LogisticRegression(params) => {
                FittedModel::LogisticRegression(params.fit(dataset)?)
            }
            ModelParams::DecisionTree(params) => FittedModel::DecisionTree(params.fit(dataset)?),
            ModelParams::RandomForest(params) => FittedModel::RandomForest(params.fit(dataset)?),
            ModelParams::AdaBoost(params) => FittedModel::AdaBoost(params.fit(dataset)?),
            ModelParams::GradientBoosting(params) => {
                FittedModel::GradientBoosting(params.fit(dataset)?)
            }
        };

        Ok(model)
    }
}

impl FittedModel {
    /// Classes seen while fitting, in the column order of the class probabilities
    pub fn classes(&self) -> &[bool] {
        match self {
            FittedModel::LogisticRegression(model) => model.classes(),
            FittedModel::DecisionTree(model) => model.classes(),
            FittedModel::RandomForest(model) => model.classes(),
            FittedModel::AdaBoost(model) => model.classes(),
            FittedModel::GradientBoosting(model) => model.classes(),
        }
    }

    fn class_probabilities<D: Data<Elem = f64>>(&self, x: &ArrayBase<D, Ix2>) -> Array2<f64> {
        match self {
            FittedModel::LogisticRegression(model) => model.predict_proba(x),
            FittedModel::DecisionTree(model) => model.predict_proba(x),
            FittedModel::RandomForest(model) => model.predict_proba(x),
            FittedModel::AdaBoost(model) => model.predict_proba(x),
            FittedModel::GradientBoosting(model) => model.predict_proba(x),
        }
    }

    /// Probability of the positive outcome for every row
    ///
    /// A tree fitted on a single class predicts that class with certainty.
    pub fn positive_proba<D: Data<Elem = f64>>(&self, x: &ArrayBase<D, Ix2>) -> Array1<f64> {
        match self.classes().iter().position(|class| *class) {
            Some(column) => self.class_probabilities(x).column(column).to_owned(),
            None => Array1::zeros(x.nrows()),
        }
    }

    /// Normalized importance of every input column, `None` for linear models
    pub fn feature_importance(&self) -> Option<Vec<f64>> {
        match self {
            FittedModel::LogisticRegression(_) => None,
            FittedModel::DecisionTree(model) => Some(model.feature_importance()),
            FittedModel::RandomForest(model) => Some(model.feature_importance()),
            FittedModel::AdaBoost(model) => Some(model.feature_importance()),
            FittedModel::GradientBoosting(model) => Some(model.feature_importance()),
        }
    }
}

impl<D: Data<Elem = f64>> PredictProba<ArrayBase<D, Ix2>, f64> for FittedModel {
    /// Probabilities of the negative and the positive outcome, in this column order
    fn predict_proba(&self, x: &ArrayBase<D, Ix2>) -> Array2<f64> {
        let positive = self.positive_proba(x);
        let mut proba = Array2::zeros((x.nrows(), 2));
        for (mut row, p) in proba.rows_mut().into_iter().zip(positive.iter()) {
            row[0] = 1.0 - p;
            row[1] = *p;
        }
        proba
    }
}

/// Column preprocessing followed by a classifier
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineParams {
    transformer: ColumnTransformer,
    model: ModelParams,
}

impl PipelineParams {
    pub fn new(transformer: ColumnTransformer, model: ModelParams) -> Self {
        PipelineParams { transformer, model }
    }

    pub fn model(&self) -> &ModelParams {
        &self.model
    }
}

impl Fit<Table, Array1<bool>, PipelineError> for PipelineParams {
    type Object = FittedPipeline;

    fn fit(&self, dataset: &DatasetBase<Table, Array1<bool>>) -> Result<FittedPipeline> {
        let transformer = self.transformer.fit(dataset)?;
        let records = transformer.try_transform(dataset.records())?;
        let transformed = DatasetBase::new(records, dataset.targets().clone())
            .with_feature_names(transformer.feature_names_out());
        let model = self.model.fit(&transformed)?;

        Ok(FittedPipeline { transformer, model })
    }
}

/// A fitted preprocessing stage and classifier, applied to raw tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPipeline {
    transformer: FittedColumnTransformer,
    model: FittedModel,
}

impl FittedPipeline {
    pub fn transformer(&self) -> &FittedColumnTransformer {
        &self.transformer
    }

    pub fn model(&self) -> &FittedModel {
        &self.model
    }

    /// Probability of the positive outcome for every row of `table`
    pub fn positive_proba(&self, table: &Table) -> Result<Array1<f64>> {
        let records = self.transformer.try_transform(table)?;
        Ok(self.model.positive_proba(&records))
    }

    /// (nsamples, 2) probability matrix, the second column is the positive outcome
    pub fn predict_proba(&self, table: &Table) -> Result<Array2<f64>> {
        let records = self.transformer.try_transform(table)?;
        Ok(self.model.predict_proba(&records))
    }

    /// Importances labelled with the transformed column names, largest first
    pub fn feature_importance(&self) -> Option<Vec<(String, f64)>> {
        let importance = self.model.feature_importance()?;
        let mut labelled = self
            .transformer
            .feature_names_out()
            .into_iter()
            .zip(importance)
            .collect::<Vec<_>>();
        labelled.sort_by(|a, b| b.1.total_cmp(&a.1));

        Some(labelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ModelFamily;
    use crate::search_space::{ParamSet, ParamValue};
    use approx::assert_abs_diff_eq;
    use cardio::features::FeatureSet;
    use cardio_datasets::{cohort, ID_COLUMN, TARGET};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    fn pipeline(family: ModelFamily, params: &ParamSet, table: &Table) -> PipelineParams {
        let features = FeatureSet::classify(table, ID_COLUMN, TARGET, "flag_").unwrap();
        PipelineParams::new(
            ColumnTransformer::new(features.numeric, features.categorical),
            family.build(params, 22).unwrap(),
        )
    }

    fn tree_params() -> ParamSet {
        let mut params = ParamSet::new();
        params.insert("max_depth".to_string(), ParamValue::Int(4));
        params.insert("min_samples_leaf".to_string(), ParamValue::Int(10));
        params.insert("criterion".to_string(), ParamValue::Text("gini".to_string()));
        params
    }

    #[test]
    fn pipeline_scores_raw_tables() {
        let table = cohort(400, 0.3, &mut Xoshiro256Plus::seed_from_u64(3)).unwrap();
        let targets = table.binary(TARGET).unwrap();
        let dataset = DatasetBase::new(table.clone(), targets);

        let fitted = pipeline(ModelFamily::DecisionTree, &tree_params(), &table)
            .fit(&dataset)
            .unwrap();

        let proba = fitted.predict_proba(&table).unwrap();
        assert_eq!(proba.dim(), (400, 2));
        for row in proba.rows() {
            assert_abs_diff_eq!(row[0] + row[1], 1.0, epsilon = 1e-12);
            assert!(row[1] >= 0.0 && row[1] <= 1.0);
        }
        assert_eq!(fitted.positive_proba(&table).unwrap(), proba.column(1));

        let importance = fitted.feature_importance().unwrap();
        assert_eq!(importance.len(), fitted.transformer().nfeatures_out());
        assert!(importance.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn logistic_regression_has_no_importance() {
        let table = cohort(200, 0.3, &mut Xoshiro256Plus::seed_from_u64(4)).unwrap();
        let targets = table.binary(TARGET).unwrap();
        let dataset = DatasetBase::new(table.clone(), targets);

        let mut params = ParamSet::new();
        params.insert("c".to_string(), ParamValue::Float(1.0));
        params.insert("penalty".to_string(), ParamValue::Text("l2".to_string()));
        let fitted = pipeline(ModelFamily::LogisticRegression, &params, &table)
            .fit(&dataset)
            .unwrap();

        assert!(fitted.feature_importance().is_none());
        assert_eq!(fitted.model().classes(), &[false, true]);
    }

    #[test]
    fn single_class_tree_predicts_its_class() {
        let table = cohort(50, 0.0, &mut Xoshiro256Plus::seed_from_u64(5)).unwrap();
        let targets = table.binary(TARGET).unwrap();
        let dataset = DatasetBase::new(table.clone(), targets);

        let fitted = pipeline(ModelFamily::DecisionTree, &tree_params(), &table)
            .fit(&dataset)
            .unwrap();

        let proba = fitted.positive_proba(&table).unwrap();
        assert!(proba.iter().all(|p| *p == 0.0));
    }

    #[test]
    fn fitted_pipeline_survives_json() {
        let table = cohort(200, 0.3, &mut Xoshiro256Plus::seed_from_u64(6)).unwrap();
        let targets = table.binary(TARGET).unwrap();
        let dataset = DatasetBase::new(table.clone(), targets);

        let fitted = pipeline(ModelFamily::DecisionTree, &tree_params(), &table)
            .fit(&dataset)
            .unwrap();
        let json = serde_json::to_string(&fitted).unwrap();
        let restored: FittedPipeline = serde_json::from_str(&json).unwrap();

        assert_eq!(
            restored.predict_proba(&table).unwrap(),
            fitted.predict_proba(&table).unwrap()
        );
    }
}
