//! Randomized hyperparameter search with stratified cross-validation
//!
//! For every family the search draws `n_iter` configurations from the family's search space,
//! scores each of them on `cv_folds` stratified folds of the training table and refits the best
//! one on the whole training table. The (configuration, fold) fits are independent and run on
//! the `rayon` thread pool, the scores are reduced in draw order afterwards.

use std::fmt;

use cardio::features::FeatureSet;
use cardio::metrics::{BinaryClassification, MetricsReport};
use cardio::prelude::{DatasetBase, Fit, Table};
use cardio_preprocessing::ColumnTransformer;
use chrono::Utc;
use log::{debug, info, warn};
use ndarray::{Array1, ArrayBase, Data, Ix1};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{PipelineConfig, SearchConfig};
use crate::error::{PipelineError, Result};
use crate::model::{FittedPipeline, PipelineParams};
use crate::registry::ModelFamily;
use crate::search_space::{describe, ParamSet};
use crate::store::{ResultStore, TrainedResult};

/// A patient table with its binary outcome
pub type Cohort = DatasetBase<Table, Array1<bool>>;

/// Criterion ranking the candidate configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scoring {
    RocAuc,
    Accuracy,
}

impl Default for Scoring {
    fn default() -> Self {
        Scoring::RocAuc
    }
}

impl Scoring {
    pub fn name(&self) -> &'static str {
        match self {
            Scoring::RocAuc => "roc_auc",
            Scoring::Accuracy => "accuracy",
        }
    }

    /// Score positive-class probabilities against the outcome
    ///
    /// Returns `None` when the score is undefined, which happens for the ROC AUC of a
    /// validation set holding a single class.
    pub fn score<D: Data<Elem = f64>>(
        &self,
        truth: &[bool],
        proba: &ArrayBase<D, Ix1>,
    ) -> Result<Option<f64>> {
        if truth.len() != proba.len() {
            return Err(cardio::error::Error::LengthMismatch {
                expected: truth.len(),
                actual: proba.len(),
            }
            .into());
        }
        if truth.is_empty() {
            return Ok(None);
        }

        match self {
            Scoring::RocAuc => {
                let npositive = truth.iter().filter(|x| **x).count();
                if npositive == 0 || npositive == truth.len() {
                    return Ok(None);
                }
                Ok(Some(proba.roc(truth)?.area_under_curve()))
            }
            Scoring::Accuracy => {
                let correct = truth
                    .iter()
                    .zip(proba.iter())
                    .filter(|(t, p)| (**p > 0.5) == **t)
                    .count();
                Ok(Some(correct as f64 / truth.len() as f64))
            }
        }
    }
}

impl fmt::Display for Scoring {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outer stratified split of the patient table
#[derive(Debug, Clone)]
pub struct TrainTest {
    pub train: Cohort,
    pub test: Cohort,
}

impl TrainTest {
    /// Split `table` on the binary `target` column, keeping the outcome rate in both parts
    pub fn split(table: &Table, target: &str, test_ratio: f32, seed: u64) -> Result<TrainTest> {
        let targets = table.binary(target)?;
        let cohort = DatasetBase::new(table.clone(), targets);
        let mut rng = Xoshiro256Plus::seed_from_u64(seed);
        let (train, test) = cohort.stratified_split(test_ratio, &mut rng)?;

        Ok(TrainTest { train, test })
    }
}

/// Cross-validation record of one drawn configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub params: ParamSet,
    /// Scores of the folds which could be scored, in fold order
    pub fold_scores: Vec<f64>,
    /// Mean over `fold_scores`, `None` when the configuration failed or no fold was scored
    pub mean_score: Option<f64>,
}

impl CandidateResult {
    /// Score used for ranking, failed configurations rank below everything else
    pub fn rank_score(&self) -> f64 {
        self.mean_score.unwrap_or(f64::NEG_INFINITY)
    }

    pub fn failed(&self) -> bool {
        self.mean_score.is_none()
    }
}

/// Index of the best candidate, the earliest draw wins a tie
fn best_candidate(history: &[CandidateResult]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, candidate) in history.iter().enumerate() {
        if candidate.failed() {
            continue;
        }
        match best {
            Some(b) if history[b].rank_score() >= candidate.rank_score() => {}
            _ => best = Some(idx),
        }
    }
    best
}

/// Randomized search over the hyperparameters of a model family
#[derive(Debug, Clone, PartialEq)]
pub struct RandomizedSearch {
    n_iter: usize,
    cv_folds: usize,
    seed: u64,
    scoring: Scoring,
    threshold: f64,
}

impl RandomizedSearch {
    pub fn new(n_iter: usize, cv_folds: usize, seed: u64) -> Self {
        RandomizedSearch {
            n_iter,
            cv_folds,
            seed,
            scoring: Scoring::default(),
            threshold: 0.5,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        let search: &SearchConfig = &config.search;

        RandomizedSearch::new(search.n_iter, search.cv_folds, search.seed)
            .scoring(search.scoring)
            .threshold(config.report.threshold)
    }

    pub fn scoring(mut self, scoring: Scoring) -> Self {
        self.scoring = scoring;
        self
    }

    /// Probability above which the train and test metrics count a sample as positive
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Draw, cross-validate and score the configurations of `family`
    ///
    /// Returns the history in draw order. A configuration whose hyperparameters are rejected
    /// or whose fit fails on any fold is marked as failed.
    pub fn cross_validate(
        &self,
        family: ModelFamily,
        train: &Cohort,
        features: &FeatureSet,
    ) -> Result<Vec<CandidateResult>> {
        let space = family.search_space();
        space.check()?;

        let mut rng = Xoshiro256Plus::seed_from_u64(self.seed);
        let draws = space.sample_n(self.n_iter, &mut rng);
        rng.jump();
        let folds = train.stratified_fold(self.cv_folds, &mut rng)?;

        let transformer =
            ColumnTransformer::new(features.numeric.clone(), features.categorical.clone());
        let pipelines = draws
            .iter()
            .map(|params| match family.build(params, self.seed) {
                Ok(model) => Some(PipelineParams::new(transformer.clone(), model)),
                Err(err) => {
                    warn!("{}: rejected configuration {}: {}", family, describe(params), err);
                    None
                }
            })
            .collect::<Vec<_>>();

        let jobs = pipelines
            .iter()
            .enumerate()
            .filter_map(|(idx, pipeline)| pipeline.as_ref().map(|p| (idx, p)))
            .flat_map(|(idx, pipeline)| (0..folds.len()).map(move |fold| (idx, fold, pipeline)))
            .collect::<Vec<_>>();

        let scoring = self.scoring;
        let outcomes = jobs
            .par_iter()
            .map(|(idx, fold, pipeline)| {
                let (fit_part, valid_part) = &folds[*fold];
                let outcome = pipeline
                    .fit(fit_part)
                    .and_then(|fitted| fitted.positive_proba(valid_part.records()))
                    .and_then(|proba| scoring.score(&valid_part.targets().to_vec(), &proba))
                    .map_err(|err| err.to_string());
                (*idx, *fold, outcome)
            })
            .collect::<Vec<_>>();

        let mut history = draws
            .into_iter()
            .map(|params| CandidateResult {
                params,
                fold_scores: Vec::new(),
                mean_score: None,
            })
            .collect::<Vec<_>>();
        let mut failed = pipelines.iter().map(Option::is_none).collect::<Vec<_>>();

        for (idx, fold, outcome) in outcomes {
            match outcome {
                Ok(Some(score)) => history[idx].fold_scores.push(score),
                Ok(None) => warn!(
                    "{}: fold {} of configuration {} holds a single class and is not scored",
                    family, fold, idx
                ),
                Err(err) => {
                    warn!("{}: configuration {} failed on fold {}: {}", family, idx, fold, err);
                    failed[idx] = true;
                }
            }
        }

        for (idx, candidate) in history.iter_mut().enumerate() {
            if failed[idx] || candidate.fold_scores.is_empty() {
                candidate.fold_scores.clear();
                continue;
            }
            let nscored = candidate.fold_scores.len() as f64;
            let mean = candidate.fold_scores.iter().sum::<f64>() / nscored;
            candidate.mean_score = Some(mean);
            debug!(
                "{}: draw {} {} = {:.4} ({})",
                family,
                idx,
                scoring,
                mean,
                describe(&candidate.params)
            );
        }

        Ok(history)
    }

    /// Select, refit and evaluate the best configuration of `family`
    pub fn evaluate_family(
        &self,
        family: ModelFamily,
        data: &TrainTest,
        features: &FeatureSet,
    ) -> Result<TrainedResult> {
        info!(
            "{}: searching {} configurations with {}-fold cross-validation",
            family, self.n_iter, self.cv_folds
        );
        let history = self.cross_validate(family, &data.train, features)?;
        let best = best_candidate(&history)
            .ok_or_else(|| PipelineError::DegenerateSearch(family.name().to_string()))?;
        let best_params = history[best].params.clone();
        let best_score = history[best].rank_score();
        info!(
            "{}: best {} = {:.4} with {}",
            family,
            self.scoring,
            best_score,
            describe(&best_params)
        );

        let transformer =
            ColumnTransformer::new(features.numeric.clone(), features.categorical.clone());
        let pipeline = PipelineParams::new(transformer, family.build(&best_params, self.seed)?)
            .fit(&data.train)?;

        let train_metrics = self.metrics(&pipeline, &data.train)?;
        let test_metrics = self.metrics(&pipeline, &data.test)?;
        info!(
            "{}: test auc = {:.4}, accuracy = {:.4}",
            family, test_metrics.auc, test_metrics.accuracy
        );

        Ok(TrainedResult {
            family,
            pipeline,
            features: features.clone(),
            best_params,
            best_score,
            scoring: self.scoring,
            train_metrics,
            test_metrics,
            history,
            trained_at: Utc::now(),
        })
    }

    fn metrics(&self, pipeline: &FittedPipeline, cohort: &Cohort) -> Result<MetricsReport> {
        let proba = pipeline.positive_proba(cohort.records())?;
        let truth = cohort.targets().to_vec();
        Ok(MetricsReport::from_scores(&truth, &proba, self.threshold)?)
    }
}

/// Split the processed table and select a model for every configured family
///
/// Families are searched one after another and stored under their name.
pub fn train_families(config: &PipelineConfig, table: &Table) -> Result<ResultStore> {
    let data = &config.data;
    let features = FeatureSet::classify(table, &data.id_column, &data.target, &data.flag_prefix)?;
    info!(
        "{} categorical and {} numeric features",
        features.categorical.len(),
        features.numeric.len()
    );

    let split = TrainTest::split(table, &data.target, config.split.test_ratio, config.split.seed)?;
    info!(
        "{} training and {} test patients",
        split.train.records().nrows(),
        split.test.records().nrows()
    );

    let search = RandomizedSearch::from_config(config);
    let mut store = ResultStore::new();
    for family in config.search.families()? {
        let result = search.evaluate_family(family, &split, &features)?;
        store.insert(family.name(), result);
    }

    Ok(store)
}
