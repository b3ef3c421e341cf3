// cardio-ensemble/tests/cohort.rs

use cardio::features::FeatureSet;
use cardio::prelude::*;
use cardio_datasets::{cohort, ID_COLUMN, TARGET};
use cardio_ensemble::{AdaBoost, GradientBoosting};
use ndarray::Array2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

fn split_cohort(seed: u64) -> (Dataset<f64, bool>, Dataset<f64, bool>) {
    let mut rng = Xoshiro256Plus::seed_from_u64(seed);
    let table = cohort(1500, 0.3, &mut rng).unwrap();
    let features = FeatureSet::classify(&table, ID_COLUMN, TARGET, "flag_").unwrap();

    let records: Array2<f64> = table.to_array(&features.numeric).unwrap();
    let targets = table.binary(TARGET).unwrap();

    Dataset::new(records, targets)
        .with_feature_names(features.numeric)
        .stratified_split(0.25, &mut rng)
        .unwrap()
}

fn validation_auc(proba: &Array2<f64>, valid: &Dataset<f64, bool>) -> f64 {
    let truth = valid.targets().to_vec();
    MetricsReport::from_probabilities(&truth, proba, 0.5)
        .unwrap()
        .auc
}

#[test]
fn gradient_boosting_ranks_the_cohort() {
    let (train, valid) = split_cohort(11);
    let model = GradientBoosting::params()
        .n_estimators(60)
        .max_depth(Some(3))
        .subsample(0.8)
        .fit(&train)
        .expect("Training failed");

    let auc = validation_auc(&model.predict_proba(valid.records()), &valid);
    assert!(auc >= 0.7, "Expected a ROC AUC of at least 0.7, got {:.2}", auc);
}

#[test]
fn leaf_wise_boosting_ranks_the_cohort() {
    let (train, valid) = split_cohort(12);
    let model = GradientBoosting::params()
        .n_estimators(60)
        .max_depth(None)
        .max_leaves(Some(15))
        .min_samples_leaf(20)
        .fit(&train)
        .expect("Training failed");

    let auc = validation_auc(&model.predict_proba(valid.records()), &valid);
    assert!(auc >= 0.7, "Expected a ROC AUC of at least 0.7, got {:.2}", auc);
}

#[test]
fn adaboost_ranks_the_cohort() {
    let (train, valid) = split_cohort(13);
    let model = AdaBoost::params()
        .n_estimators(40)
        .fit(&train)
        .expect("Training failed");

    assert!(model.n_estimators() >= 1);
    let auc = validation_auc(&model.predict_proba(valid.records()), &valid);
    assert!(auc >= 0.7, "Expected a ROC AUC of at least 0.7, got {:.2}", auc);
}
