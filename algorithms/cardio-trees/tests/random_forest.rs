// cardio-trees/tests/random_forest.rs

use cardio::features::FeatureSet;
use cardio::prelude::*;
use cardio_datasets::{cohort, ID_COLUMN, TARGET};
use cardio_trees::{DecisionTree, RandomForest};
use ndarray::Array2;
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn numeric_cohort(seed: u64) -> Dataset<f64, bool> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let table = cohort(1200, 0.3, &mut rng).unwrap();
    let features = FeatureSet::classify(&table, ID_COLUMN, TARGET, "flag_").unwrap();

    let records: Array2<f64> = table.to_array(&features.numeric).unwrap();
    let targets = table.binary(TARGET).unwrap();

    Dataset::new(records, targets).with_feature_names(features.numeric)
}

#[test]
fn cohort_random_forest_beats_chance() {
    let mut rng = SmallRng::seed_from_u64(42);
    let (train, valid) = numeric_cohort(1).stratified_split(0.25, &mut rng).unwrap();

    let model = RandomForest::params(50)
        .tree_params(
            DecisionTree::params()
                .max_depth(Some(8))
                .min_weight_leaf(10.0)
                .max_features(Some(0.5)),
        )
        .seed(42)
        .fit(&train)
        .expect("Training failed");

    let proba = model.predict_proba(valid.records());
    let truth = valid.targets().to_vec();
    let report = MetricsReport::from_probabilities(&truth, &proba, 0.5).unwrap();

    assert!(
        report.auc >= 0.7,
        "Expected a ROC AUC of at least 0.7 on the cohort, got {:.2}",
        report.auc
    );
}

#[test]
fn importances_are_labelled_by_feature() {
    let dataset = numeric_cohort(2);
    let tree = DecisionTree::params()
        .max_depth(Some(4))
        .fit(&dataset)
        .unwrap();

    let importance = tree.feature_importance();
    assert_eq!(importance.len(), dataset.nfeatures());
    for node in tree.iter_nodes().filter(|node| !node.is_leaf()) {
        let name = node.feature_name().unwrap();
        assert!(dataset.feature_names().contains(name));
    }
}
