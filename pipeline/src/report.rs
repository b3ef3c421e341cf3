//! Comparison, scoring and threshold reports of the trained models
//!
//! Every report is a [`Table`], so it can be printed and written as a CSV file the same way.

use std::fs;
use std::path::Path;

use cardio::metrics::{BinaryClassification, MetricsReport};
use cardio::table::{Column, Table};
use log::{info, warn};
use ndarray::{ArrayBase, Data, Ix1};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::store::{ResultStore, TrainedResult};

pub const METRICS_FILE: &str = "metrics_comparison.csv";
pub const THRESHOLDS_FILE: &str = "precision_recall_curve.csv";
pub const IMPORTANCE_FILE: &str = "feature_importance.csv";

/// Long table of the train and test metrics, one column per trained family
///
/// The rows list the train metrics first and the test metrics after them, both in the order
/// of [`MetricsReport::KEYS`].
pub fn metric_comparison(store: &ResultStore) -> Result<Table> {
    let results = store.by_family();
    let mut split = Vec::new();
    let mut metric = Vec::new();
    for name in &["train", "test"] {
        for key in MetricsReport::KEYS.iter() {
            split.push(name.to_string());
            metric.push(key.to_string());
        }
    }

    let mut table = Table::from_columns(vec![
        ("split", Column::Categorical(split)),
        ("metric", Column::Categorical(metric)),
    ])?;
    for result in results {
        let values = [&result.train_metrics, &result.test_metrics]
            .iter()
            .flat_map(|report| MetricsReport::KEYS.iter().map(move |key| report.get(key)))
            .map(|value| value.unwrap_or(f64::NAN))
            .collect();
        table.push_column(result.family.name(), Column::Numeric(values))?;
    }

    Ok(table)
}

/// Positive-outcome probability of every patient of `table`
pub fn score_table(result: &TrainedResult, table: &Table, id_column: &str) -> Result<Table> {
    let proba = result.pipeline.positive_proba(table)?;
    let ids = table.column(id_column)?.clone();

    Ok(Table::from_columns(vec![
        (id_column.to_string(), ids),
        ("probability".to_string(), Column::Numeric(proba.to_vec())),
    ])?)
}

/// Operating point on the precision / recall curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdChoice {
    pub threshold: f64,
    pub precision: f64,
    pub recall: f64,
}

/// Precision and recall for every distinct probability used as a threshold
pub fn threshold_table<D: Data<Elem = f64>>(
    truth: &[bool],
    proba: &ArrayBase<D, Ix1>,
) -> Result<Table> {
    let curve = proba.precision_recall(truth)?;

    Ok(Table::from_columns(vec![
        ("threshold", Column::Numeric(curve.thresholds)),
        ("precision", Column::Numeric(curve.precision)),
        ("recall", Column::Numeric(curve.recall)),
    ])?)
}

/// Threshold with the highest recall not exceeding `max_recall`
///
/// Among thresholds with equal recall the smallest one is chosen. Returns `None` when every
/// threshold has a larger recall than the cap.
pub fn select_threshold<D: Data<Elem = f64>>(
    truth: &[bool],
    proba: &ArrayBase<D, Ix1>,
    max_recall: f64,
) -> Result<Option<ThresholdChoice>> {
    let curve = proba.precision_recall(truth)?;

    let mut best: Option<ThresholdChoice> = None;
    for ((threshold, precision), recall) in curve
        .thresholds
        .iter()
        .zip(curve.precision.iter())
        .zip(curve.recall.iter())
    {
        if *recall > max_recall {
            continue;
        }
        if best.map_or(true, |b| *recall > b.recall) {
            best = Some(ThresholdChoice {
                threshold: *threshold,
                precision: *precision,
                recall: *recall,
            });
        }
    }

    Ok(best)
}

/// Importances of a tree-based model, labelled with the transformed column names
pub fn importance_table(result: &TrainedResult) -> Result<Option<Table>> {
    let labelled = match result.pipeline.feature_importance() {
        Some(labelled) => labelled,
        None => return Ok(None),
    };
    let (names, values): (Vec<String>, Vec<f64>) = labelled.into_iter().unzip();

    Ok(Some(Table::from_columns(vec![
        ("feature", Column::Categorical(names)),
        ("importance", Column::Numeric(values)),
    ])?))
}

/// The trained family with the largest test ROC AUC
pub fn best_result(store: &ResultStore) -> Option<&TrainedResult> {
    store
        .by_family()
        .into_iter()
        .fold(None, |best: Option<&TrainedResult>, result| match best {
            Some(b) if b.test_metrics.auc >= result.test_metrics.auc => Some(b),
            _ => Some(result),
        })
}

/// Render a table with right aligned columns
pub fn render(table: &Table) -> String {
    let columns = table
        .iter()
        .map(|(name, column)| {
            let cells = (0..column.len())
                .map(|idx| match column {
                    Column::Numeric(x) if !x[idx].is_nan() => format!("{:.4}", x[idx]),
                    _ => column.cell(idx),
                })
                .collect::<Vec<_>>();
            let width = cells.iter().map(|c| c.len()).max().unwrap_or(0).max(name.len());
            (name, cells, width)
        })
        .collect::<Vec<_>>();

    let mut out = String::new();
    let header = columns
        .iter()
        .map(|(name, _, width)| format!("{:>width$}", name, width = *width))
        .collect::<Vec<_>>();
    out.push_str(&header.join("  "));
    out.push('\n');
    for row in 0..table.nrows() {
        let line = columns
            .iter()
            .map(|(_, cells, width)| format!("{:>width$}", cells[row], width = *width))
            .collect::<Vec<_>>();
        out.push_str(&line.join("  "));
        out.push('\n');
    }

    out
}

/// Write the comparison, threshold and importance reports of a trained store
///
/// The threshold and importance reports are computed for the family with the best test ROC
/// AUC, scored on the whole processed table.
pub fn run(config: &PipelineConfig, store: &ResultStore, table: &Table) -> Result<String> {
    let dir = &config.report.report_dir;
    fs::create_dir_all(dir)?;

    let comparison = metric_comparison(store)?;
    comparison.write_csv(dir.join(METRICS_FILE))?;
    let mut summary = render(&comparison);

    let best = best_result(store)
        .ok_or_else(|| PipelineError::Config("the result store holds no trained model".to_string()))?;
    info!("reporting thresholds and importances of {}", best.family);

    let truth = table.binary(&config.data.target)?.to_vec();
    let proba = best.pipeline.positive_proba(table)?;
    threshold_table(&truth, &proba)?.write_csv(dir.join(THRESHOLDS_FILE))?;
    match select_threshold(&truth, &proba, config.report.max_recall)? {
        Some(choice) => summary.push_str(&format!(
            "\n{}: threshold {:.4} gives recall {:.4} at precision {:.4}\n",
            best.family, choice.threshold, choice.recall, choice.precision
        )),
        None => warn!(
            "{}: no threshold keeps the recall below {}",
            best.family, config.report.max_recall
        ),
    }

    match importance_table(best)? {
        Some(importance) => importance.write_csv(dir.join(IMPORTANCE_FILE))?,
        None => info!("{} does not report feature importances", best.family),
    }

    info!("reports written to {}", dir.display());
    Ok(summary)
}

/// Score `table` with the stored model of `family` and write `patient_id, probability`
pub fn score<P: AsRef<Path>>(
    config: &PipelineConfig,
    result: &TrainedResult,
    table: &Table,
    output: P,
) -> Result<()> {
    let scores = score_table(result, table, &config.data.id_column)?;
    if let Some(parent) = output.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    scores.write_csv(output.as_ref())?;
    info!(
        "scored {} patients with {} into {}",
        scores.nrows(),
        result.family,
        output.as_ref().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ModelFamily;
    use crate::search::{RandomizedSearch, TrainTest};
    use approx::assert_abs_diff_eq;
    use cardio::features::FeatureSet;
    use cardio_datasets::{cohort, ID_COLUMN, TARGET};
    use ndarray::array;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    fn trained_store(table: &Table) -> ResultStore {
        let features = FeatureSet::classify(table, ID_COLUMN, TARGET, "flag_").unwrap();
        let data = TrainTest::split(table, TARGET, 0.2, 42).unwrap();
        let search = RandomizedSearch::new(2, 2, 9);

        let mut store = ResultStore::new();
        for family in &[ModelFamily::DecisionTree, ModelFamily::LogisticRegression] {
            let result = search.evaluate_family(*family, &data, &features).unwrap();
            store.insert(family.name(), result);
        }
        store
    }

    #[test]
    fn comparison_is_a_long_table() {
        let table = cohort(300, 0.3, &mut Xoshiro256Plus::seed_from_u64(1)).unwrap();
        let store = trained_store(&table);
        let comparison = metric_comparison(&store).unwrap();

        assert_eq!(comparison.nrows(), 10);
        assert_eq!(
            comparison.names(),
            &["split", "metric", "Logistic Regression", "Decision Tree"]
        );
        assert_eq!(comparison.categorical("split").unwrap()[5], "test");
        assert_eq!(comparison.categorical("metric").unwrap()[1], "auc");

        let tree = store.get("Decision Tree").unwrap();
        assert_eq!(
            comparison.numeric("Decision Tree").unwrap()[6],
            tree.test_metrics.auc
        );
        assert!(render(&comparison).lines().count() == 11);
    }

    #[test]
    fn scores_keep_patient_ids() {
        let table = cohort(300, 0.3, &mut Xoshiro256Plus::seed_from_u64(2)).unwrap();
        let store = trained_store(&table);
        let scores = score_table(store.get("Decision Tree").unwrap(), &table, ID_COLUMN).unwrap();

        assert_eq!(scores.names(), &[ID_COLUMN, "probability"]);
        assert_eq!(scores.numeric(ID_COLUMN).unwrap(), table.numeric(ID_COLUMN).unwrap());
        assert!(scores
            .numeric("probability")
            .unwrap()
            .iter()
            .all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn threshold_respects_the_recall_cap() {
        let truth = [true, true, true, true, false, false, false, false];
        let proba = array![0.9, 0.8, 0.7, 0.3, 0.6, 0.4, 0.2, 0.1];

        let choice = select_threshold(&truth, &proba, 0.81).unwrap().unwrap();
        // 0.3, 0.4 and 0.6 all reach a recall of 0.75
        assert_abs_diff_eq!(choice.recall, 0.75);
        assert_abs_diff_eq!(choice.threshold, 0.3);
        assert_abs_diff_eq!(choice.precision, 0.6);

        assert_eq!(select_threshold(&truth, &proba, 0.0).unwrap().map(|c| c.recall), Some(0.0));
        let table = threshold_table(&truth, &proba).unwrap();
        assert_eq!(table.nrows(), 8);
    }

    #[test]
    fn importances_only_for_trees() {
        let table = cohort(300, 0.3, &mut Xoshiro256Plus::seed_from_u64(3)).unwrap();
        let store = trained_store(&table);

        let logistic = store.get("Logistic Regression").unwrap();
        assert!(importance_table(logistic).unwrap().is_none());

        let tree = store.get("Decision Tree").unwrap();
        let importance = importance_table(tree).unwrap().unwrap();
        assert_eq!(importance.nrows(), tree.pipeline.transformer().nfeatures_out());
        let total = importance.numeric("importance").unwrap().iter().sum::<f64>();
        assert!(total == 0.0 || (total - 1.0).abs() < 1e-9);
    }
}
