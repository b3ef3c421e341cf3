//! Exploratory analysis of the processed patient table
//!
//! The stage drops implausible body measurements, writes the cleaned table back and reports
//! numeric summaries, category frequencies, chi-square associations and correlations as CSV
//! files.

use std::fs;

use cardio::association::ChiSquareTest;
use cardio::error::Error;
use cardio::features::FeatureSet;
use cardio::profile::{describe, frequency_table, NumericSummary};
use cardio::table::{Column, Table};
use cardio::DatasetBase;
use log::{info, warn};

use crate::config::{ExploreConfig, PipelineConfig};
use crate::error::Result;

pub const SUMMARY_FILE: &str = "numeric_summary.csv";
pub const FREQUENCY_FILE: &str = "categorical_frequency.csv";
pub const CHI_SQUARE_FILE: &str = "chi_square.csv";
pub const CORRELATION_FILE: &str = "correlation.csv";

/// Keep the patients taller than `min_height` and heavier than `min_weight`
///
/// Rows with a missing height or weight are dropped as well.
pub fn filter_outliers(table: &Table, limits: &ExploreConfig) -> Result<Table> {
    let height = table.numeric("height")?;
    let weight = table.numeric("weight")?;
    let keep = height
        .iter()
        .zip(weight.iter())
        .map(|(h, w)| *h > limits.min_height && *w > limits.min_weight)
        .collect::<Vec<_>>();

    Ok(table.filter(&keep)?)
}

/// Count, mean, standard deviation and quartiles of every numeric feature
pub fn numeric_summary(table: &Table, features: &FeatureSet) -> Result<Table> {
    let summaries = describe(table, &features.numeric)?;
    let stat = |f: fn(&NumericSummary) -> f64| {
        Column::Numeric(summaries.iter().map(f).collect())
    };

    Ok(Table::from_columns(vec![
        (
            "feature",
            Column::Categorical(summaries.iter().map(|s| s.name.clone()).collect()),
        ),
        ("count", stat(|s| s.count as f64)),
        ("mean", stat(|s| s.mean)),
        ("std", stat(|s| s.std)),
        ("min", stat(|s| s.min)),
        ("25%", stat(|s| s.q25)),
        ("50%", stat(|s| s.median)),
        ("75%", stat(|s| s.q75)),
        ("max", stat(|s| s.max)),
    ])?)
}

/// Value counts of every categorical feature, split by the outcome
pub fn categorical_frequency(table: &Table, features: &FeatureSet, target: &str) -> Result<Table> {
    let mut rows = Vec::new();
    for feature in &features.categorical {
        rows.extend(frequency_table(table, feature, target)?);
    }

    Ok(Table::from_columns(vec![
        (
            "feature",
            Column::Categorical(rows.iter().map(|r| r.feature.clone()).collect()),
        ),
        (
            "value",
            Column::Categorical(rows.iter().map(|r| r.value.clone()).collect()),
        ),
        (
            "count_without",
            Column::Numeric(rows.iter().map(|r| r.count_without as f64).collect()),
        ),
        (
            "pct_without",
            Column::Numeric(rows.iter().map(|r| r.pct_without).collect()),
        ),
        (
            "count_with",
            Column::Numeric(rows.iter().map(|r| r.count_with as f64).collect()),
        ),
        (
            "pct_with",
            Column::Numeric(rows.iter().map(|r| r.pct_with).collect()),
        ),
    ])?)
}

/// Chi-square test of every categorical feature against the outcome
///
/// A feature whose contingency table has an empty row or column has no test statistic. It is
/// logged and reported with empty statistic and p-value cells.
pub fn chi_square_report(table: &Table, features: &FeatureSet, target: &str) -> Result<Table> {
    let mut statistic = Vec::with_capacity(features.categorical.len());
    let mut dof = Vec::with_capacity(features.categorical.len());
    let mut p_value = Vec::with_capacity(features.categorical.len());

    for feature in &features.categorical {
        match ChiSquareTest::from_table(table, feature, target) {
            Ok(test) => {
                statistic.push(test.statistic);
                dof.push(test.dof as f64);
                p_value.push(test.p_value);
            }
            Err(Error::DegenerateStatistic(reason)) => {
                warn!("no chi-square test for `{}`: {}", feature, reason);
                statistic.push(f64::NAN);
                dof.push(f64::NAN);
                p_value.push(f64::NAN);
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(Table::from_columns(vec![
        ("feature", Column::Categorical(features.categorical.clone())),
        ("statistic", Column::Numeric(statistic)),
        ("dof", Column::Numeric(dof)),
        ("p_value", Column::Numeric(p_value)),
    ])?)
}

/// Pearson correlation matrix of the numeric features and the outcome
pub fn correlation_report(table: &Table, features: &FeatureSet, target: &str) -> Result<Table> {
    let mut names = features.numeric.clone();
    names.push(target.to_string());

    let records = table.to_array(&names)?;
    let dataset = DatasetBase::new(records, ()).with_feature_names(names.clone());
    let correlation = dataset.pearson_correlation()?;
    let coefficients = correlation.get_coeffs();

    let mut report = Table::from_columns(vec![("feature", Column::Categorical(names.clone()))])?;
    for (idx, name) in names.iter().enumerate() {
        report.push_column(name.clone(), Column::Numeric(coefficients.column(idx).to_vec()))?;
    }

    Ok(report)
}

/// Statistics of one exploratory run
#[derive(Debug, Clone, PartialEq)]
pub struct ExploreSummary {
    pub nrows_before: usize,
    pub nrows_after: usize,
    pub features: FeatureSet,
}

/// Clean the processed table in place and write the exploratory reports
pub fn run(config: &PipelineConfig) -> Result<ExploreSummary> {
    let data = &config.data;
    let table = Table::read_csv(&data.processed_path)?;
    let nrows_before = table.nrows();

    let table = filter_outliers(&table, &config.explore)?;
    info!(
        "kept {} of {} patients above {} cm and {} kg",
        table.nrows(),
        nrows_before,
        config.explore.min_height,
        config.explore.min_weight
    );
    table.write_csv(&data.processed_path)?;

    let features = FeatureSet::classify(&table, &data.id_column, &data.target, &data.flag_prefix)?;
    let dir = &config.report.report_dir;
    fs::create_dir_all(dir)?;

    numeric_summary(&table, &features)?.write_csv(dir.join(SUMMARY_FILE))?;
    categorical_frequency(&table, &features, &data.target)?.write_csv(dir.join(FREQUENCY_FILE))?;
    chi_square_report(&table, &features, &data.target)?.write_csv(dir.join(CHI_SQUARE_FILE))?;
    correlation_report(&table, &features, &data.target)?.write_csv(dir.join(CORRELATION_FILE))?;
    info!("exploratory reports written to {}", dir.display());

    Ok(ExploreSummary {
        nrows_before,
        nrows_after: table.nrows(),
        features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cardio_datasets::{cohort, ID_COLUMN, TARGET};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    fn patients() -> Table {
        Table::from_columns(vec![
            (ID_COLUMN, Column::Numeric(vec![1., 2., 3., 4.])),
            ("height", Column::Numeric(vec![150., 148., 170., f64::NAN])),
            ("weight", Column::Numeric(vec![60., 70., 48.5, 80.])),
            (
                "smoker_status",
                Column::Categorical(vec!["yes".into(), "no".into(), "no".into(), "no".into()]),
            ),
            ("flag_constant", Column::Numeric(vec![0., 0., 0., 0.])),
            (TARGET, Column::Numeric(vec![1., 0., 1., 0.])),
        ])
        .unwrap()
    }

    #[test]
    fn outliers_are_dropped() {
        let filtered = filter_outliers(&patients(), &ExploreConfig::default()).unwrap();
        assert_eq!(filtered.numeric(ID_COLUMN).unwrap(), &[1., 3.]);
    }

    #[test]
    fn constant_features_have_no_chi_square() {
        let table = patients();
        let features = FeatureSet::classify(&table, ID_COLUMN, TARGET, "flag_").unwrap();
        let report = chi_square_report(&table, &features, TARGET).unwrap();

        assert_eq!(report.categorical("feature").unwrap(), &["smoker_status", "flag_constant"]);
        let p_value = report.numeric("p_value").unwrap();
        assert!(p_value[0] >= 0.0 && p_value[0] <= 1.0);
        assert!(p_value[1].is_nan());
        assert_eq!(report.column("p_value").unwrap().cell(1), "");
    }

    #[test]
    fn correlation_includes_the_outcome() {
        let table = cohort(500, 0.3, &mut Xoshiro256Plus::seed_from_u64(8)).unwrap();
        let features = FeatureSet::classify(&table, ID_COLUMN, TARGET, "flag_").unwrap();
        let report = correlation_report(&table, &features, TARGET).unwrap();

        let n = features.numeric.len() + 1;
        assert_eq!(report.nrows(), n);
        assert_eq!(report.ncols(), n + 1);
        assert_abs_diff_eq!(report.numeric(TARGET).unwrap()[n - 1], 1.0);
        // systolic pressure is shifted upwards by the outcome
        let systolic = features.numeric.iter().position(|x| x == "systolic_pressure").unwrap();
        assert!(report.numeric(TARGET).unwrap()[systolic] > 0.2);
    }

    #[test]
    fn summaries_cover_every_feature() {
        let table = cohort(200, 0.3, &mut Xoshiro256Plus::seed_from_u64(9)).unwrap();
        let features = FeatureSet::classify(&table, ID_COLUMN, TARGET, "flag_").unwrap();

        let summary = numeric_summary(&table, &features).unwrap();
        assert_eq!(summary.nrows(), features.numeric.len());
        assert!(summary.numeric("count").unwrap().iter().all(|c| *c == 200.0));

        let frequency = categorical_frequency(&table, &features, TARGET).unwrap();
        let gender = frequency
            .categorical("feature")
            .unwrap()
            .iter()
            .enumerate()
            .filter(|(_, f)| *f == "gender")
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();
        let counted = gender
            .iter()
            .map(|idx| {
                frequency.numeric("count_without").unwrap()[*idx]
                    + frequency.numeric("count_with").unwrap()[*idx]
            })
            .sum::<f64>();
        assert_eq!(counted, 200.0);
    }

    #[test]
    fn run_rewrites_the_processed_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::default();
        config.data.processed_path = dir.path().join("processed.csv");
        config.report.report_dir = dir.path().join("reports");
        cohort(300, 0.3, &mut Xoshiro256Plus::seed_from_u64(10))
            .unwrap()
            .write_csv(&config.data.processed_path)
            .unwrap();

        let summary = run(&config).unwrap();
        assert!(summary.nrows_after <= summary.nrows_before);
        assert_eq!(
            Table::read_csv(&config.data.processed_path).unwrap().nrows(),
            summary.nrows_after
        );
        for file in &[SUMMARY_FILE, FREQUENCY_FILE, CHI_SQUARE_FILE, CORRELATION_FILE] {
            assert!(config.report.report_dir.join(file).exists());
        }
    }
}
