//! Run configuration read from a TOML file
//!
//! Every section falls back to its defaults when it is missing from the file, and so does every
//! key inside a section.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::registry::ModelFamily;
use crate::search::Scoring;

/// A named section of the configuration file
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<()>;
}

fn invalid(section: &str, reason: String) -> PipelineError {
    PipelineError::Config(format!("[{}] {}", section, reason))
}

/// Location and schema of the processed patient table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub processed_path: PathBuf,
    pub target: String,
    pub id_column: String,
    pub flag_prefix: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            processed_path: PathBuf::from("data/processed/processed_cardio_data.csv"),
            target: "flag_cardio_disease".to_string(),
            id_column: "patient_id".to_string(),
            flag_prefix: "flag_".to_string(),
        }
    }
}

impl ConfigSection for DataConfig {
    fn section_name() -> &'static str {
        "data"
    }

    fn validate(&self) -> Result<()> {
        if self.target.is_empty() || self.id_column.is_empty() {
            return Err(invalid(
                Self::section_name(),
                "target and id_column must be named".to_string(),
            ));
        }
        if self.target == self.id_column {
            return Err(invalid(
                Self::section_name(),
                format!("target and id_column are both `{}`", self.target),
            ));
        }
        Ok(())
    }
}

/// Outer stratified train / test split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub test_ratio: f32,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
        }
    }
}

impl ConfigSection for SplitConfig {
    fn section_name() -> &'static str {
        "split"
    }

    fn validate(&self) -> Result<()> {
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(invalid(
                Self::section_name(),
                format!("test_ratio should be in (0, 1), but was {}", self.test_ratio),
            ));
        }
        Ok(())
    }
}

/// Budget and criterion of the randomized hyperparameter search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub n_iter: usize,
    pub cv_folds: usize,
    pub seed: u64,
    pub scoring: Scoring,
    /// Families to train, by name. All registered families when empty.
    pub families: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            n_iter: 100,
            cv_folds: 5,
            seed: 22,
            scoring: Scoring::RocAuc,
            families: Vec::new(),
        }
    }
}

impl SearchConfig {
    /// The configured families in registry order
    pub fn families(&self) -> Result<Vec<ModelFamily>> {
        if self.families.is_empty() {
            return Ok(ModelFamily::all().to_vec());
        }

        let mut selected = self
            .families
            .iter()
            .map(|name| {
                ModelFamily::from_name(name)
                    .ok_or_else(|| PipelineError::UnknownFamily(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        selected.sort_by_key(|family| family.index());
        selected.dedup();

        Ok(selected)
    }
}

impl ConfigSection for SearchConfig {
    fn section_name() -> &'static str {
        "search"
    }

    fn validate(&self) -> Result<()> {
        if self.n_iter == 0 {
            return Err(invalid(
                Self::section_name(),
                "n_iter must be at least 1".to_string(),
            ));
        }
        if self.cv_folds < 2 {
            return Err(invalid(
                Self::section_name(),
                format!("cv_folds must be at least 2, but was {}", self.cv_folds),
            ));
        }
        self.families().map(|_| ())
    }
}

/// Output locations and decision thresholds of the reporting stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub threshold: f64,
    /// Upper bound on the recall when choosing an operating threshold
    pub max_recall: f64,
    pub store_path: PathBuf,
    pub report_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            max_recall: 0.81,
            store_path: PathBuf::from("data/predicted/model_series.json"),
            report_dir: PathBuf::from("reports"),
        }
    }
}

impl ConfigSection for ReportConfig {
    fn section_name() -> &'static str {
        "report"
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in &[("threshold", self.threshold), ("max_recall", self.max_recall)] {
            if !(0.0..=1.0).contains(value) {
                return Err(invalid(
                    Self::section_name(),
                    format!("{} should be in [0, 1], but was {}", name, value),
                ));
            }
        }
        Ok(())
    }
}

/// Plausibility limits of the exploratory stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExploreConfig {
    /// Height in cm a patient has to exceed
    pub min_height: f64,
    /// Weight in kg a patient has to exceed
    pub min_weight: f64,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            min_height: 148.0,
            min_weight: 48.0,
        }
    }
}

impl ConfigSection for ExploreConfig {
    fn section_name() -> &'static str {
        "explore"
    }

    fn validate(&self) -> Result<()> {
        if !(self.min_height.is_finite() && self.min_weight.is_finite()) {
            return Err(invalid(
                Self::section_name(),
                "limits must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// All sections of a run configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub data: DataConfig,
    pub split: SplitConfig,
    pub search: SearchConfig,
    pub report: ReportConfig,
    pub explore: ExploreConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.data.validate()?;
        self.split.validate()?;
        self.search.validate()?;
        self.report.validate()?;
        self.explore.validate()?;
        Ok(())
    }

    /// Parse and validate a configuration
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|err| PipelineError::Config(err.to_string()))
    }
}
