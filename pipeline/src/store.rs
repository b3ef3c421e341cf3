//! Trained models and their evaluation, persisted as a single JSON document

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use cardio::features::FeatureSet;
use cardio::metrics::MetricsReport;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::FittedPipeline;
use crate::registry::ModelFamily;
use crate::search::{CandidateResult, Scoring};
use crate::search_space::ParamSet;

/// Outcome of the model selection of one family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedResult {
    pub family: ModelFamily,
    /// Preprocessing and classifier refitted on the whole training table
    pub pipeline: FittedPipeline,
    pub features: FeatureSet,
    pub best_params: ParamSet,
    /// Mean cross-validation score of `best_params`
    pub best_score: f64,
    pub scoring: Scoring,
    pub train_metrics: MetricsReport,
    pub test_metrics: MetricsReport,
    /// Every drawn configuration, in draw order
    pub history: Vec<CandidateResult>,
    pub trained_at: DateTime<Utc>,
}

/// Trained results keyed by family name
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultStore {
    results: BTreeMap<String, TrainedResult>,
}

impl ResultStore {
    pub fn new() -> Self {
        ResultStore::default()
    }

    /// Insert the result of a family, replacing an earlier one
    pub fn insert<I: Into<String>>(&mut self, name: I, result: TrainedResult) -> Option<TrainedResult> {
        self.results.insert(name.into(), result)
    }

    pub fn get(&self, name: &str) -> Option<&TrainedResult> {
        self.results.get(name)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results ordered by family name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TrainedResult)> {
        self.results.iter().map(|(name, result)| (name.as_str(), result))
    }

    /// Results in the order of [`ModelFamily::all`]
    pub fn by_family(&self) -> Vec<&TrainedResult> {
        let mut results = self.results.values().collect::<Vec<_>>();
        results.sort_by_key(|result| result.family.index());
        results
    }

    /// Write the store to `path`
    ///
    /// The document is written to a sibling temporary file first and then renamed over `path`,
    /// so a crash never leaves a truncated store behind.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp, path)?;

        info!("saved {} trained models to {}", self.len(), path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<ResultStore> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let store: ResultStore = serde_json::from_reader(reader)?;
        info!("loaded {} trained models from {}", store.len(), path.as_ref().display());
        Ok(store)
    }
}
