//! Error definitions for preprocessing
use thiserror::Error;
pub type Result<T> = std::result::Result<T, PreprocessingError>;

#[derive(Error, Debug)]
pub enum PreprocessingError {
    #[error("not enough samples")]
    NotEnoughSamples,
    #[error("no feature columns to transform")]
    NoFeatures,
    #[error("column `{0}` is listed twice")]
    DuplicateColumn(String),
    #[error("expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },
    #[error(transparent)]
    BaseCrateError(#[from] cardio::error::Error),
}
