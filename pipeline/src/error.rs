//! Error definitions of the pipeline stages
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid value for hyperparameter `{name}`: {reason}")]
    InvalidParam { name: String, reason: String },
    #[error("every candidate configuration of `{0}` failed during cross-validation")]
    DegenerateSearch(String),
    #[error("unknown model family `{0}`")]
    UnknownFamily(String),
    #[error(transparent)]
    BaseCrate(#[from] cardio::error::Error),
    #[error(transparent)]
    Preprocessing(#[from] cardio_preprocessing::PreprocessingError),
    #[error(transparent)]
    Logistic(#[from] cardio_logistic::error::Error),
    #[error(transparent)]
    Ensemble(#[from] cardio_ensemble::EnsembleError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
