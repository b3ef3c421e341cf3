//! Error definitions for the boosted ensembles
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EnsembleError>;

#[derive(Error, Debug)]
pub enum EnsembleError {
    #[error("invalid hyperparameter: {0}")]
    InvalidParameter(String),
    #[error("expected {expected} classes, found {found}")]
    WrongNumberOfClasses { expected: &'static str, found: usize },
    #[error("boosting stopped: {0}")]
    NotConverged(String),
    #[error(transparent)]
    BaseCrate(#[from] cardio::error::Error),
}
