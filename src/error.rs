//! Error types in cardio

use thiserror::Error;

use ndarray::ShapeError;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid parameter {0}")]
    Parameters(String),
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
    #[error("Not enough samples: {0}")]
    NotEnoughSamples(String),
    #[error("column `{0}` not found")]
    MissingColumn(String),
    #[error("column `{name}` should be {expected}")]
    ColumnKind { name: String, expected: &'static str },
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("column `{0}` holds values other than 0 and 1")]
    NotBinary(String),
    #[error("metric undefined, targets contain a single class")]
    SingleClass,
    #[error("degenerate statistic: {0}")]
    DegenerateStatistic(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
