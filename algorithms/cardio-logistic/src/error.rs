use thiserror::Error;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    BaseCrate(#[from] cardio::error::Error),
    #[error("Expected exactly two classes for logistic regression, found {0}")]
    WrongNumberOfClasses(usize),
    #[error(transparent)]
    ArgMinError(#[from] argmin::core::Error),
    #[error("Expected `x` and `y` to have same number of rows, got {0} != {1}")]
    MismatchedShapes(usize, usize),
    #[error("Values must be finite and not `Inf`, `-Inf` or `NaN`")]
    InvalidValues,
    #[error("Regularization strength `alpha` must be finite and non-negative, got {0}")]
    InvalidAlpha(f64),
    #[error("gradient_tolerance must be a positive, finite number")]
    InvalidGradientTolerance,
    #[error("max_iterations must be at least one")]
    InvalidMaxIterations,
    #[error("Threshold must lie in [0, 1], got {0}")]
    InvalidThreshold(f64),
    #[error("the solver returned no parameters")]
    NoSolution,
}
