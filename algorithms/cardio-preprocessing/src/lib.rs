//! # Preprocessing
//! ## The Big Picture
//!
//! `cardio-preprocessing` turns a patient [`Table`](cardio::table::Table) into the numeric
//! matrix consumed by the classifiers.
//!
//! ## Current state
//! `cardio-preprocessing` provides the following preprocessing algorithms:
//! * Standard scaling of numeric columns
//! * One-hot encoding of categorical columns with an optional reference level
//! * A column transformer combining both, fitted on training data only

pub mod column_transformer;
pub mod error;
pub mod linear_scaling;
pub mod one_hot;

pub use column_transformer::{ColumnTransformer, FittedColumnTransformer};
pub use error::{PreprocessingError, Result};
pub use linear_scaling::{FittedLinearScaler, LinearScaler};
pub use one_hot::{DropPolicy, FittedOneHotEncoder, OneHotEncoder};
