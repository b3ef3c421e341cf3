//! `cardio-datasets` provides the closed category enumerations of the processed patient table
//! and a generator for synthetic patient cohorts, used in tests and demonstrations.
//!
//! ## Current State
//!
//! * [`codes`] maps raw survey codes to category names, unknown codes become [`codes::CHECK`]
//! * [`generate`] draws a seeded cohort with a fixed share of positive outcomes
//!
//! ## Using a cohort
//!
//! ```ignore
//! use rand::{rngs::SmallRng, SeedableRng};
//!
//! let mut rng = SmallRng::seed_from_u64(42);
//! let table = cardio_datasets::generate::cohort(1000, 0.3, &mut rng)?;
//! ```

pub mod codes;
pub mod generate;

pub use generate::{cohort, COLUMNS, ID_COLUMN, TARGET};
