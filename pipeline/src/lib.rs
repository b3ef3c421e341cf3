//!
//! # Model selection for the cardiovascular-disease classifiers
//! `cardio-pipeline` ties the `cardio` crates together into the stages of the analysis:
//!
//! * [explore] cleans the processed patient table and writes descriptive reports,
//! * [search] draws hyperparameter configurations of every [model family](registry::ModelFamily),
//!   cross-validates them and refits the best one,
//! * [store] persists the trained models with their metrics as one JSON document,
//! * [report] compares the stored models, scores patients and picks an operating threshold.
//!
//! Every stage is configured by a [`PipelineConfig`](config::PipelineConfig) read from TOML. The
//! `cardio` binary runs the stages from the command line.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cardio::table::Table;
//! use cardio_pipeline::config::PipelineConfig;
//! use cardio_pipeline::search::train_families;
//!
//! let config = PipelineConfig::from_file("cardio.toml").unwrap();
//! let table = Table::read_csv(&config.data.processed_path).unwrap();
//! let store = train_families(&config, &table).unwrap();
//! store.save(&config.report.store_path).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod explore;
pub mod model;
pub mod registry;
pub mod report;
pub mod search;
pub mod search_space;
pub mod store;

pub use error::{PipelineError, Result};
