mod algorithm;
mod hyperparams;

pub use algorithm::AdaBoost;
pub use hyperparams::{AdaBoostParams, AdaBoostValidParams};
