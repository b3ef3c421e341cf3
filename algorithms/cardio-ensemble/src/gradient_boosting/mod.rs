mod algorithm;
mod hyperparams;
mod tree;

pub use algorithm::GradientBoosting;
pub use hyperparams::{GradientBoostingParams, GradientBoostingValidParams};
pub use tree::{BoostNode, BoostedTree};
