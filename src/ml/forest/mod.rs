//! Random-forest classifier.
//!
//! Bootstrap-aggregated CART trees with Gini splits, optional balanced class weighting,
//! bounded depth, and minimum split/leaf sizes. Trees are fitted in parallel, each with its
//! own seeded RNG, so a fixed seed reproduces the same forest on any thread count.

mod model;
mod train;

pub use model::{DecisionTree, Node, RandomForestModel};
pub use train::{ForestOptions, TrainDataset, balanced_class_weights, train_forest};
