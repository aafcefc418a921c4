//! Machine learning pieces for training and inference.
//!
//! The forest is fitted in-process on every start; nothing here persists a model to disk.

pub mod forest;
pub mod metrics;
pub mod split;
pub mod trainer;
