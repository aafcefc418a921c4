pub mod dataset;
pub mod env;
