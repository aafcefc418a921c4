//! Labeled dataset loading and the per-label metadata kept alongside it.

pub mod loader;
pub mod treatment;

pub use loader::{DatasetTable, RowView, TrainingRow, load_dataset};
pub use treatment::{TreatmentInfo, TreatmentPlan};
