//! Turning raw symptom records into fixed-width numeric vectors.

pub mod columns;
pub mod encoder;
pub mod record;

pub use encoder::{FEATURE_SCHEMA_VERSION, FeatureEncoder, FeatureSchema};
pub use record::{RawRecord, RawValue, SymptomRecord};
