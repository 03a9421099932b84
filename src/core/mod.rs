pub mod aggregator;
pub mod batch;
pub mod engine;
pub mod identifier;
pub mod orchestrator;
pub mod verifier;

pub use crate::domain::model::{ComparisonRecord, ProductQuery, SourceOutcome, SourceOutcomes};
pub use crate::domain::ports::{ConfigProvider, SourceAdapter, Storage};
pub use crate::utils::error::Result;
