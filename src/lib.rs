pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod export;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::build_orchestrator;
pub use config::cli::LocalStorage;
pub use config::toml_config::PriceConfig;
pub use core::{
    aggregator::aggregate, batch::BatchDriver, engine::PriceEngine, identifier::extract,
    orchestrator::Orchestrator, verifier::verify,
};
pub use utils::error::{PriceError, Result, SourceError};
