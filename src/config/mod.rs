pub mod cli;
pub mod products;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "price-compare")]
#[command(about = "Compare retailer prices for a list of products")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "price-compare.toml")]
    pub config: String,

    /// Product list (.json array or .csv with a 'name' column)
    #[arg(short, long)]
    pub products: String,

    #[arg(long)]
    pub output_path: Option<String>,

    #[arg(long)]
    pub concurrent_products: Option<usize>,

    /// Per-source timeout in seconds
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    /// Show the sources and products without querying anything
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 命令列參數覆蓋設定檔
    pub fn apply_overrides(&self, config: &mut toml_config::PriceConfig) {
        if let Some(output_path) = &self.output_path {
            config.run.output_path = output_path.clone();
            tracing::info!("🔧 Output path overridden to: {}", output_path);
        }
        if let Some(concurrent) = self.concurrent_products {
            config.run.concurrent_products = Some(concurrent);
            tracing::info!("🔧 Concurrent products overridden to: {}", concurrent);
        }
        if let Some(timeout) = self.timeout_seconds {
            config.run.source_timeout_seconds = Some(timeout);
            tracing::info!("🔧 Source timeout overridden to: {}s", timeout);
        }
    }
}
