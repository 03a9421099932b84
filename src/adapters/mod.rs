// Adapters layer: concrete source implementations behind the `SourceAdapter` port.

pub mod price;
pub mod search_page;
pub mod unavailable;

pub use search_page::SearchPageAdapter;
pub use unavailable::UnavailableSource;

use crate::config::toml_config::PriceConfig;
use crate::core::orchestrator::Orchestrator;
use crate::core::ConfigProvider;
use crate::domain::ports::SourceAdapter;
use crate::utils::error::Result;
use std::sync::Arc;

/// 依設定順序登記所有啟用的來源。建不起來的來源登記成 `UnavailableSource`。
pub fn build_orchestrator(config: &PriceConfig) -> Result<Orchestrator> {
    let mut orchestrator = Orchestrator::new(config.source_timeout());

    for source in config.enabled_sources() {
        let adapter: Arc<dyn SourceAdapter> =
            match SearchPageAdapter::from_config(source, config.run.user_agent.as_deref()) {
                Ok(adapter) => Arc::new(adapter),
                Err(e) => {
                    tracing::warn!("⚠️ Source '{}' is unavailable: {}", source.id, e);
                    Arc::new(UnavailableSource::new(&source.id, e.to_string()))
                }
            };
        orchestrator.register(adapter, source.timeout())?;
    }

    tracing::debug!(
        "Registered sources: {}",
        orchestrator.source_ids().collect::<Vec<_>>().join(", ")
    );
    Ok(orchestrator)
}
