use crate::core::batch::BatchDriver;
use crate::core::orchestrator::Orchestrator;
use crate::core::{ConfigProvider, Storage};
use crate::domain::model::{ComparisonRecord, ProductQuery};
use crate::export::Exporter;
use crate::utils::error::Result;
use std::sync::Arc;

#[derive(Debug)]
pub struct RunReport {
    pub records: Vec<ComparisonRecord>,
    /// 寫出的檔案路徑
    pub written: Vec<String>,
}

pub struct PriceEngine<S: Storage> {
    driver: BatchDriver,
    exporter: Exporter<S>,
}

impl<S: Storage> PriceEngine<S> {
    pub fn new(driver: BatchDriver, exporter: Exporter<S>) -> Self {
        Self { driver, exporter }
    }

    pub fn from_config<C: ConfigProvider>(
        orchestrator: Orchestrator,
        storage: S,
        config: &C,
    ) -> Result<Self> {
        let driver = BatchDriver::new(Arc::new(orchestrator), config.concurrent_products());
        let exporter = Exporter::from_names(storage, config.output_formats())?;
        Ok(Self::new(driver, exporter))
    }

    pub async fn run(&self, products: Vec<ProductQuery>) -> Result<RunReport> {
        let records = self.driver.run(products).await;
        log_summary(&records);

        let written = self.exporter.export(&records).await?;
        for path in &written {
            tracing::info!("📁 Output saved to: {}", path);
        }

        Ok(RunReport { records, written })
    }
}

fn log_summary(records: &[ComparisonRecord]) {
    tracing::info!("================ Final Summary ================");
    for record in records {
        tracing::info!(
            "{}: found at {}/{} sources",
            record.product_info().name,
            record.found_count(),
            record.per_source_results().len()
        );
        for (source_id, outcome) in record.per_source_results() {
            match (outcome.price(), outcome.failure_reason()) {
                (Some(price), _) => tracing::info!(
                    "  - {}: ${} ({})",
                    source_id,
                    price,
                    outcome.offer_url().unwrap_or("-")
                ),
                (None, Some(reason)) => tracing::info!("  - {}: Not Found ({})", source_id, reason),
                (None, None) => tracing::info!("  - {}: Not Found", source_id),
            }
        }
        match record.best_offer() {
            Some(best) => tracing::info!("Best Price: ${} at {}", best.price, best.source_id),
            None => tracing::info!("No available price found"),
        }
    }
}
