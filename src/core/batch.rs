use crate::core::aggregator::aggregate;
use crate::core::orchestrator::Orchestrator;
use crate::domain::model::{ComparisonRecord, ProductQuery};
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// 對整份商品清單跑完整流程。
///
/// 最多同時處理 `concurrent_products` 筆商品；每筆商品的紀錄都是在該商品所有來源結束後才組成。
/// 回傳順序與輸入順序相同。
pub struct BatchDriver {
    orchestrator: Arc<Orchestrator>,
    concurrent_products: usize,
}

impl BatchDriver {
    pub fn new(orchestrator: Arc<Orchestrator>, concurrent_products: usize) -> Self {
        Self {
            orchestrator,
            concurrent_products: concurrent_products.max(1),
        }
    }

    pub async fn run(&self, products: Vec<ProductQuery>) -> Vec<ComparisonRecord> {
        let total = products.len();
        tracing::info!(
            "🚀 Comparing {} products across {} sources ({} at a time)",
            total,
            self.orchestrator.len(),
            self.concurrent_products
        );

        stream::iter(products.into_iter().enumerate())
            .map(|(index, product)| {
                let orchestrator = Arc::clone(&self.orchestrator);
                async move {
                    tracing::info!("🔍 [{}/{}] Checking '{}'", index + 1, total, product.name);
                    let outcomes = orchestrator.dispatch(&product).await;
                    aggregate(&product, &outcomes)
                }
            })
            .buffered(self.concurrent_products)
            .collect()
            .await
    }
}
