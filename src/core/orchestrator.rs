use crate::core::identifier;
use crate::domain::model::{Lookup, ModelIdentifier, ProductQuery, SourceOutcome, SourceOutcomes};
use crate::domain::ports::SourceAdapter;
use crate::utils::error::{PriceError, Result};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

struct RegisteredSource {
    adapter: Arc<dyn SourceAdapter>,
    timeout: Duration,
}

/// 對單一商品同時查詢所有來源，等全部結束（成功、失敗或逾時）才回傳。
///
/// 來源的註冊順序就是結果 map 的順序，也是最低價同價時的優先順序。
pub struct Orchestrator {
    sources: Vec<RegisteredSource>,
    default_timeout: Duration,
}

impl Orchestrator {
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            sources: Vec::new(),
            default_timeout,
        }
    }

    /// 註冊來源；`timeout` 為 `None` 時使用預設逾時。來源 ID 不可重複。
    pub fn register(
        &mut self,
        adapter: Arc<dyn SourceAdapter>,
        timeout: Option<Duration>,
    ) -> Result<()> {
        if self
            .sources
            .iter()
            .any(|s| s.adapter.source_id() == adapter.source_id())
        {
            return Err(PriceError::InvalidConfigValueError {
                field: "sources.id".to_string(),
                value: adapter.source_id().to_string(),
                reason: "Duplicate source id".to_string(),
            });
        }

        self.sources.push(RegisteredSource {
            adapter,
            timeout: timeout.unwrap_or(self.default_timeout),
        });
        Ok(())
    }

    pub fn source_ids(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.adapter.source_id())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub async fn dispatch(&self, query: &ProductQuery) -> SourceOutcomes {
        let identifier = Arc::new(identifier::extract(&query.name));
        let query = Arc::new(query.clone());

        tracing::debug!(
            "🔎 Dispatching '{}' (model {}) to {} sources",
            query.name,
            identifier,
            self.sources.len()
        );

        // JoinSet 被丟棄（呼叫端取消）時會 abort 所有還在跑的查詢
        let mut lookups = JoinSet::new();
        for (index, source) in self.sources.iter().enumerate() {
            let adapter = Arc::clone(&source.adapter);
            let query = Arc::clone(&query);
            let identifier = Arc::clone(&identifier);
            let timeout = source.timeout;

            lookups.spawn(async move {
                let outcome = lookup_with_timeout(adapter, &query, &identifier, timeout).await;
                (index, outcome)
            });
        }

        // join barrier：最快的來源不會提早結束其它查詢
        let mut settled: Vec<Option<SourceOutcome>> = self.sources.iter().map(|_| None).collect();
        while let Some(joined) = lookups.join_next().await {
            match joined {
                Ok((index, outcome)) => settled[index] = Some(outcome),
                Err(e) => tracing::warn!("⚠️ Lookup task for '{}' failed: {}", query.name, e),
            }
        }

        let mut outcomes = SourceOutcomes::with_capacity(settled.len());
        for (source, outcome) in self.sources.iter().zip(settled) {
            let outcome = outcome.unwrap_or_else(|| {
                SourceOutcome::adapter_error(source.adapter.source_id(), "adapter task was cancelled")
            });
            log_outcome(&query.name, &outcome);
            outcomes.insert(outcome.source_id().to_string(), outcome);
        }
        outcomes
    }
}

/// 單一來源的查詢：逾時會丟棄進行中的 lookup，panic 轉成 adapter 錯誤
async fn lookup_with_timeout(
    adapter: Arc<dyn SourceAdapter>,
    query: &ProductQuery,
    identifier: &ModelIdentifier,
    timeout: Duration,
) -> SourceOutcome {
    let source_id = adapter.source_id().to_string();
    let lookup = AssertUnwindSafe(adapter.lookup(query, identifier)).catch_unwind();

    match tokio::time::timeout(timeout, lookup).await {
        Ok(Ok(Ok(Lookup::Mismatch { expected, candidate }))) => {
            tracing::debug!(
                "{} [{}]: expected {} but found '{}'",
                source_id,
                query.name,
                expected,
                candidate
            );
            SourceOutcome::mismatch(source_id, candidate)
        }
        Ok(Ok(Ok(lookup))) => SourceOutcome::from_lookup(source_id, lookup),
        Ok(Ok(Err(e))) => SourceOutcome::adapter_error(source_id, e.to_string()),
        Ok(Err(payload)) => SourceOutcome::adapter_error(
            source_id,
            format!("adapter panicked: {}", panic_message(payload)),
        ),
        Err(_) => SourceOutcome::timed_out(source_id),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn log_outcome(product: &str, outcome: &SourceOutcome) {
    if let Some(price) = outcome.price() {
        tracing::info!("💲 {} [{}]: ${}", outcome.source_id(), product, price);
    } else if let Some(reason) = outcome.failure_reason() {
        tracing::warn!("⚠️ {} [{}]: {}", outcome.source_id(), product, reason);
    } else if outcome.mismatched_label().is_none() {
        tracing::debug!("{} [{}]: not found", outcome.source_id(), product);
    }
}
