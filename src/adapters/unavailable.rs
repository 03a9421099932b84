use crate::domain::model::{Lookup, ModelIdentifier, ProductQuery};
use crate::domain::ports::SourceAdapter;
use crate::utils::error::SourceError;
use async_trait::async_trait;

/// 設定有誤、無法建立的來源。仍佔一個位置，讓每筆紀錄都有它的結果。
pub struct UnavailableSource {
    id: String,
    reason: String,
}

impl UnavailableSource {
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SourceAdapter for UnavailableSource {
    fn source_id(&self) -> &str {
        &self.id
    }

    async fn lookup(
        &self,
        _query: &ProductQuery,
        _identifier: &ModelIdentifier,
    ) -> Result<Lookup, SourceError> {
        Err(SourceError::Misconfigured(self.reason.clone()))
    }
}
