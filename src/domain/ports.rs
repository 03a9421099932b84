use crate::domain::model::{Lookup, ModelIdentifier, ProductQuery};
use crate::utils::error::{Result, SourceError};
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// 給使用者看的完整路徑
    fn describe(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn concurrent_products(&self) -> usize;
    fn source_timeout(&self) -> Duration;
}

/// 一個零售來源。實作之間不可共享可變狀態，orchestrator 會同時呼叫它們。
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source_id(&self) -> &str;

    async fn lookup(
        &self,
        query: &ProductQuery,
        identifier: &ModelIdentifier,
    ) -> std::result::Result<Lookup, SourceError>;
}
