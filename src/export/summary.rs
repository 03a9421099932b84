//! 每筆商品一個摘要物件，以商品名稱為 key：
//!
//! ```json
//! {
//!   "<name>": {
//!     "productInfo": {"name": "...", "price": "", "url": ""},
//!     "results": {"Amazon": {"found": true, "result": {"name": "...", "price": 358.0, "url": "...", "price_validity": ""}}},
//!     "best_price": {"retailer": "Amazon", "price": 358.0, "url": "..."}
//!   }
//! }
//! ```

use crate::domain::model::{ComparisonRecord, FailureReason, SourceOutcome};
use indexmap::IndexMap;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ProductSummary<'a> {
    #[serde(rename = "productInfo")]
    pub product_info: ProductInfo<'a>,
    pub results: IndexMap<&'a str, SourceSummary<'a>>,
    pub best_price: BestPrice<'a>,
}

#[derive(Debug, Serialize)]
pub struct ProductInfo<'a> {
    pub name: &'a str,
    pub price: &'a str,
    pub url: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SourceSummary<'a> {
    pub found: bool,
    pub result: OfferBody<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mismatched: Option<&'a str>,
}

/// 沒找到時序列化成 `{}`
#[derive(Debug, Default, Serialize)]
pub struct OfferBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_validity: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BestPrice<'a> {
    pub retailer: Option<&'a str>,
    pub price: Option<f64>,
    pub url: Option<&'a str>,
}

pub fn summarize(record: &ComparisonRecord) -> ProductSummary<'_> {
    let product = record.product_info();

    let results = record
        .per_source_results()
        .iter()
        .map(|(source_id, outcome)| (source_id.as_str(), summarize_outcome(outcome)))
        .collect();

    let best_price = match record.best_offer() {
        Some(best) => BestPrice {
            retailer: Some(best.source_id.as_str()),
            price: as_number(best.price),
            url: best.offer_url.as_deref(),
        },
        None => BestPrice {
            retailer: None,
            price: None,
            url: None,
        },
    };

    ProductSummary {
        product_info: ProductInfo {
            name: &product.name,
            price: product.price.as_deref().unwrap_or(""),
            url: product.url.as_deref().unwrap_or(""),
        },
        results,
        best_price,
    }
}

fn summarize_outcome(outcome: &SourceOutcome) -> SourceSummary<'_> {
    let result = if outcome.is_found() {
        OfferBody {
            name: outcome.label(),
            price: outcome.price().and_then(as_number),
            url: outcome.offer_url(),
            price_validity: Some(
                outcome
                    .price_valid_until()
                    .map(|date| date.to_string())
                    .unwrap_or_default(),
            ),
        }
    } else {
        OfferBody::default()
    };

    SourceSummary {
        found: outcome.is_found(),
        result,
        error: outcome.failure_reason().map(|reason| match reason {
            FailureReason::Timeout => "timeout".to_string(),
            FailureReason::AdapterError(cause) => cause.clone(),
        }),
        mismatched: outcome.mismatched_label(),
    }
}

fn as_number(price: Decimal) -> Option<f64> {
    price.to_f64()
}

/// 以商品名稱為 key；同名商品以後出現的為準
pub fn build_summary(records: &[ComparisonRecord]) -> IndexMap<&str, ProductSummary<'_>> {
    let mut summary = IndexMap::with_capacity(records.len());
    for record in records {
        summary.insert(record.product_info().name.as_str(), summarize(record));
    }
    summary
}

pub fn to_json(records: &[ComparisonRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&build_summary(records))
}
