use chrono::NaiveDate;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 來源（零售商）識別字串，例如 `Best_Buy`
pub type SourceId = String;

/// 一次批次中的一筆商品描述。`price`/`url` 只是商品清單上的附帶資訊，原樣帶到輸出。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ProductQuery {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: None,
            url: None,
        }
    }
}

/// 從商品描述抽出的型號。沒有規則命中時就是整段描述。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ModelIdentifier(String);

impl ModelIdentifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModelIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum FailureReason {
    Timeout,
    AdapterError(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Timeout => f.write_str("timed out"),
            FailureReason::AdapterError(cause) => write!(f, "adapter error: {}", cause),
        }
    }
}

/// 來源找到且通過型號比對的報價
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    /// 來源頁面上的商品名稱
    pub label: String,
    pub price: Decimal,
    pub url: Option<String>,
    /// 實際比對成功的型號（明細頁型號優先）
    pub verified_identifier: Option<String>,
    pub price_valid_until: Option<NaiveDate>,
}

/// Adapter 一次查詢的正常結果；例外狀況另外走 `SourceError`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Offer),
    NotFound,
    Mismatch { expected: String, candidate: String },
}

/// 單一 (商品, 來源) 的查詢結果。
///
/// `found == true` 時一定有非負的 `price`；`found == false` 時一定沒有。
/// 欄位只能透過建構函式產生，確保這個條件成立。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceOutcome {
    source_id: SourceId,
    found: bool,
    label: Option<String>,
    verified_identifier: Option<String>,
    price: Option<Decimal>,
    offer_url: Option<String>,
    price_valid_until: Option<NaiveDate>,
    failure_reason: Option<FailureReason>,
    mismatched_label: Option<String>,
}

impl SourceOutcome {
    fn empty(source_id: impl Into<SourceId>) -> Self {
        Self {
            source_id: source_id.into(),
            found: false,
            label: None,
            verified_identifier: None,
            price: None,
            offer_url: None,
            price_valid_until: None,
            failure_reason: None,
            mismatched_label: None,
        }
    }

    /// 負價格視為 adapter 錯誤
    pub fn found(source_id: impl Into<SourceId>, offer: Offer) -> Self {
        let source_id = source_id.into();
        if offer.price.is_sign_negative() && !offer.price.is_zero() {
            return Self::adapter_error(source_id, format!("negative price {}", offer.price));
        }

        Self {
            found: true,
            label: Some(offer.label),
            verified_identifier: offer.verified_identifier,
            price: Some(offer.price),
            offer_url: offer.url,
            price_valid_until: offer.price_valid_until,
            ..Self::empty(source_id)
        }
    }

    pub fn not_found(source_id: impl Into<SourceId>) -> Self {
        Self::empty(source_id)
    }

    pub fn mismatch(source_id: impl Into<SourceId>, candidate: impl Into<String>) -> Self {
        Self {
            mismatched_label: Some(candidate.into()),
            ..Self::empty(source_id)
        }
    }

    pub fn timed_out(source_id: impl Into<SourceId>) -> Self {
        Self {
            failure_reason: Some(FailureReason::Timeout),
            ..Self::empty(source_id)
        }
    }

    pub fn adapter_error(source_id: impl Into<SourceId>, cause: impl Into<String>) -> Self {
        Self {
            failure_reason: Some(FailureReason::AdapterError(cause.into())),
            ..Self::empty(source_id)
        }
    }

    pub fn from_lookup(source_id: impl Into<SourceId>, lookup: Lookup) -> Self {
        match lookup {
            Lookup::Found(offer) => Self::found(source_id, offer),
            Lookup::NotFound => Self::not_found(source_id),
            Lookup::Mismatch { candidate, .. } => Self::mismatch(source_id, candidate),
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn is_found(&self) -> bool {
        self.found
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn verified_identifier(&self) -> Option<&str> {
        self.verified_identifier.as_deref()
    }

    pub fn price(&self) -> Option<Decimal> {
        self.price
    }

    pub fn offer_url(&self) -> Option<&str> {
        self.offer_url.as_deref()
    }

    pub fn price_valid_until(&self) -> Option<NaiveDate> {
        self.price_valid_until
    }

    pub fn failure_reason(&self) -> Option<&FailureReason> {
        self.failure_reason.as_ref()
    }

    pub fn mismatched_label(&self) -> Option<&str> {
        self.mismatched_label.as_deref()
    }
}

/// 一筆商品所有來源的結果，順序即來源設定順序。
pub type SourceOutcomes = IndexMap<SourceId, SourceOutcome>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestOffer {
    pub source_id: SourceId,
    pub price: Decimal,
    pub offer_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonRecord {
    product_info: ProductQuery,
    per_source_results: SourceOutcomes,
    best_offer: Option<BestOffer>,
}

impl ComparisonRecord {
    pub(crate) fn new(
        product_info: ProductQuery,
        per_source_results: SourceOutcomes,
        best_offer: Option<BestOffer>,
    ) -> Self {
        Self {
            product_info,
            per_source_results,
            best_offer,
        }
    }

    pub fn product_info(&self) -> &ProductQuery {
        &self.product_info
    }

    pub fn per_source_results(&self) -> &SourceOutcomes {
        &self.per_source_results
    }

    pub fn best_offer(&self) -> Option<&BestOffer> {
        self.best_offer.as_ref()
    }

    pub fn found_count(&self) -> usize {
        self.per_source_results
            .values()
            .filter(|outcome| outcome.is_found())
            .count()
    }
}
