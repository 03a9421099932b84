//! 零售頁面上的價格與特價截止日文字解析

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

static RE_PRICE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").unwrap());
static RE_ISO_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap());
static RE_WRITTEN_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z][a-z]+\.? \d{1,2},? \d{4}").unwrap());
static RE_SLASH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}/\d{1,2}/\d{4}").unwrap());

/// 取文字中第一個數字當價格，例如 `"Sale $1,299.99 Was $1,499.99"` → `1299.99`
pub fn parse_price(text: &str) -> Option<Decimal> {
    let raw = RE_PRICE.find(text)?.as_str().replace(',', "");
    Decimal::from_str(&raw).ok()
}

/// 解析特價截止日，接受 `2025-05-01`、`2025-05-01T23:59:59Z`、`May 1, 2025`、`05/01/2025`（月/日/年），
/// 前後可以有其它文字（例如 `"Sale ends May 1, 2025"`）。
pub fn parse_valid_until(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.date_naive());
    }
    if let Some(m) = RE_ISO_DATE.find(text) {
        if let Ok(date) = NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d") {
            return Some(date);
        }
    }
    if let Some(m) = RE_WRITTEN_DATE.find(text) {
        let written = m.as_str().replace('.', "").replace(',', "");
        for format in ["%B %d %Y", "%b %d %Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(&written, format) {
                return Some(date);
            }
        }
    }
    if let Some(m) = RE_SLASH_DATE.find(text) {
        if let Ok(date) = NaiveDate::parse_from_str(m.as_str(), "%m/%d/%Y") {
            return Some(date);
        }
    }

    None
}
