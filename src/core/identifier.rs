//! 從商品描述抽出型號。
//!
//! 依序嘗試下列規則，第一個命中的規則勝出：
//!
//! 1. 最後一個連字號後面的代碼，例如 `... - 50A68N`（允許 `.`、`_`、`-` 分隔）
//! 2. 數字-字母-數字，例如 `4K55TV`
//! 3. 字母-數字，例如 `UN75DU7100FXZC`
//! 4. 都沒有命中時回傳整段描述
//!
//! 抽取永遠不會失敗；抽得不好只會讓搜尋字串變長。

use crate::domain::model::ModelIdentifier;
use regex::Regex;
use std::sync::LazyLock;

static RE_AFTER_HYPHEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-\s*([A-Z0-9]+(?:[._-][A-Z0-9]+)*)(?:\s|$)").unwrap()
});
static RE_DIGITS_LETTERS_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+[A-Z]+\d+[A-Z0-9]*)(?:\s|$)").unwrap());
static RE_LETTERS_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+\d+[A-Z0-9]*)(?:\s|$)").unwrap());

pub fn extract(description: &str) -> ModelIdentifier {
    let code = after_last_hyphen(description)
        .or_else(|| first_capture(&RE_DIGITS_LETTERS_DIGITS, description))
        .or_else(|| first_capture(&RE_LETTERS_DIGITS, description));

    match code {
        Some(code) => ModelIdentifier::new(code),
        None => ModelIdentifier::new(description),
    }
}

fn after_last_hyphen(description: &str) -> Option<&str> {
    RE_AFTER_HYPHEN
        .captures_iter(description)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn first_capture<'a>(re: &Regex, description: &'a str) -> Option<&'a str> {
    re.captures(description)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
