use crate::domain::model::ModelIdentifier;

/// 判斷來源給的候選商品是不是我們要找的型號。
///
/// 不分大小寫、忽略分隔字元後，任一方包含另一方即視為相符：
/// 來源可能回傳內含型號的較長 SKU，也可能只顯示較短的型號。
/// 這是啟發式判斷，允許少量誤判。
pub fn verify(identifier: &ModelIdentifier, candidate_label: &str) -> bool {
    let expected = normalize(identifier.as_str());
    let candidate = normalize(candidate_label);

    if expected == candidate {
        return true;
    }
    // 空字串包含於任何字串，不能當作命中
    if expected.is_empty() || candidate.is_empty() {
        return false;
    }

    candidate.contains(&expected) || expected.contains(&candidate)
}

fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !is_separator(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '_' | '.' | '/')
}
