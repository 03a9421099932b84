use crate::domain::model::{BestOffer, ComparisonRecord, ProductQuery, SourceOutcomes};

/// 把一筆商品的所有來源結果組成比價紀錄。
///
/// 最低價依 `outcomes` 的迭代順序掃描，同價時先出現的來源勝出；
/// orchestrator 產生的 map 順序就是來源設定順序。價格以精確小數比較，不做幣別換算。
pub fn aggregate(query: &ProductQuery, outcomes: &SourceOutcomes) -> ComparisonRecord {
    let mut best: Option<BestOffer> = None;

    for (source_id, outcome) in outcomes {
        let Some(price) = outcome.price().filter(|_| outcome.is_found()) else {
            continue;
        };

        let cheaper = best.as_ref().map_or(true, |current| price < current.price);
        if cheaper {
            best = Some(BestOffer {
                source_id: source_id.clone(),
                price,
                offer_url: outcome.offer_url().map(str::to_string),
            });
        }
    }

    ComparisonRecord::new(query.clone(), outcomes.clone(), best)
}
