use crate::domain::model::ComparisonRecord;
use crate::utils::error::{PriceError, Result};
use serde::Serialize;

/// 攤平後的一列：一個找到的報價
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct OfferRow {
    pub product: String,
    pub retailer: String,
    pub price: String,
    pub url: String,
    pub best: bool,
}

pub fn offer_rows(records: &[ComparisonRecord]) -> Vec<OfferRow> {
    let mut rows = Vec::new();

    for record in records {
        let best_source = record.best_offer().map(|best| best.source_id.as_str());

        for (source_id, outcome) in record.per_source_results() {
            let Some(price) = outcome.price() else {
                continue;
            };
            rows.push(OfferRow {
                product: record.product_info().name.clone(),
                retailer: source_id.clone(),
                price: price.to_string(),
                url: outcome.offer_url().unwrap_or_default().to_string(),
                best: best_source == Some(source_id.as_str()),
            });
        }
    }

    rows
}

pub fn to_csv(records: &[ComparisonRecord]) -> Result<Vec<u8>> {
    // 表頭自己寫，沒有任何報價時也要有
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(["product", "retailer", "price", "url", "best"])?;
    for row in offer_rows(records) {
        writer.serialize(row)?;
    }
    writer.flush()?;

    writer
        .into_inner()
        .map_err(|e| PriceError::IoError(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregator::aggregate;
    use crate::domain::model::{Offer, ProductQuery, SourceOutcome, SourceOutcomes};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn found(source: &str, price: &str) -> (String, SourceOutcome) {
        (
            source.to_string(),
            SourceOutcome::found(
                source,
                Offer {
                    label: "TV".to_string(),
                    price: Decimal::from_str(price).unwrap(),
                    url: Some(format!("https://{}.example/tv", source)),
                    verified_identifier: None,
                    price_valid_until: None,
                },
            ),
        )
    }

    #[test]
    fn test_one_row_per_found_offer() {
        let outcomes: SourceOutcomes = [
            found("a", "899.99"),
            ("b".to_string(), SourceOutcome::not_found("b")),
            found("c", "849.00"),
        ]
        .into_iter()
        .collect();
        let records = vec![aggregate(&ProductQuery::new("TV - 50A68N"), &outcomes)];

        let rows = offer_rows(&records);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].retailer, "a");
        assert!(!rows[0].best);
        assert_eq!(rows[1].retailer, "c");
        assert_eq!(rows[1].price, "849.00");
        assert!(rows[1].best);
    }

    #[test]
    fn test_csv_output() {
        let outcomes: SourceOutcomes = [found("a", "10.50")].into_iter().collect();
        let records = vec![aggregate(&ProductQuery::new("Cable, HDMI"), &outcomes)];

        let csv = String::from_utf8(to_csv(&records).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("product,retailer,price,url,best"));
        assert_eq!(
            lines.next(),
            Some("\"Cable, HDMI\",a,10.50,https://a.example/tv,true")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_csv_header_without_offers() {
        let csv = String::from_utf8(to_csv(&[]).unwrap()).unwrap();
        assert_eq!(csv.trim_end(), "product,retailer,price,url,best");
    }
}
