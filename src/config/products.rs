//! 讀取商品清單：JSON 陣列 `[{"name": ...}]`，或第一列為表頭、含 `name` 欄位的 CSV。

use crate::domain::model::ProductQuery;
use crate::utils::error::{PriceError, Result};
use crate::utils::validation;
use std::path::Path;

pub fn load_products<P: AsRef<Path>>(path: P) -> Result<Vec<ProductQuery>> {
    let path = path.as_ref();
    let display = path.display().to_string();
    validation::validate_file_extension("products", &display, &["json", "csv"])?;

    let data = std::fs::read(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("csv") => parse_products_csv(&data),
        _ => parse_products_json(&data),
    }
}

pub fn parse_products_json(data: &[u8]) -> Result<Vec<ProductQuery>> {
    let products: Vec<ProductQuery> =
        serde_json::from_slice(data).map_err(|e| PriceError::InputError {
            message: format!("invalid JSON product list: {}", e),
        })?;
    check_names(products)
}

pub fn parse_products_csv(data: &[u8]) -> Result<Vec<ProductQuery>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    if !reader.headers()?.iter().any(|h| h == "name") {
        return Err(PriceError::InputError {
            message: "CSV product list has no 'name' column".to_string(),
        });
    }

    let products = reader
        .deserialize::<CsvProduct>()
        .map(|row| row.map(ProductQuery::from))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    check_names(products)
}

#[derive(serde::Deserialize)]
struct CsvProduct {
    name: String,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl From<CsvProduct> for ProductQuery {
    fn from(row: CsvProduct) -> Self {
        // CSV 空欄位視為沒有
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());
        ProductQuery {
            name: row.name,
            price: non_empty(row.price),
            url: non_empty(row.url),
        }
    }
}

fn check_names(products: Vec<ProductQuery>) -> Result<Vec<ProductQuery>> {
    if let Some(index) = products.iter().position(|p| p.name.trim().is_empty()) {
        return Err(PriceError::InputError {
            message: format!("product #{} has an empty name", index + 1),
        });
    }
    Ok(products)
}
