use httpmock::prelude::*;
use price_compare::config::products::parse_products_json;
use price_compare::export::{ARCHIVE_FILE, OFFERS_FILE, SUMMARY_FILE};
use price_compare::{build_orchestrator, LocalStorage, PriceConfig, PriceEngine};
use tempfile::TempDir;

fn source_block(id: &str, search_url: &str) -> String {
    format!(
        r#"
[[sources]]
id = "{}"
search_url = "{}"

[sources.selectors]
item = [".product"]
title = [".product-title"]
price = [".product-price"]
no_results = [".no-results"]
"#,
        id, search_url
    )
}

fn product_page(title: &str, price: &str, href: &str) -> String {
    format!(
        r#"<div class="product"><a href="{}"><span class="product-title">{}</span></a>
           <span class="product-price">{}</span></div>"#,
        href, title, price
    )
}

#[tokio::test]
async fn test_end_to_end_comparison() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start_async().await;

    // Amazon: 50A68N 899.99，55U8N 找不到
    server
        .mock_async(|when, then| {
            when.method(GET).path("/amazon/s").query_param("k", "50A68N");
            then.status(200)
                .body(product_page("Hisense 50A68N", "$899.99", "/dp/B0CW2JZ4L9"));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/amazon/s").query_param("k", "55U8N");
            then.status(200).body(r#"<div class="no-results">none</div>"#);
        })
        .await;
    // Costco: 一律 500
    server
        .mock_async(|when, then| {
            when.method(GET).path("/costco/search");
            then.status(500);
        })
        .await;
    // Visions: 50A68N 849.00，55U8N 回傳其它型號
    server
        .mock_async(|when, then| {
            when.method(GET).path("/visions/q").query_param("text", "50A68N");
            then.status(200)
                .body(product_page("Hisense 50\" 50A68N", "$849.00", "/p/50a68n"));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/visions/q").query_param("text", "55U8N");
            then.status(200)
                .body(product_page("Hisense 65U8N", "$1,499.99", "/p/65u8n"));
        })
        .await;

    let config_toml = format!(
        r#"
[run]
name = "e2e"
output_path = "{}"
output_formats = ["json", "csv", "zip"]
concurrent_products = 2
source_timeout_seconds = 10
{}{}{}{}"#,
        output_path.replace('\\', "\\\\"),
        source_block("Amazon", &server.url("/amazon/s?k={query}")),
        source_block("Costco", &server.url("/costco/search?keyword={query}")),
        source_block("Visions", &server.url("/visions/q?text={query}")),
        // 設定錯誤的來源仍會出現在結果中
        r#"
[[sources]]
id = "Broken"
search_url = "not a url {query}"

[sources.selectors]
item = [".product"]
title = [".product-title"]
price = [".product-price"]
"#
    );

    let config = PriceConfig::from_toml_str(&config_toml).unwrap();
    let orchestrator = build_orchestrator(&config).unwrap();
    let storage = LocalStorage::new(output_path.clone());
    let engine = PriceEngine::from_config(orchestrator, storage, &config).unwrap();

    let products = parse_products_json(
        br#"[
            {"name": "Hisense 50\" 4K Google TV - 50A68N", "price": "$379.00"},
            {"name": "Hisense 55\" Mini-LED - 55U8N"}
        ]"#,
    )
    .unwrap();

    let report = engine.run(products).await.unwrap();
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.written.len(), 3);

    let first = &report.records[0];
    assert_eq!(first.per_source_results().len(), 4);
    let best = first.best_offer().unwrap();
    assert_eq!(best.source_id, "Visions");
    assert_eq!(best.offer_url.as_deref(), Some(server.url("/p/50a68n").as_str()));

    let second = &report.records[1];
    assert_eq!(second.per_source_results().len(), 4);
    assert!(second.best_offer().is_none());
    assert_eq!(
        second.per_source_results()["Visions"].mismatched_label(),
        Some("Hisense 65U8N")
    );
    assert!(second.per_source_results()["Costco"].failure_reason().is_some());
    assert!(second.per_source_results()["Broken"].failure_reason().is_some());

    // JSON 摘要
    let summary = std::fs::read_to_string(temp_dir.path().join(SUMMARY_FILE)).unwrap();
    let summary: serde_json::Value = serde_json::from_str(&summary).unwrap();
    let tv = &summary["Hisense 50\" 4K Google TV - 50A68N"];
    assert_eq!(tv["productInfo"]["price"], "$379.00");
    assert_eq!(tv["best_price"]["retailer"], "Visions");
    assert!((tv["best_price"]["price"].as_f64().unwrap() - 849.0).abs() < 1e-6);
    assert!((tv["results"]["Amazon"]["result"]["price"].as_f64().unwrap() - 899.99).abs() < 1e-6);
    assert_eq!(tv["results"]["Costco"]["found"], false);
    assert!(summary["Hisense 55\" Mini-LED - 55U8N"]["best_price"]["retailer"].is_null());

    // CSV 報價表
    let csv = std::fs::read_to_string(temp_dir.path().join(OFFERS_FILE)).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "product,retailer,price,url,best");
    assert!(lines[1].contains(",Amazon,899.99,"));
    assert!(lines[1].ends_with(",false"));
    assert!(lines[2].contains(",Visions,849.00,"));
    assert!(lines[2].ends_with(",true"));

    assert!(temp_dir.path().join(ARCHIVE_FILE).exists());
}
