//! 以 HTTP 取得搜尋結果頁，再用 CSS selector 取出第一個候選商品的通用來源。
//!
//! 流程：
//! - 用型號組出搜尋網址並抓取頁面
//! - 命中 `no_results` selector 或沒有任何商品 → 找不到
//! - 第一個商品：標題、價格、連結
//! - 有設定明細頁時，抓明細頁上的型號、價格與特價截止日（搜尋結果沒價格時用明細頁價格）
//! - 以明細頁型號（沒有時用標題）比對型號
//!
//! 不執行 JavaScript，也不處理反爬蟲機制。

use crate::adapters::price::{parse_price, parse_valid_until};
use crate::config::toml_config::{DetailConfig, SourceConfig};
use crate::core::verifier::verify;
use crate::domain::model::{Lookup, ModelIdentifier, Offer, ProductQuery};
use crate::domain::ports::SourceAdapter;
use crate::utils::error::{PriceError, Result, SourceError};
use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";

static LINK_WITH_TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[title]").unwrap());

struct SearchSelectors {
    item: Vec<Selector>,
    title: Vec<Selector>,
    price: Vec<Selector>,
    link: Vec<Selector>,
    no_results: Vec<Selector>,
}

struct DetailSelectors {
    model: Vec<Selector>,
    model_pattern: Option<Regex>,
    price: Vec<Selector>,
    price_valid_until: Vec<Selector>,
}

#[derive(Debug, PartialEq)]
enum SearchPage {
    NoResults,
    Candidate(Candidate),
}

#[derive(Debug, PartialEq)]
struct Candidate {
    title: String,
    price: Option<Decimal>,
    url: Option<String>,
}

#[derive(Debug, Default, PartialEq)]
struct DetailPage {
    model: Option<String>,
    price: Option<Decimal>,
    price_valid_until: Option<NaiveDate>,
}

pub struct SearchPageAdapter {
    id: String,
    search_url: String,
    base_url: Url,
    client: Client,
    selectors: SearchSelectors,
    detail: Option<DetailSelectors>,
}

impl SearchPageAdapter {
    pub fn from_config(config: &SourceConfig, user_agent: Option<&str>) -> Result<Self> {
        let field = |name: &str| format!("sources.{}.{}", config.id, name);

        crate::utils::validation::validate_search_template(&field("search_url"), &config.search_url)?;
        let base_url = match &config.base_url {
            Some(base) => base.clone(),
            None => config.search_url.replace("{query}", ""),
        };
        let base_url = Url::parse(&base_url).map_err(|e| PriceError::InvalidConfigValueError {
            field: field("base_url"),
            value: base_url.clone(),
            reason: e.to_string(),
        })?;

        let selectors = SearchSelectors {
            item: compile_required(&field("selectors.item"), &config.selectors.item)?,
            title: compile_required(&field("selectors.title"), &config.selectors.title)?,
            price: compile_required(&field("selectors.price"), &config.selectors.price)?,
            link: compile(&field("selectors.link"), &config.selectors.link)?,
            no_results: compile(&field("selectors.no_results"), &config.selectors.no_results)?,
        };

        let detail = config
            .detail
            .as_ref()
            .map(|detail| compile_detail(&field("detail"), detail))
            .transpose()?;

        let client = Client::builder()
            .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
            .default_headers(build_headers(&field("headers"), config)?)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            id: config.id.clone(),
            search_url: config.search_url.clone(),
            base_url,
            client,
            selectors,
            detail,
        })
    }

    fn search_url_for(&self, identifier: &ModelIdentifier) -> String {
        let query: String = url::form_urlencoded::byte_serialize(identifier.as_str().as_bytes()).collect();
        self.search_url.replace("{query}", &query)
    }

    async fn fetch(&self, url: &str) -> std::result::Result<String, SourceError> {
        tracing::debug!("{}: GET {}", self.id, url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }

    fn parse_search_page(&self, html: &str) -> std::result::Result<SearchPage, SourceError> {
        let document = Html::parse_document(html);

        if self
            .selectors
            .no_results
            .iter()
            .any(|selector| document.select(selector).next().is_some())
        {
            return Ok(SearchPage::NoResults);
        }

        // 只看第一個商品
        let Some(item) = self
            .selectors
            .item
            .iter()
            .find_map(|selector| document.select(selector).next())
        else {
            return Ok(SearchPage::NoResults);
        };

        let title = first_text(item, &self.selectors.title)
            .or_else(|| {
                item.select(&LINK_WITH_TITLE)
                    .next()
                    .and_then(|link| link.value().attr("title"))
                    .map(clean_text)
            })
            .filter(|title| !title.is_empty())
            .ok_or_else(|| SourceError::Parse("first search result has no title".to_string()))?;

        let price = self
            .selectors
            .price
            .iter()
            .filter_map(|selector| item.select(selector).next())
            .find_map(|element| parse_price(&element_text(element)));

        let url = self
            .selectors
            .link
            .iter()
            .filter_map(|selector| item.select(selector).next())
            .find_map(|link| link.value().attr("href"))
            .and_then(|href| self.base_url.join(href).ok())
            .map(String::from);

        Ok(SearchPage::Candidate(Candidate { title, price, url }))
    }

    async fn read_detail_page(&self, detail: &DetailSelectors, url: &str) -> DetailPage {
        match self.fetch(url).await {
            Ok(html) => parse_detail_page(detail, &html),
            Err(e) => {
                // 明細頁失敗時退回用標題比對
                tracing::warn!("{}: detail page unavailable ({}), using search result only", self.id, e);
                DetailPage::default()
            }
        }
    }
}

#[async_trait]
impl SourceAdapter for SearchPageAdapter {
    fn source_id(&self) -> &str {
        &self.id
    }

    async fn lookup(
        &self,
        query: &ProductQuery,
        identifier: &ModelIdentifier,
    ) -> std::result::Result<Lookup, SourceError> {
        let search_url = self.search_url_for(identifier);
        tracing::debug!("{}: searching '{}' as {}", self.id, query.name, identifier);

        let html = self.fetch(&search_url).await?;
        let candidate = match self.parse_search_page(&html)? {
            SearchPage::NoResults => return Ok(Lookup::NotFound),
            SearchPage::Candidate(candidate) => candidate,
        };

        let detail_price_configured = self
            .detail
            .as_ref()
            .is_some_and(|detail| !detail.price.is_empty());
        if candidate.price.is_none() && !detail_price_configured {
            tracing::debug!("{}: no price on '{}'", self.id, candidate.title);
            return Ok(Lookup::NotFound);
        }

        let detail = match (&self.detail, &candidate.url) {
            (Some(detail), Some(url)) => self.read_detail_page(detail, url).await,
            _ => DetailPage::default(),
        };

        let Some(price) = candidate.price.or(detail.price) else {
            tracing::debug!("{}: no price on '{}' or its detail page", self.id, candidate.title);
            return Ok(Lookup::NotFound);
        };

        // 明細頁上的型號比搜尋結果標題可靠
        let checked = detail.model.unwrap_or_else(|| candidate.title.clone());
        if !verify(identifier, &checked) {
            return Ok(Lookup::Mismatch {
                expected: identifier.to_string(),
                candidate: checked,
            });
        }

        // 記錄來源實際顯示的代碼，不是搜尋用的型號
        Ok(Lookup::Found(Offer {
            verified_identifier: Some(checked),
            label: candidate.title,
            price,
            url: candidate.url,
            price_valid_until: detail.price_valid_until,
        }))
    }
}

fn parse_detail_page(detail: &DetailSelectors, html: &str) -> DetailPage {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let model = first_text(root, &detail.model).and_then(|text| match &detail.model_pattern {
        Some(pattern) => pattern
            .captures(&text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string()),
        None => Some(text),
    });

    let price = detail
        .price
        .iter()
        .filter_map(|selector| root.select(selector).next())
        .find_map(|element| {
            element
                .value()
                .attr("content")
                .and_then(parse_price)
                .or_else(|| parse_price(&element_text(element)))
        });

    // <time datetime="..."> 優先，其次是顯示文字
    let price_valid_until = detail
        .price_valid_until
        .iter()
        .filter_map(|selector| root.select(selector).next())
        .find_map(|element| {
            element
                .value()
                .attr("datetime")
                .and_then(parse_valid_until)
                .or_else(|| parse_valid_until(&element_text(element)))
        });

    DetailPage {
        model,
        price,
        price_valid_until,
    }
}

fn first_text(scope: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors
        .iter()
        .find_map(|selector| scope.select(selector).next())
        .map(element_text)
        .filter(|text| !text.is_empty())
}

fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn compile(field: &str, selectors: &[String]) -> Result<Vec<Selector>> {
    selectors
        .iter()
        .map(|raw| {
            Selector::parse(raw).map_err(|e| PriceError::InvalidConfigValueError {
                field: field.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

fn compile_required(field: &str, selectors: &[String]) -> Result<Vec<Selector>> {
    if selectors.is_empty() {
        return Err(PriceError::MissingConfigError {
            field: field.to_string(),
        });
    }
    compile(field, selectors)
}

fn compile_detail(field: &str, detail: &DetailConfig) -> Result<DetailSelectors> {
    let model_pattern = detail
        .model_pattern
        .as_deref()
        .map(|raw| {
            let pattern = Regex::new(raw).map_err(|e| PriceError::InvalidConfigValueError {
                field: format!("{}.model_pattern", field),
                value: raw.to_string(),
                reason: e.to_string(),
            })?;
            if pattern.captures_len() < 2 {
                return Err(PriceError::InvalidConfigValueError {
                    field: format!("{}.model_pattern", field),
                    value: raw.to_string(),
                    reason: "Pattern needs a capture group for the model code".to_string(),
                });
            }
            Ok(pattern)
        })
        .transpose()?;

    Ok(DetailSelectors {
        model: compile(&format!("{}.model", field), &detail.model)?,
        model_pattern,
        price: compile(&format!("{}.price", field), &detail.price)?,
        price_valid_until: compile(
            &format!("{}.price_valid_until", field),
            &detail.price_valid_until,
        )?,
    })
}

fn build_headers(field: &str, config: &SourceConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (key, value) in config.headers.iter().flatten() {
        let invalid = |reason: String| PriceError::InvalidConfigValueError {
            field: field.to_string(),
            value: key.clone(),
            reason,
        };
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::PriceConfig;
    use std::str::FromStr;

    fn adapter(extra: &str) -> SearchPageAdapter {
        let toml = format!(
            r#"
[[sources]]
id = "Shop"
search_url = "https://shop.example/search?q={{query}}"

[sources.selectors]
item = [".result"]
title = [".name"]
price = [".sale-price", ".price"]
no_results = [".empty"]
{}
"#,
            extra
        );
        let config = PriceConfig::from_toml_str(&toml).unwrap();
        SearchPageAdapter::from_config(&config.sources[0], None).unwrap()
    }

    #[test]
    fn test_search_url_is_encoded() {
        let adapter = adapter("");
        assert_eq!(
            adapter.search_url_for(&ModelIdentifier::new("OLED 65/C3")),
            "https://shop.example/search?q=OLED+65%2FC3"
        );
    }

    #[test]
    fn test_first_candidate_is_used() {
        let html = r#"
            <ul>
              <li class="result"><a href="/p/50a68n"><span class="name">Hisense  50"
                 4K 50A68N</span></a><span class="price">$1,299.99</span></li>
              <li class="result"><span class="name">Other</span><span class="price">$1.00</span></li>
            </ul>"#;

        let page = adapter("").parse_search_page(html).unwrap();
        assert_eq!(
            page,
            SearchPage::Candidate(Candidate {
                title: "Hisense 50\" 4K 50A68N".to_string(),
                price: Some(Decimal::from_str("1299.99").unwrap()),
                url: Some("https://shop.example/p/50a68n".to_string()),
            })
        );
    }

    #[test]
    fn test_price_selectors_are_tried_in_order() {
        let html = r#"<div class="result"><span class="name">TV</span>
            <span class="sale-price">n/a</span><span class="price">$10.00</span></div>"#;

        match adapter("").parse_search_page(html).unwrap() {
            SearchPage::Candidate(candidate) => {
                assert_eq!(candidate.price, Some(Decimal::from_str("10.00").unwrap()));
                assert_eq!(candidate.url, None);
            }
            other => panic!("unexpected page: {:?}", other),
        }
    }

    #[test]
    fn test_no_results_marker() {
        let html = r#"<div class="empty">Nothing</div><div class="result"><span class="name">Ad</span></div>"#;
        assert_eq!(adapter("").parse_search_page(html).unwrap(), SearchPage::NoResults);
        assert_eq!(adapter("").parse_search_page("<p>hi</p>").unwrap(), SearchPage::NoResults);
    }

    #[test]
    fn test_title_falls_back_to_link_title() {
        let html = r#"<div class="result"><a title="Hisense 50A68N" href="https://cdn.example/x">img</a></div>"#;
        match adapter("").parse_search_page(html).unwrap() {
            SearchPage::Candidate(candidate) => {
                assert_eq!(candidate.title, "Hisense 50A68N");
                assert_eq!(candidate.url.as_deref(), Some("https://cdn.example/x"));
            }
            other => panic!("unexpected page: {:?}", other),
        }
    }

    #[test]
    fn test_missing_title_is_a_parse_error() {
        let html = r#"<div class="result"><span class="price">$1.00</span></div>"#;
        assert!(matches!(
            adapter("").parse_search_page(html),
            Err(SourceError::Parse(_))
        ));
    }

    #[test]
    fn test_detail_page() {
        let adapter = adapter(
            r#"
[sources.detail]
model = [".model"]
model_pattern = 'Model:\s*(\S+)'
price = ["span[itemprop=\"price\"]"]
price_valid_until = ["time.sale-end"]
"#,
        );
        let html = r#"<div class="model">Model: 50A68N-CA</div>
            <span itemprop="price" content="429.99">$429,99</span>
            <time class="sale-end" datetime="2025-05-01">May 1</time>"#;

        let detail = parse_detail_page(adapter.detail.as_ref().unwrap(), html);
        assert_eq!(detail.model.as_deref(), Some("50A68N-CA"));
        assert_eq!(detail.price, Some(Decimal::from_str("429.99").unwrap()));
        assert_eq!(detail.price_valid_until, NaiveDate::from_ymd_opt(2025, 5, 1));

        let empty = parse_detail_page(adapter.detail.as_ref().unwrap(), "<p></p>");
        assert_eq!(empty, DetailPage::default());
    }

    #[test]
    fn test_invalid_configuration() {
        let mut config = PriceConfig::from_toml_str(
            r#"
[[sources]]
id = "Shop"
search_url = "https://shop.example/search?q={query}"

[sources.selectors]
item = ["div[["]
title = [".name"]
price = [".price"]
"#,
        )
        .unwrap();
        assert!(SearchPageAdapter::from_config(&config.sources[0], None).is_err());

        config.sources[0].selectors.item = vec![];
        assert!(matches!(
            SearchPageAdapter::from_config(&config.sources[0], None),
            Err(PriceError::MissingConfigError { .. })
        ));

        config.sources[0].selectors.item = vec![".item".to_string()];
        config.sources[0].search_url = "https://shop.example/search".to_string();
        assert!(SearchPageAdapter::from_config(&config.sources[0], None).is_err());
    }

    #[test]
    fn test_model_pattern_needs_capture_group() {
        let detail = DetailConfig {
            model: vec![".model".to_string()],
            model_pattern: Some(r"Model:\s*\S+".to_string()),
            price: vec![],
            price_valid_until: vec![],
        };
        assert!(compile_detail("sources.Shop.detail", &detail).is_err());
    }
}
