use crate::core::ConfigProvider;
use crate::export::OutputFormat;
use crate::utils::error::{PriceError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static RE_ENV_VAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

const DEFAULT_SOURCE_TIMEOUT_SECONDS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceConfig {
    #[serde(default)]
    pub run: RunConfig,
    /// 順序即比價同價時的優先順序
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_run_name")]
    pub name: String,
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default = "default_output_formats")]
    pub output_formats: Vec<String>,
    pub concurrent_products: Option<usize>,
    pub source_timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            name: default_run_name(),
            output_path: default_output_path(),
            output_formats: default_output_formats(),
            concurrent_products: None,
            source_timeout_seconds: None,
            user_agent: None,
        }
    }
}

fn default_run_name() -> String {
    "price-comparison".to_string()
}

fn default_output_path() -> String {
    "./output".to_string()
}

fn default_output_formats() -> Vec<String> {
    vec!["json".to_string(), "csv".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_link_selectors() -> Vec<String> {
    vec!["a[href]".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    /// 含 `{query}` 佔位符的搜尋網址
    pub search_url: String,
    /// 相對連結的基底，預設取搜尋網址
    pub base_url: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
    pub selectors: SelectorConfig,
    pub detail: Option<DetailConfig>,
}

/// 搜尋結果頁的 CSS selector，每個欄位依序嘗試，第一個命中的為準
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    pub item: Vec<String>,
    pub title: Vec<String>,
    pub price: Vec<String>,
    #[serde(default = "default_link_selectors")]
    pub link: Vec<String>,
    #[serde(default)]
    pub no_results: Vec<String>,
}

/// 商品明細頁：型號、價格與特價截止日
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailConfig {
    #[serde(default)]
    pub model: Vec<String>,
    /// 從型號欄位文字擷取型號的正規表達式，取第一個 capture group
    pub model_pattern: Option<String>,
    /// 搜尋結果沒有價格時改讀明細頁
    #[serde(default)]
    pub price: Vec<String>,
    #[serde(default)]
    pub price_valid_until: Vec<String>,
}

impl SourceConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

impl PriceConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PriceError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| PriceError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_KEY})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        RE_ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|s| s.enabled)
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("run.output_path", &self.run.output_path)?;

        if let Some(concurrent) = self.run.concurrent_products {
            validation::validate_positive_number("run.concurrent_products", concurrent, 1)?;
        }
        if let Some(timeout) = self.run.source_timeout_seconds {
            validation::validate_positive_number("run.source_timeout_seconds", timeout, 1)?;
        }

        for format in &self.run.output_formats {
            validation::validate_one_of("run.output_formats", format, &OutputFormat::ALL)?;
        }

        if self.enabled_sources().next().is_none() {
            return Err(PriceError::MissingConfigError {
                field: "sources".to_string(),
            });
        }

        validation::validate_unique("sources.id", self.sources.iter().map(|s| s.id.as_str()))?;

        // 來源本身的網址/selector 錯誤不在這裡擋：那個來源會被登記為 unavailable，其它來源照跑
        for source in &self.sources {
            validation::validate_non_empty_string("sources.id", &source.id)?;
            if let Some(timeout) = source.timeout_seconds {
                validation::validate_positive_number(
                    &format!("sources.{}.timeout_seconds", source.id),
                    timeout,
                    1,
                )?;
            }
        }

        Ok(())
    }
}

impl ConfigProvider for PriceConfig {
    fn output_path(&self) -> &str {
        &self.run.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.run.output_formats
    }

    fn concurrent_products(&self) -> usize {
        self.run.concurrent_products.unwrap_or(1)
    }

    fn source_timeout(&self) -> Duration {
        Duration::from_secs(
            self.run
                .source_timeout_seconds
                .unwrap_or(DEFAULT_SOURCE_TIMEOUT_SECONDS),
        )
    }
}

impl Validate for PriceConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
