use thiserror::Error;

#[derive(Error, Debug)]
pub enum PriceError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid product input: {message}")]
    InputError { message: String },
}

impl PriceError {
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            PriceError::ConfigError { .. }
                | PriceError::InvalidConfigValueError { .. }
                | PriceError::MissingConfigError { .. }
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PriceError::ConfigError { message } => format!("設定錯誤: {}", message),
            PriceError::InvalidConfigValueError { field, reason, .. } => {
                format!("設定值 '{}' 無效: {}", field, reason)
            }
            PriceError::MissingConfigError { field } => format!("缺少必要設定: {}", field),
            PriceError::InputError { message } => format!("商品清單無法讀取: {}", message),
            PriceError::IoError(e) => format!("檔案存取失敗: {}", e),
            PriceError::HttpError(e) => format!("網路請求失敗: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PriceError::ConfigError { .. }
            | PriceError::InvalidConfigValueError { .. }
            | PriceError::MissingConfigError { .. } => {
                "Check the TOML configuration file and command line flags"
            }
            PriceError::InputError { .. } | PriceError::CsvError(_) => {
                "Make sure the products file is a JSON array or a CSV file with a 'name' column"
            }
            PriceError::IoError(_) | PriceError::ZipError(_) => {
                "Check that the output path exists and is writable"
            }
            PriceError::HttpError(_) => {
                "Check network connectivity and the source search URL"
            }
            PriceError::SerializationError(_) => "Report this as a bug",
        }
    }

    /// 設定錯誤 → 1，其它（I/O、輸出）→ 3
    pub fn exit_code(&self) -> i32 {
        if self.is_config_error() || matches!(self, PriceError::InputError { .. }) {
            1
        } else {
            3
        }
    }
}

pub type Result<T> = std::result::Result<T, PriceError>;

/// Adapter 內部的例外狀況。「找不到」不是錯誤，走 `Lookup::NotFound`。
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { status: u16, url: String },

    #[error("could not parse page: {0}")]
    Parse(String),

    #[error("source is not configured correctly: {0}")]
    Misconfigured(String),
}
