pub mod summary;
pub mod table;

use crate::domain::model::ComparisonRecord;
use crate::domain::ports::Storage;
use crate::utils::error::{PriceError, Result};
use std::io::Write;
use std::str::FromStr;
use zip::write::{FileOptions, ZipWriter};

pub const SUMMARY_FILE: &str = "price_comparison_output.json";
pub const OFFERS_FILE: &str = "price_comparison_offers.csv";
pub const ARCHIVE_FILE: &str = "price_comparison.zip";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
    /// JSON 與 CSV 打包成一個 zip
    Zip,
}

impl OutputFormat {
    pub const ALL: [&'static str; 3] = ["json", "csv", "zip"];
}

impl FromStr for OutputFormat {
    type Err = PriceError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "zip" => Ok(OutputFormat::Zip),
            other => Err(PriceError::InvalidConfigValueError {
                field: "run.output_formats".to_string(),
                value: other.to_string(),
                reason: format!("Unsupported format. Valid formats: {}", Self::ALL.join(", ")),
            }),
        }
    }
}

/// 把比價紀錄寫到 storage
pub struct Exporter<S: Storage> {
    storage: S,
    formats: Vec<OutputFormat>,
}

impl<S: Storage> Exporter<S> {
    pub fn new(storage: S, formats: Vec<OutputFormat>) -> Self {
        Self { storage, formats }
    }

    pub fn from_names(storage: S, names: &[String]) -> Result<Self> {
        let formats = names
            .iter()
            .map(|name| name.parse())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(storage, formats))
    }

    /// 回傳實際寫出的檔案路徑
    pub async fn export(&self, records: &[ComparisonRecord]) -> Result<Vec<String>> {
        let mut written = Vec::new();

        for format in &self.formats {
            let (file_name, data) = match format {
                OutputFormat::Json => (SUMMARY_FILE, summary::to_json(records)?.into_bytes()),
                OutputFormat::Csv => (OFFERS_FILE, table::to_csv(records)?),
                OutputFormat::Zip => (ARCHIVE_FILE, build_archive(records)?),
            };

            tracing::debug!("Writing {} ({} bytes)", file_name, data.len());
            self.storage.write_file(file_name, &data).await?;
            written.push(self.storage.describe(file_name));
        }

        Ok(written)
    }
}

fn build_archive(records: &[ComparisonRecord]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    zip.start_file::<_, ()>(SUMMARY_FILE, FileOptions::default())?;
    zip.write_all(summary::to_json(records)?.as_bytes())?;

    zip.start_file::<_, ()>(OFFERS_FILE, FileOptions::default())?;
    zip.write_all(&table::to_csv(records)?)?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn get(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        fn describe(&self, path: &str) -> String {
            format!("mock://{}", path)
        }
    }

    #[test]
    fn test_parse_formats() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("zip".parse::<OutputFormat>().unwrap(), OutputFormat::Zip);
        assert!("tsv".parse::<OutputFormat>().is_err());
    }

    #[tokio::test]
    async fn test_export_writes_selected_formats() {
        let storage = MockStorage::default();
        let exporter =
            Exporter::from_names(storage.clone(), &["json".to_string(), "zip".to_string()])
                .unwrap();

        let written = exporter.export(&[]).await.unwrap();
        assert_eq!(
            written,
            vec![
                format!("mock://{}", SUMMARY_FILE),
                format!("mock://{}", ARCHIVE_FILE)
            ]
        );

        let json = storage.get(SUMMARY_FILE).await.unwrap();
        assert_eq!(String::from_utf8(json).unwrap(), "{}");
        assert!(storage.get(OFFERS_FILE).await.is_none());

        let archive = storage.get(ARCHIVE_FILE).await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(archive)).unwrap();
        assert_eq!(archive.len(), 2);
        assert!(archive.by_name(OFFERS_FILE).is_ok());
    }
}
