//! HTTP implementation of the sheet source.
//!
//! Reads the whole worksheet through the spreadsheet values endpoint
//! (`GET {base_url}/v4/spreadsheets/{document_id}/values/{worksheet}`),
//! which returns `{ "values": [[cell, ...], ...] }`. Every transport,
//! status, or decode failure maps to [`ReadError::SourceUnavailable`] and
//! is retried by the observer loop.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::SheetSource;
use crate::config::SheetConfig;
use crate::error::ReadError;

pub struct HttpSheetSource {
    client: reqwest::Client,
    url: reqwest::Url,
}

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl HttpSheetSource {
    pub fn new(config: &SheetConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build HTTP client for sheet source")?;

        let mut url = reqwest::Url::parse(&config.base_url)
            .with_context(|| format!("Invalid sheet base URL: {}", config.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Sheet base URL cannot be a base: {}", config.base_url))?
            .extend([
                "v4",
                "spreadsheets",
                config.document_id.as_str(),
                "values",
                config.worksheet.as_str(),
            ]);
        if !config.api_key.is_empty() {
            url.query_pairs_mut().append_pair("key", &config.api_key);
        }

        Ok(Self { client, url })
    }
}

#[async_trait]
impl SheetSource for HttpSheetSource {
    async fn fetch_rows(&self) -> Result<Vec<Vec<String>>, ReadError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?;

        let body: ValuesResponse = response.json().await?;

        // The values endpoint may hand back numbers or booleans for cells
        // a human typed as such; the board model is all-strings.
        let rows = body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect();
        Ok(rows)
    }
}

fn cell_to_string(cell: serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet_config(base_url: &str) -> SheetConfig {
        SheetConfig {
            base_url: base_url.to_string(),
            document_id: "doc123".to_string(),
            worksheet: "Hoja 1".to_string(),
            api_key: String::new(),
            timeout_seconds: 5,
        }
    }

    #[test]
    fn builds_values_url_with_encoded_worksheet() {
        let source = HttpSheetSource::new(&sheet_config("https://sheets.example.com")).unwrap();
        assert_eq!(
            source.url.as_str(),
            "https://sheets.example.com/v4/spreadsheets/doc123/values/Hoja%201"
        );
    }

    #[test]
    fn appends_api_key_when_present() {
        let mut config = sheet_config("https://sheets.example.com");
        config.api_key = "secret".to_string();
        let source = HttpSheetSource::new(&config).unwrap();
        assert!(source.url.as_str().ends_with("?key=secret"));
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(HttpSheetSource::new(&sheet_config("not a url")).is_err());
    }

    #[test]
    fn converts_non_string_cells() {
        assert_eq!(cell_to_string(serde_json::json!("A-101")), "A-101");
        assert_eq!(cell_to_string(serde_json::json!(45)), "45");
        assert_eq!(cell_to_string(serde_json::Value::Null), "");
    }
}
