use crate::core::jsonstat::JsonStatDataset;
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;

/// Reads JSON-stat 2.0 datasets from the CSO PxStat `ReadDataset` endpoint.
#[derive(Debug, Clone)]
pub struct CsoClient {
    client: Client,
    api_base: String,
}

impl CsoClient {
    pub fn new(api_base: impl Into<String>, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn dataset_url(&self, table_id: &str) -> String {
        format!("{}/{}/JSON-stat/2.0/en", self.api_base, table_id)
    }

    /// Fetches one table, optionally narrowed server-side by `request`
    /// (dimension -> category labels). No retries.
    pub async fn fetch_dataset(
        &self,
        table_id: &str,
        request: &BTreeMap<String, Vec<String>>,
    ) -> Result<JsonStatDataset> {
        let url = self.dataset_url(table_id);
        tracing::debug!("Making API request to: {}", url);

        let mut builder = self.client.get(&url);
        if !request.is_empty() {
            let query = serde_json::json!({ "request": request }).to_string();
            builder = builder.query(&[("query", query.as_str()), ("format", "json-stat2")]);
        }

        let response = builder.send().await?;
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            return Err(EtlError::HttpStatusError {
                table: table_id.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        tracing::debug!("Received {} bytes for table {}", body.len(), table_id);
        JsonStatDataset::from_slice(&body)
    }
}
