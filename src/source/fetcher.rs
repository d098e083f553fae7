use reqwest::Client;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::model::{Listing, SourceError};
use crate::parser::Parser;
use crate::source::traits::ListingsSource;

/// Reads listings from the spreadsheet web endpoint.
pub struct HttpListingsSource {
    client: Client,
    url: String,
}

impl HttpListingsSource {
    pub fn new(url: impl Into<String>) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) IstirahaListings/0.1")
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait::async_trait]
impl ListingsSource for HttpListingsSource {
    async fn fetch_records(&self) -> Result<Vec<Value>, SourceError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::InvalidResponse(response.status().as_u16()));
        }
        let payload: Value = response.json().await?;
        Ok(into_records(payload))
    }
}

/// Reads listings from a JSON file holding the same payload as the endpoint.
pub struct FileListingsSource {
    path: PathBuf,
}

impl FileListingsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl ListingsSource for FileListingsSource {
    async fn fetch_records(&self) -> Result<Vec<Value>, SourceError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let payload: Value = serde_json::from_str(&content)?;
        Ok(into_records(payload))
    }
}

fn into_records(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(records) => records,
        other => {
            warn!("Listings payload is not an array (got {}), treating as empty", kind_of(&other));
            Vec::new()
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Picks the configured source: a local file wins over the web endpoint.
pub fn source_from_config(config: &AppConfig) -> Result<Box<dyn ListingsSource>, SourceError> {
    if let Some(path) = &config.listings_file {
        return Ok(Box::new(FileListingsSource::new(path)));
    }
    if let Some(url) = &config.listings_url {
        return Ok(Box::new(HttpListingsSource::new(url.clone())?));
    }
    Err(SourceError::NotConfigured)
}

/// Fetches and parses listings. A failed fetch is indistinguishable from an
/// empty collection to the caller; the failure is only logged.
pub async fn load_listings(source: &dyn ListingsSource, parser: &dyn Parser) -> Vec<Listing> {
    match source.fetch_records().await {
        Ok(records) => {
            let listings = parser.parse(&records);
            info!("Loaded {} listings from {} records", listings.len(), records.len());
            listings
        }
        Err(e) => {
            warn!("Listings fetch failed: {}", e);
            Vec::new()
        }
    }
}
