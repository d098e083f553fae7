use serde_json::Value;

use crate::model::SourceError;

#[async_trait::async_trait]
pub trait ListingsSource: Send + Sync {
    /// Fetches the raw, Arabic-keyed listing records.
    async fn fetch_records(&self) -> Result<Vec<Value>, SourceError>;
}
