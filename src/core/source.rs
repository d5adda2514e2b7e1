//! Remote quote source abstraction

use super::quote::RawQuotes;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quotes(&self) -> Result<RawQuotes>;
}
