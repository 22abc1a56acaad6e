use async_trait::async_trait;

use crate::error::Result;
use crate::types::{DrawRecord, Title};

/// Source of raw draw history.
///
/// Implementations return the complete history for one account of one
/// title, ascending by record id. No pagination at this boundary.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    async fn fetch_draws(&self, title: Title, account_id: &str) -> Result<Vec<DrawRecord>>;
}
