use async_trait::async_trait;

use crate::db::models::DrawRecordRow;
use crate::error::Result;
use crate::state::RecordStore;
use crate::types::{DrawRecord, Title};

/// SQLite-backed draw history.
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: sqlx::SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn fetch_draws(&self, title: Title, account_id: &str) -> Result<Vec<DrawRecord>> {
        let rows: Vec<DrawRecordRow> = sqlx::query_as(
            r#"
            SELECT id, draw_type, rarity, item_id, item_name, time
            FROM draw_records
            WHERE title = ? AND account_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(title.as_str())
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DrawRecord::try_from).collect()
    }
}
