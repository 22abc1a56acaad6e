use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::api::health::HealthState;
use crate::db::SqliteRecordStore;
use crate::error::Result;
use crate::state::StatisticsCache;
use crate::types::ImportBatch;

/// Receives import batches from the API and persists them to SQLite.
/// Runs as a dedicated background task; after each batch that added rows
/// the account's cached statistics are invalidated.
pub struct DbWriter {
    pool: sqlx::SqlitePool,
    batch_rx: mpsc::Receiver<ImportBatch>,
    cache: Arc<StatisticsCache<SqliteRecordStore>>,
    health: Arc<HealthState>,
}

impl DbWriter {
    pub fn new(
        pool: sqlx::SqlitePool,
        batch_rx: mpsc::Receiver<ImportBatch>,
        cache: Arc<StatisticsCache<SqliteRecordStore>>,
        health: Arc<HealthState>,
    ) -> Self {
        Self { pool, batch_rx, cache, health }
    }

    pub async fn run(mut self) {
        while let Some(batch) = self.batch_rx.recv().await {
            self.health.dec_write_queue_pending();
            if let Err(e) = self.apply(&batch).await {
                error!(
                    title = %batch.title,
                    account_id = %batch.account_id,
                    "[DB] import write error: {e}"
                );
            }
        }
    }

    /// Persists one batch and invalidates the cache if anything was new.
    /// A batch with an unclassifiable record is refused whole.
    pub async fn apply(&self, batch: &ImportBatch) -> Result<u64> {
        batch.check_draw_types()?;
        let inserted = self.write_batch(batch).await?;
        if inserted > 0 {
            self.cache.invalidate(batch.title, &batch.account_id);
        }
        self.health.add_records_imported(inserted);
        self.health.set_last_import_at_ns(now_ns());
        info!(
            title = %batch.title,
            account_id = %batch.account_id,
            received = batch.records.len(),
            inserted,
            "[DB] import batch persisted",
        );
        Ok(inserted)
    }

    /// Inserts in one transaction. Records already stored (same id) are
    /// skipped; returns the number of new rows.
    async fn write_batch(&self, batch: &ImportBatch) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for r in &batch.records {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO draw_records (
                    title, account_id, id, draw_type, rarity, item_id, item_name, time
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(batch.title.as_str())
            .bind(&batch.account_id)
            .bind(&r.id)
            .bind(i64::from(r.draw_type))
            .bind(i64::from(r.rarity))
            .bind(&r.item_id)
            .bind(&r.item_name)
            .bind(&r.time)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
