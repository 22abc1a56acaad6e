pub mod models;
pub mod record_store;
pub mod writer;

pub use record_store::SqliteRecordStore;
pub use writer::DbWriter;

/// Opens the database and applies pending migrations.
pub async fn connect(db_path: &str) -> crate::error::Result<sqlx::SqlitePool> {
    let options = sqlx::sqlite::SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true);
    let pool = sqlx::SqlitePool::connect_with(options).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}
