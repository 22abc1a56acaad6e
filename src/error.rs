use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::types::Title;

#[derive(Debug, Error)]
pub enum AppError {
    /// A stored draw type has no classification entry. Aborts the whole
    /// computation; dropping the records would corrupt totals and cursors.
    #[error("unmapped draw type {code} for title {title}")]
    UnmappedDrawType { title: Title, code: u32 },

    /// An import carried a draw type the title's tables do not know. Caught
    /// before anything is written so the account stays computable.
    #[error("rejected import: record {id} has unmapped draw type {code} for title {title}")]
    RejectedImport { title: Title, id: String, code: u32 },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt stored row: {0}")]
    CorruptRow(String),

    #[error("Channel send error: {0}")]
    ChannelSend(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error handed to every waiter of one coalesced computation.
    #[error("{0}")]
    Shared(Arc<AppError>),
}

impl AppError {
    /// The underlying error, looking through any `Shared` wrappers.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::Shared(inner) => inner.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.root() {
            AppError::RejectedImport { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ChannelSend(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
