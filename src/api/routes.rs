use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::info;

use crate::analytics::AccountStatistics;
use crate::api::health::HealthState;
use crate::db::SqliteRecordStore;
use crate::error::AppError;
use crate::state::cache_metrics::{CacheMetrics, CacheMetricsSnapshot};
use crate::state::StatisticsCache;
use crate::types::{DrawRecord, ImportBatch, Title};

#[derive(Clone)]
pub struct ApiState {
    pub cache: Arc<StatisticsCache<SqliteRecordStore>>,
    pub import_tx: mpsc::Sender<ImportBatch>,
    pub health: Arc<HealthState>,
    pub metrics: Arc<CacheMetrics>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/accounts/:title/:account_id/statistics", get(get_statistics))
        .route("/accounts/:title/:account_id/cursors", get(get_cursors))
        .route("/accounts/:title/:account_id/records", post(post_records))
        .route("/accounts/:title/:account_id/invalidate", post(post_invalidate))
        .route("/health", get(get_health))
        .route("/stats/cache", get(get_stats_cache))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ImportResponse {
    pub queued: usize,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub write_queue_pending: u64,
    pub last_import_at_ns: u64,
    pub records_imported: u64,
    pub cached_accounts: usize,
}


// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_statistics(
    State(state): State<ApiState>,
    Path((title, account_id)): Path<(Title, String)>,
) -> Result<Json<Arc<AccountStatistics>>, AppError> {
    let stats = state.cache.get(title, &account_id).await?;
    Ok(Json(stats))
}

/// Per draw type, the newest stored record id. Importers pass it back as
/// the "newer than" cursor on their next fetch.
async fn get_cursors(
    State(state): State<ApiState>,
    Path((title, account_id)): Path<(Title, String)>,
) -> Result<Json<BTreeMap<u32, String>>, AppError> {
    let stats = state.cache.get(title, &account_id).await?;
    Ok(Json(stats.resume_cursors()))
}

async fn post_records(
    State(state): State<ApiState>,
    Path((title, account_id)): Path<(Title, String)>,
    Json(records): Json<Vec<DrawRecord>>,
) -> Result<(StatusCode, Json<ImportResponse>), AppError> {
    let batch = ImportBatch { title, account_id: account_id.clone(), records };
    batch.check_draw_types()?;
    let queued = batch.records.len();
    state.health.inc_write_queue_pending();
    if let Err(e) = state.import_tx.send(batch).await {
        state.health.dec_write_queue_pending();
        return Err(AppError::ChannelSend(e.to_string()));
    }
    info!(%title, account_id = %account_id, queued, "[API] import batch queued");
    Ok((StatusCode::ACCEPTED, Json(ImportResponse { queued })))
}

async fn post_invalidate(
    State(state): State<ApiState>,
    Path((title, account_id)): Path<(Title, String)>,
) -> StatusCode {
    state.cache.invalidate(title, &account_id);
    StatusCode::NO_CONTENT
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        write_queue_pending: state.health.write_queue_pending(),
        last_import_at_ns: state.health.last_import_at_ns(),
        records_imported: state.health.records_imported(),
        cached_accounts: state.cache.cached_count(),
    })
}

async fn get_stats_cache(State(state): State<ApiState>) -> Json<CacheMetricsSnapshot> {
    Json(state.metrics.snapshot())
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use axum::response::Response;
    use tower::ServiceExt;

    use super::*;
    use crate::db::test_support::memory_pool;
    use crate::tables::PermanentPool;

    async fn app() -> (Router, ApiState, mpsc::Receiver<ImportBatch>) {
        let pool = memory_pool().await;
        let metrics = Arc::new(CacheMetrics::new());
        let cache = StatisticsCache::new(
            Arc::new(SqliteRecordStore::new(pool)),
            Arc::new(PermanentPool::embedded().unwrap()),
            Arc::clone(&metrics),
        );
        let (import_tx, import_rx) = mpsc::channel(4);
        let state = ApiState { cache, import_tx, health: Arc::new(HealthState::new()), metrics };
        (router(state.clone()), state, import_rx)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unknown_title_segment_is_rejected() {
        let (app, _, _) = app().await;
        let resp = app.oneshot(get_req("/accounts/wuwa/100000001/statistics")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn import_is_queued_for_the_writer() {
        let (app, state, mut rx) = app().await;
        let body = r#"[
            {"id":"1700000000000000001","draw_type":11,"rarity":3,"item_id":"20000","item_name":"Arrows","time":"2024-03-01 12:00:00"},
            {"id":"1700000000000000002","draw_type":11,"rarity":5,"item_id":"1205","item_name":"Blade","time":"2024-03-01 12:00:01"}
        ]"#;
        let resp = app.oneshot(post_json("/accounts/starrail/800000001/records", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(json_body(resp).await["queued"], 2);

        let batch = rx.try_recv().unwrap();
        assert_eq!(batch.title, Title::StarRail);
        assert_eq!(batch.account_id, "800000001");
        assert_eq!(batch.records[1].item_id, "1205");
        assert_eq!(state.health.write_queue_pending(), 1);
    }

    #[tokio::test]
    async fn import_with_unmapped_draw_type_is_unprocessable() {
        let (app, state, mut rx) = app().await;
        let body = r#"[
            {"id":"1","draw_type":301,"rarity":5,"item_name":"Keqing","time":"2024-03-01 12:00:00"},
            {"id":"2","draw_type":999,"rarity":3,"item_name":"x","time":"2024-03-01 12:00:01"}
        ]"#;
        let resp = app.oneshot(post_json("/accounts/genshin/100000001/records", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(rx.try_recv().is_err());
        assert_eq!(state.health.write_queue_pending(), 0);
    }

    #[tokio::test]
    async fn statistics_for_unknown_account_are_zeroed() {
        let (app, _, _) = app().await;
        let resp = app.clone().oneshot(get_req("/accounts/zzz/10001/statistics")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let stats = json_body(resp).await;
        assert_eq!(stats["title"], "zzz");
        assert_eq!(stats["total"], 0);
        assert_eq!(stats["categories"]["bangboo"]["draw_type"], 5);

        let resp = app.clone().oneshot(get_req("/accounts/zzz/10001/cursors")).await.unwrap();
        assert_eq!(json_body(resp).await, serde_json::json!({}));

        let resp = app.oneshot(get_req("/stats/cache")).await.unwrap();
        let metrics = json_body(resp).await;
        assert_eq!(metrics["misses"], 1);
        assert_eq!(metrics["hits"], 1);
        assert_eq!(metrics["computed"], 1);
    }
}
