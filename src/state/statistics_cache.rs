use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use crate::analytics::{compute_account_statistics, AccountStatistics};
use crate::error::{AppError, Result};
use crate::state::cache_metrics::CacheMetrics;
use crate::state::RecordStore;
use crate::tables::PermanentPool;
use crate::types::Title;

type ComputeOutput = std::result::Result<Arc<AccountStatistics>, Arc<AppError>>;
type SharedCompute = Shared<BoxFuture<'static, ComputeOutput>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub title: Title,
    pub account_id: String,
}

impl CacheKey {
    pub fn new(title: Title, account_id: &str) -> Self {
        Self { title, account_id: account_id.to_string() }
    }
}

/// Per-key cache state. `generation` only ever grows; a computation may
/// publish only if the slot is still at the generation it started under.
#[derive(Default)]
struct CacheSlot {
    generation: u64,
    value: Option<Arc<AccountStatistics>>,
    in_flight: Option<SharedCompute>,
}

// ---------------------------------------------------------------------------
// StatisticsCache
// ---------------------------------------------------------------------------

/// Query facade over the analytics engine.
///
/// Fetches from the record store, computes, and caches per
/// `(title, account_id)` until [`StatisticsCache::invalidate`] is called.
/// Concurrent `get`s for the same key share one computation.
pub struct StatisticsCache<S> {
    store: Arc<S>,
    permanent_pool: Arc<PermanentPool>,
    metrics: Arc<CacheMetrics>,
    slots: DashMap<CacheKey, CacheSlot>,
}

impl<S: RecordStore> StatisticsCache<S> {
    pub fn new(
        store: Arc<S>,
        permanent_pool: Arc<PermanentPool>,
        metrics: Arc<CacheMetrics>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            permanent_pool,
            metrics,
            slots: DashMap::new(),
        })
    }

    pub async fn get(&self, title: Title, account_id: &str) -> Result<Arc<AccountStatistics>> {
        let key = CacheKey::new(title, account_id);

        // Never hold the slot guard across an await.
        let (generation, compute) = {
            let mut slot = self.slots.entry(key.clone()).or_default();
            if let Some(value) = &slot.value {
                self.metrics.record_hit();
                debug!(%title, account_id, "[CACHE] hit");
                return Ok(Arc::clone(value));
            }
            let compute = match &slot.in_flight {
                Some(shared) => {
                    self.metrics.record_coalesced();
                    debug!(%title, account_id, "[CACHE] joining in-flight computation");
                    shared.clone()
                }
                None => {
                    self.metrics.record_miss();
                    let shared = self.start_compute(title, account_id.to_string());
                    slot.in_flight = Some(shared.clone());
                    shared
                }
            };
            (slot.generation, compute)
        };

        let outcome = compute.clone().await;
        self.publish(&key, generation, &compute, &outcome);
        outcome.map_err(AppError::Shared)
    }

    /// Drops the cached value and bumps the generation so that any
    /// computation already running for this key cannot publish. Keys that
    /// were never requested have nothing to drop.
    pub fn invalidate(&self, title: Title, account_id: &str) {
        let Some(mut slot) = self.slots.get_mut(&CacheKey::new(title, account_id)) else {
            return;
        };
        slot.generation += 1;
        slot.value = None;
        slot.in_flight = None;
        debug!(%title, account_id, generation = slot.generation, "[CACHE] invalidated");
    }

    /// Number of keys holding a computed value.
    pub fn cached_count(&self) -> usize {
        self.slots.iter().filter(|s| s.value.is_some()).count()
    }

    fn publish(&self, key: &CacheKey, generation: u64, compute: &SharedCompute, outcome: &ComputeOutput) {
        let Some(mut slot) = self.slots.get_mut(key) else {
            return;
        };
        if slot.generation != generation {
            self.metrics.record_stale_discard();
            debug!(
                title = %key.title,
                account_id = %key.account_id,
                started = generation,
                current = slot.generation,
                "[CACHE] discarding result from stale generation",
            );
            return;
        }
        if slot.in_flight.as_ref().is_some_and(|f| f.ptr_eq(compute)) {
            slot.in_flight = None;
        }
        if let Ok(stats) = outcome {
            slot.value = Some(Arc::clone(stats));
        }
    }

    fn start_compute(&self, title: Title, account_id: String) -> SharedCompute {
        let store = Arc::clone(&self.store);
        let pool = Arc::clone(&self.permanent_pool);
        let metrics = Arc::clone(&self.metrics);

        async move {
            let records = store.fetch_draws(title, &account_id).await?;
            let started = Instant::now();
            let stats = compute_account_statistics(title, &account_id, &records, &pool)?;
            let elapsed = started.elapsed();
            metrics.record_compute(elapsed);
            info!(
                %title,
                account_id = %account_id,
                records = records.len(),
                golden = stats.aggregated.tiers.golden.sum,
                elapsed_us = elapsed.as_micros() as u64,
                "[CACHE] computed statistics",
            );
            Ok::<_, AppError>(Arc::new(stats))
        }
        .map(move |result| {
            result.map_err(|e| {
                warn!(%title, "[CACHE] statistics computation failed: {e}");
                Arc::new(e)
            })
        })
        .boxed()
        .shared()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::analytics::test_support::draw;
    use crate::state::record_store::memory::MemoryRecordStore;

    const ACCOUNT: &str = "100000001";

    fn cache(store: Arc<MemoryRecordStore>) -> Arc<StatisticsCache<MemoryRecordStore>> {
        StatisticsCache::new(
            store,
            Arc::new(PermanentPool::embedded().unwrap()),
            Arc::new(CacheMetrics::new()),
        )
    }

    fn seeded_store() -> Arc<MemoryRecordStore> {
        let store = MemoryRecordStore::new();
        store.put(
            Title::Genshin,
            ACCOUNT,
            vec![draw(1, 301, 3, "Slingshot"), draw(2, 301, 5, "Diluc")],
        );
        store
    }

    #[tokio::test]
    async fn second_get_is_served_from_cache() {
        let store = seeded_store();
        let cache = cache(Arc::clone(&store));

        let first = cache.get(Title::Genshin, ACCOUNT).await.unwrap();
        let second = cache.get(Title::Genshin, ACCOUNT).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.fetch_count(), 1);
        assert_eq!(first.total, 2);
        assert_eq!(cache.cached_count(), 1);
        let metrics = cache.metrics.snapshot();
        assert_eq!((metrics.hits, metrics.misses, metrics.computed), (1, 1, 1));
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let store = seeded_store();
        let cache = cache(Arc::clone(&store));

        let genshin = cache.get(Title::Genshin, ACCOUNT).await.unwrap();
        let other = cache.get(Title::StarRail, ACCOUNT).await.unwrap();
        assert_eq!(genshin.total, 2);
        assert_eq!(other.total, 0);
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_recompute() {
        let store = seeded_store();
        let cache = cache(Arc::clone(&store));

        let before = cache.get(Title::Genshin, ACCOUNT).await.unwrap();
        store.put(
            Title::Genshin,
            ACCOUNT,
            vec![draw(1, 301, 3, "Slingshot"), draw(2, 301, 5, "Diluc"), draw(3, 301, 3, "Slingshot")],
        );
        // Not observed until invalidated.
        assert_eq!(cache.get(Title::Genshin, ACCOUNT).await.unwrap().total, 2);

        cache.invalidate(Title::Genshin, ACCOUNT);
        let after = cache.get(Title::Genshin, ACCOUNT).await.unwrap();
        assert_eq!(before.total, 2);
        assert_eq!(after.total, 3);
        assert_eq!(after.categories[&crate::types::BannerCategory::Character].tiers.golden.next_pity, 1);
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn concurrent_gets_share_one_computation() {
        let store = seeded_store();
        store.delay_ms.store(50, Ordering::SeqCst);
        let cache = cache(Arc::clone(&store));

        let (a, b, c) = tokio::join!(
            cache.get(Title::Genshin, ACCOUNT),
            cache.get(Title::Genshin, ACCOUNT),
            cache.get(Title::Genshin, ACCOUNT),
        );
        let a = a.unwrap();
        assert!(Arc::ptr_eq(&a, &b.unwrap()));
        assert!(Arc::ptr_eq(&a, &c.unwrap()));
        assert_eq!(store.fetch_count(), 1);
        let metrics = cache.metrics.snapshot();
        assert_eq!((metrics.misses, metrics.coalesced), (1, 2));
    }

    #[tokio::test]
    async fn result_started_before_invalidation_is_not_cached() {
        let store = seeded_store();
        store.delay_ms.store(50, Ordering::SeqCst);
        let cache = cache(Arc::clone(&store));

        let background = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get(Title::Genshin, ACCOUNT).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        cache.invalidate(Title::Genshin, ACCOUNT);

        // The stale waiter still gets its answer...
        assert!(background.await.unwrap().is_ok());
        // ...but the slot stays empty for the newer generation.
        assert_eq!(cache.cached_count(), 0);
        assert_eq!(cache.metrics.snapshot().stale_discards, 1);

        store.delay_ms.store(0, Ordering::SeqCst);
        cache.get(Title::Genshin, ACCOUNT).await.unwrap();
        assert_eq!(store.fetch_count(), 2);
        assert_eq!(cache.cached_count(), 1);
    }

    #[tokio::test]
    async fn invalidating_an_unrequested_key_allocates_nothing() {
        let store = seeded_store();
        let cache = cache(Arc::clone(&store));

        cache.invalidate(Title::Genshin, "never-requested");
        assert!(cache.slots.is_empty());

        cache.get(Title::Genshin, ACCOUNT).await.unwrap();
        cache.invalidate(Title::StarRail, ACCOUNT);
        assert_eq!(cache.slots.len(), 1);
        assert_eq!(cache.cached_count(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_is_not_cached() {
        let store = seeded_store();
        store.fail.store(true, Ordering::SeqCst);
        let cache = cache(Arc::clone(&store));

        let err = cache.get(Title::Genshin, ACCOUNT).await.unwrap_err();
        assert!(matches!(err.root(), AppError::Io(_)));
        assert_eq!(cache.cached_count(), 0);

        store.fail.store(false, Ordering::SeqCst);
        let stats = cache.get(Title::Genshin, ACCOUNT).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn unmapped_draw_type_surfaces_to_caller() {
        let store = MemoryRecordStore::new();
        store.put(Title::ZenlessZoneZero, ACCOUNT, vec![draw(1, 9, 2, "???")]);
        let cache = cache(Arc::clone(&store));

        let err = cache.get(Title::ZenlessZoneZero, ACCOUNT).await.unwrap_err();
        assert!(matches!(
            err.root(),
            AppError::UnmappedDrawType { title: Title::ZenlessZoneZero, code: 9 }
        ));
        assert_eq!(cache.cached_count(), 0);
    }
}
