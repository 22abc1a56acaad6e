pub mod cache_metrics;
pub mod record_store;
pub mod statistics_cache;

pub use cache_metrics::CacheMetrics;
pub use record_store::RecordStore;
pub use statistics_cache::StatisticsCache;
