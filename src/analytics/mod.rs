//! Draw-history analytics: per-category tier statistics, pity tracking and
//! the cross-category aggregate. Pure functions of an ordered record slice.

pub mod aggregate;
pub mod category;
pub mod pity;
pub mod tier;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Result;
use crate::tables::PermanentPool;
use crate::types::{BannerCategory, DrawRecord, Title};

pub use aggregate::aggregate_categories;
pub use category::compose_category;
pub use pity::track_pity;
pub use tier::tier_metadata;

// ---------------------------------------------------------------------------
// Statistics types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TierMetadata {
    pub sum: usize,
    /// Two decimals, 0..=100.
    pub percentage: f64,
    pub values: Vec<DrawRecord>,
}

/// A top-tier hit together with the streak it consumed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PityRecord {
    #[serde(flatten)]
    pub record: DrawRecord,
    pub used_pity: usize,
    pub restricted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopTierMetadata {
    pub sum: usize,
    pub percentage: f64,
    pub values: Vec<PityRecord>,
    pub sum_average: usize,
    pub sum_restricted: usize,
    pub used_pity_sum: usize,
    /// Draws since the last top-tier hit.
    pub next_pity: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tiers {
    pub blue: TierMetadata,
    pub purple: TierMetadata,
    pub golden: TopTierMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStatistics {
    pub category: BannerCategory,
    pub draw_type: u32,
    pub total: usize,
    pub first_time: Option<String>,
    pub last_time: Option<String>,
    /// Highest record id seen; the cursor for the next incremental fetch.
    pub last_end_id: Option<String>,
    pub tiers: Tiers,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedStatistics {
    pub total: usize,
    pub first_time: Option<String>,
    pub last_time: Option<String>,
    pub tiers: Tiers,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountStatistics {
    pub account_id: String,
    pub title: Title,
    pub total: usize,
    pub first_time: Option<String>,
    pub last_time: Option<String>,
    pub categories: BTreeMap<BannerCategory, CategoryStatistics>,
    pub aggregated: AggregatedStatistics,
    pub draw_type_to_category: BTreeMap<u32, BannerCategory>,
}

impl AccountStatistics {
    /// `last_end_id` of every non-empty category, keyed by its draw type.
    pub fn resume_cursors(&self) -> BTreeMap<u32, String> {
        self.categories
            .values()
            .filter_map(|c| c.last_end_id.clone().map(|id| (c.draw_type, id)))
            .collect()
    }
}

/// Orders values by record id (lexicographic).
pub(crate) fn sort_by_id<T>(values: &mut [T], id: impl Fn(&T) -> &str) {
    values.sort_by(|a, b| id(a).cmp(id(b)));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Builds the full statistics structure for one account of one title.
///
/// `records` must be the complete history for the account, ascending by id.
/// Fails on the first draw type the title's tables do not know.
pub fn compute_account_statistics(
    title: Title,
    account_id: &str,
    records: &[DrawRecord],
    pool: &PermanentPool,
) -> Result<AccountStatistics> {
    let tables = title.tables();

    let mut by_draw_type: BTreeMap<u32, Vec<&DrawRecord>> = BTreeMap::new();
    for record in records {
        tables.category_of(record.draw_type)?;
        by_draw_type.entry(record.draw_type).or_default().push(record);
    }

    let categories: BTreeMap<BannerCategory, CategoryStatistics> = tables
        .categories
        .iter()
        .map(|def| {
            let slices: Vec<&[&DrawRecord]> = def
                .draw_types
                .iter()
                .filter_map(|code| by_draw_type.get(code).map(Vec::as_slice))
                .collect();
            (def.category, compose_category(tables, def, &slices, pool))
        })
        .collect();

    let included: Vec<&DrawRecord> = records
        .iter()
        .filter(|r| {
            tables
                .category_of(r.draw_type)
                .map(|c| tables.in_aggregate(c))
                .unwrap_or(false)
        })
        .collect();
    let aggregated = aggregate_categories(tables, &included, &categories);

    Ok(AccountStatistics {
        account_id: account_id.to_string(),
        title,
        total: records.len(),
        first_time: records.first().map(|r| r.time.clone()),
        last_time: records.last().map(|r| r.time.clone()),
        categories,
        aggregated,
        draw_type_to_category: tables.draw_type_to_category(),
    })
}
