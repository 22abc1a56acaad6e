use std::collections::BTreeMap;

use crate::analytics::pity::sum_average;
use crate::analytics::tier::percentage;
use crate::analytics::{
    sort_by_id, AggregatedStatistics, CategoryStatistics, TierMetadata, Tiers, TopTierMetadata,
};
use crate::tables::TitleTables;
use crate::types::{BannerCategory, DrawRecord};

/// Combines per-category statistics into one aggregate.
///
/// `included` is the ordered draw sequence with excluded categories already
/// filtered out; it supplies `total` and the time range. Percentages are
/// recomputed against that total rather than summed, and the average pity
/// is re-derived from the summed streaks.
pub fn aggregate_categories(
    tables: &TitleTables,
    included: &[&DrawRecord],
    categories: &BTreeMap<BannerCategory, CategoryStatistics>,
) -> AggregatedStatistics {
    let total = included.len();
    let parts: Vec<&Tiers> = categories
        .values()
        .filter(|c| tables.in_aggregate(c.category))
        .map(|c| &c.tiers)
        .collect();

    AggregatedStatistics {
        total,
        first_time: included.first().map(|r| r.time.clone()),
        last_time: included.last().map(|r| r.time.clone()),
        tiers: Tiers {
            blue: merge_tier(total, parts.iter().map(|t| &t.blue)),
            purple: merge_tier(total, parts.iter().map(|t| &t.purple)),
            golden: merge_top_tier(total, parts.iter().map(|t| &t.golden)),
        },
    }
}

fn merge_tier<'a>(total: usize, tiers: impl Iterator<Item = &'a TierMetadata>) -> TierMetadata {
    let mut values: Vec<DrawRecord> = tiers.flat_map(|t| t.values.iter().cloned()).collect();
    sort_by_id(&mut values, |r| r.id.as_str());
    let sum = values.len();
    TierMetadata {
        sum,
        percentage: percentage(sum, total),
        values,
    }
}

fn merge_top_tier<'a>(
    total: usize,
    tiers: impl Iterator<Item = &'a TopTierMetadata>,
) -> TopTierMetadata {
    let mut merged = TopTierMetadata::default();
    for tier in tiers {
        merged.sum += tier.sum;
        merged.sum_restricted += tier.sum_restricted;
        merged.used_pity_sum += tier.used_pity_sum;
        merged.values.extend(tier.values.iter().cloned());
    }
    sort_by_id(&mut merged.values, |v| v.record.id.as_str());
    merged.percentage = percentage(merged.sum, total);
    merged.sum_average = sum_average(merged.used_pity_sum, merged.sum);
    // Streaks never carry across pools.
    merged.next_pity = 0;
    merged
}
