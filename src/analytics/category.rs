use crate::analytics::{sort_by_id, track_pity, tier_metadata, CategoryStatistics, Tiers};
use crate::tables::{CategoryDef, PermanentPool, TitleTables};
use crate::types::{DrawRecord, Tier};

/// Builds the statistics for one banner category.
///
/// `slices` holds one ordered slice per aliased draw type. When more than one
/// is non-empty they are merged and re-sorted by id. An empty input still
/// yields a zero-valued record.
pub fn compose_category(
    tables: &TitleTables,
    def: &CategoryDef,
    slices: &[&[&DrawRecord]],
    pool: &PermanentPool,
) -> CategoryStatistics {
    let mut records: Vec<&DrawRecord> = slices.iter().flat_map(|s| s.iter().copied()).collect();
    if slices.iter().filter(|s| !s.is_empty()).count() > 1 {
        sort_by_id(&mut records, |r| r.id.as_str());
    }

    let total = records.len();
    let of_tier = |tier: Tier| -> Vec<DrawRecord> {
        records
            .iter()
            .filter(|r| tables.tier_of(r.rarity) == Some(tier))
            .map(|&r| r.clone())
            .collect()
    };

    CategoryStatistics {
        category: def.category,
        draw_type: def.draw_type(),
        total,
        first_time: records.first().map(|r| r.time.clone()),
        last_time: records.last().map(|r| r.time.clone()),
        last_end_id: records.last().map(|r| r.id.clone()),
        tiers: Tiers {
            blue: tier_metadata(total, of_tier(Tier::Blue)),
            purple: tier_metadata(total, of_tier(Tier::Purple)),
            golden: track_pity(tables, def.category, &records, total, pool),
        },
    }
}
