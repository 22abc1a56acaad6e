use crate::analytics::tier::percentage;
use crate::analytics::{PityRecord, TopTierMetadata};
use crate::tables::{PermanentPool, TitleTables};
use crate::types::{BannerCategory, DrawRecord};

/// Running state of the streak walk.
#[derive(Default)]
struct PityWalk {
    streak: usize,
    used_pity_sum: usize,
    sum_restricted: usize,
    values: Vec<PityRecord>,
}

/// Expected pity cost: the mean rounded to two decimals, then ceiled.
///
/// Both steps matter. A mean of 40.004 gives 40, not 41.
pub fn sum_average(used_pity_sum: usize, sum: usize) -> usize {
    if sum == 0 {
        return 0;
    }
    let mean = (used_pity_sum as f64 / sum as f64 * 100.0).round() / 100.0;
    mean.ceil() as usize
}

/// Walks one category's draws in id order, counting the streak since the
/// last top-tier hit.
///
/// `records` is the whole category slice (every tier); `total` is its length
/// as reported, used for the percentage.
pub fn track_pity(
    tables: &TitleTables,
    category: BannerCategory,
    records: &[&DrawRecord],
    total: usize,
    pool: &PermanentPool,
) -> TopTierMetadata {
    let exempt = tables.is_restricted_exempt(category);

    let walk = records.iter().fold(PityWalk::default(), |mut walk, &record| {
        walk.streak += 1;
        if tables.is_golden(record) {
            let restricted = !exempt && !pool.contains(tables.title, record);
            walk.used_pity_sum += walk.streak;
            walk.sum_restricted += usize::from(restricted);
            walk.values.push(PityRecord {
                record: record.clone(),
                used_pity: walk.streak,
                restricted,
            });
            walk.streak = 0;
        }
        walk
    });

    let sum = walk.values.len();
    TopTierMetadata {
        sum,
        percentage: percentage(sum, total),
        sum_average: sum_average(walk.used_pity_sum, sum),
        sum_restricted: walk.sum_restricted,
        used_pity_sum: walk.used_pity_sum,
        next_pity: walk.streak,
        values: walk.values,
    }
}
