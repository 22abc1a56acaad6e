use crate::analytics::TierMetadata;
use crate::types::DrawRecord;

/// Share of `total` as a percentage with two decimals.
///
/// Rounds at the 1/10000 step before dividing by 100, so 2 of 3 is 66.67.
/// Zero when either side is zero.
pub fn percentage(sum: usize, total: usize) -> f64 {
    if sum == 0 || total == 0 {
        return 0.0;
    }
    (sum as f64 / total as f64 * 10_000.0).round() / 100.0
}

/// `values` must already be filtered to a single tier.
pub fn tier_metadata(total: usize, values: Vec<DrawRecord>) -> TierMetadata {
    let sum = values.len();
    TierMetadata {
        sum,
        percentage: percentage(sum, total),
        values,
    }
}
