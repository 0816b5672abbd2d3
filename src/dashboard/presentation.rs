//! Turns aggregate buckets into proportions for bar rendering.
//!
//! These functions know nothing about pixels or markup, they only produce
//! percentages and colors.

/// Colors assigned to expense buckets by position.
pub(super) const EXPENSE_PALETTE: [&str; 6] = [
    "#EF4444", "#F97316", "#EAB308", "#22C55E", "#3B82F6", "#8B5CF6",
];

/// Colors assigned to income buckets by position.
pub(super) const INCOME_PALETTE: [&str; 6] = [
    "#22C55E", "#10B981", "#14B8A6", "#06B6D4", "#3B82F6", "#8B5CF6",
];

/// The width of a bucket's bar as a percentage of the largest bucket.
///
/// The denominator is floored at 1 so a set of all-zero totals renders
/// zero-width bars instead of dividing by zero.
pub(super) fn bar_width_percent(total: f64, max_of_set: f64) -> f64 {
    total / max_of_set.max(1.0) * 100.0
}

/// The bucket's share of the grand total as a percentage, or 0 when the
/// grand total is not positive.
pub(super) fn share_percent(total: f64, grand_total: f64) -> f64 {
    if grand_total > 0.0 {
        total / grand_total * 100.0
    } else {
        0.0
    }
}

/// The color for the bucket at `index`, assigned by position and wrapping
/// around when there are more buckets than colors.
pub(super) fn palette_color(palette: &'static [&'static str], index: usize) -> &'static str {
    palette[index % palette.len()]
}
