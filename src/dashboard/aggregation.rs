//! Pure transformations from transaction records to summary buckets.
//!
//! Both functions recompute from scratch on every call, there is no
//! incremental state.

use std::collections::{BTreeMap, HashMap};

use crate::transaction::{TransactionKind, TransactionRecord};

/// How many category buckets the dashboard shows.
pub(super) const CATEGORY_BUCKET_LIMIT: usize = 6;

/// How many months of history the dashboard shows.
pub(super) const MONTH_BUCKET_LIMIT: usize = 6;

/// The label used for records without a category.
pub(super) const UNCATEGORISED_LABEL: &str = "Other";

/// A category and the summed amount of its transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateBucket {
    /// The category label.
    pub label: String,
    /// The summed amount for this label.
    pub total: f64,
}

/// The top category buckets for one transaction kind.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotals {
    /// At most [CATEGORY_BUCKET_LIMIT] buckets, sorted by total descending.
    pub buckets: Vec<AggregateBucket>,
    /// The total over all matching records, including those whose buckets
    /// were cut off. Used as the denominator for percentage display, so the
    /// shown percentages need not sum to 100%.
    pub grand_total: f64,
}

/// Income and expenses summed for one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyBucket {
    /// The month key, e.g. "2024-01".
    pub month: String,
    /// Total income recorded in this month.
    pub income: f64,
    /// Total expenses recorded in this month.
    pub expense: f64,
    /// `income - expense`.
    pub net: f64,
}

/// Sum the amounts of all records of `kind` by category.
///
/// Records with a blank category are grouped under
/// [UNCATEGORISED_LABEL]. The buckets are sorted by total descending and
/// truncated to the top [CATEGORY_BUCKET_LIMIT], with ties keeping the order
/// in which the categories were first encountered.
///
/// An empty filtered set yields no buckets, the caller is expected to render
/// an explicit "no data" state.
pub fn group_by_category(records: &[TransactionRecord], kind: TransactionKind) -> CategoryTotals {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    let mut grand_total = 0.0;

    for record in records.iter().filter(|record| record.kind == kind) {
        let label = if record.category.trim().is_empty() {
            UNCATEGORISED_LABEL
        } else {
            record.category.as_str()
        };

        grand_total += record.amount;

        if !totals.contains_key(label) {
            first_seen.push(label);
        }
        *totals.entry(label).or_insert(0.0) += record.amount;
    }

    let mut buckets: Vec<AggregateBucket> = first_seen
        .into_iter()
        .map(|label| AggregateBucket {
            label: label.to_owned(),
            total: totals[label],
        })
        .collect();

    // A stable sort keeps first-encountered order for equal totals.
    buckets.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    buckets.truncate(CATEGORY_BUCKET_LIMIT);

    CategoryTotals {
        buckets,
        grand_total,
    }
}

/// Sum income and expenses per calendar month.
///
/// The month key is derived from the stored timestamp without timezone
/// conversion. Output is sorted ascending by month key and truncated to the
/// most recent [MONTH_BUCKET_LIMIT] months.
pub fn group_by_month(records: &[TransactionRecord]) -> Vec<MonthlyBucket> {
    let mut months: BTreeMap<String, (f64, f64)> = BTreeMap::new();

    for record in records {
        let key = format!(
            "{:04}-{:02}",
            record.created_at.year(),
            record.created_at.month() as u8
        );

        let (income, expense) = months.entry(key).or_insert((0.0, 0.0));
        match record.kind {
            TransactionKind::Income => *income += record.amount,
            TransactionKind::Expense => *expense += record.amount,
        }
    }

    let buckets: Vec<MonthlyBucket> = months
        .into_iter()
        .map(|(month, (income, expense))| MonthlyBucket {
            month,
            income,
            expense,
            net: income - expense,
        })
        .collect();

    let skip = buckets.len().saturating_sub(MONTH_BUCKET_LIMIT);
    buckets.into_iter().skip(skip).collect()
}
