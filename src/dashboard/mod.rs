//! Dashboard module
//!
//! Provides an overview page with category breakdowns and a monthly
//! income/expense summary, recomputed from the full transaction history on
//! every request.

mod aggregation;
mod cards;
mod handlers;
mod presentation;

pub use aggregation::{
    AggregateBucket, CategoryTotals, MonthlyBucket, group_by_category, group_by_month,
};
pub use handlers::get_dashboard_page;
