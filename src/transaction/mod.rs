//! Transaction management for the app.
//!
//! This module contains everything related to transactions:
//! - The `TransactionRecord` model and `TransactionRecordBuilder` for creating transactions
//! - Database functions for storing, querying, and managing transactions
//! - View handlers for transaction-related web pages

mod core;
mod create_transaction_endpoint;
mod new_transaction_page;
mod recent_partial;
mod transactions_page;

pub use core::{
    TransactionKind, TransactionOrigin, TransactionRecord, TransactionRecordBuilder,
    create_transaction_table, get_all_transactions, get_recent_transactions, map_transaction_row,
};
pub use create_transaction_endpoint::create_transaction_endpoint;
pub use new_transaction_page::get_new_transaction_page;
pub use recent_partial::{get_recent_transactions_partial, recent_transactions_table};
pub use transactions_page::get_transactions_page;

#[cfg(test)]
pub use core::{count_transactions, create_transaction, get_transaction};
