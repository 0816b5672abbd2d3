//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// Alias for IDs that refer to rows in the transaction table.
pub type TransactionId = i64;
