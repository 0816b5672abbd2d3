//! Defines the core data models and database queries for transactions.

use std::{fmt, str::FromStr};

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{DatabaseId, TransactionId},
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction brings money in or takes money out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned, e.g. salary or interest.
    Income,
    /// Money spent, e.g. groceries or rent.
    Expense,
}

impl TransactionKind {
    /// The string stored in the database for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("invalid transaction kind {other:?}")),
        }
    }
}

/// Where a transaction entered the system from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionOrigin {
    /// Created through the web form.
    Web,
    /// Pushed in by an external channel such as a chat bot.
    External,
}

impl TransactionOrigin {
    /// The string stored in the database for this origin.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionOrigin::Web => "web",
            TransactionOrigin::External => "external",
        }
    }
}

impl fmt::Display for TransactionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web" => Ok(TransactionOrigin::Web),
            "external" => Ok(TransactionOrigin::External),
            other => Err(format!("invalid transaction origin {other:?}")),
        }
    }
}

/// An income or expense, i.e. an event where money was either earned or spent.
///
/// To create a new `TransactionRecord`, use [TransactionRecord::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The amount of money earned or spent. Always zero or greater, the
    /// direction of the money flow is given by `kind`.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,
    /// Free-text category, e.g. "Groceries" or "Salary".
    pub category: String,
    /// An optional text description of what the transaction was for.
    pub description: Option<String>,
    /// Where the transaction was created from.
    pub origin: TransactionOrigin,
    /// When the transaction was recorded.
    pub created_at: OffsetDateTime,
}

impl TransactionRecord {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionRecordBuilder] for discoverability.
    pub fn build(amount: f64, kind: TransactionKind, category: &str) -> TransactionRecordBuilder {
        TransactionRecordBuilder {
            amount,
            kind,
            category: category.to_owned(),
            description: None,
            origin: TransactionOrigin::Web,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// A builder for creating [TransactionRecord] instances.
///
/// The creation timestamp defaults to the current time and the origin
/// defaults to [TransactionOrigin::Web].
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionRecordBuilder {
    /// The monetary amount of the transaction. Must be zero or greater.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,
    /// Free-text category, e.g. "Groceries" or "Salary".
    pub category: String,
    /// An optional text description of the transaction.
    pub description: Option<String>,
    /// Where the transaction was created from.
    pub origin: TransactionOrigin,
    /// When the transaction was recorded.
    pub created_at: OffsetDateTime,
}

impl TransactionRecordBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Set the origin for the transaction.
    pub fn origin(mut self, origin: TransactionOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Set the creation timestamp for the transaction.
    pub fn created_at(mut self, created_at: OffsetDateTime) -> Self {
        self.created_at = created_at;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database from a builder.
///
/// The transaction is inserted with a single statement so a transaction is
/// never recorded twice for one submission.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is negative or not finite,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionRecordBuilder,
    connection: &Connection,
) -> Result<TransactionRecord, Error> {
    // The NaN and infinity checks matter as well as the sign check: SQLite
    // binds NaN as NULL and happily stores infinities, which would poison
    // every aggregate that touches the row.
    if !builder.amount.is_finite() || builder.amount < 0.0 {
        return Err(Error::InvalidAmount(builder.amount));
    }

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (amount, kind, category, description, origin, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, amount, kind, category, description, origin, created_at",
        )?
        .query_row(
            (
                builder.amount,
                builder.kind.as_str(),
                builder.category,
                builder.description,
                builder.origin.as_str(),
                builder.created_at,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    connection: &Connection,
) -> Result<TransactionRecord, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, amount, kind, category, description, origin, created_at
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve the `limit` most recently recorded transactions, newest first.
///
/// Rows that cannot be mapped to a [TransactionRecord] are skipped with a
/// warning rather than failing the whole query.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn get_recent_transactions(
    limit: usize,
    connection: &Connection,
) -> Result<Vec<TransactionRecord>, Error> {
    let transactions = connection
        .prepare(
            "SELECT id, amount, kind, category, description, origin, created_at
             FROM \"transaction\" ORDER BY created_at DESC, id DESC LIMIT :limit",
        )?
        .query_map(&[(":limit", &(limit as i64))], map_transaction_row)?
        .filter_map(log_and_skip_invalid_rows)
        .collect();

    Ok(transactions)
}

/// Retrieve every transaction in the database, newest first.
///
/// Rows that cannot be mapped to a [TransactionRecord] are skipped with a
/// warning rather than failing the whole query.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn get_all_transactions(connection: &Connection) -> Result<Vec<TransactionRecord>, Error> {
    let transactions = connection
        .prepare(
            "SELECT id, amount, kind, category, description, origin, created_at
             FROM \"transaction\" ORDER BY created_at DESC, id DESC",
        )?
        .query_map([], map_transaction_row)?
        .filter_map(log_and_skip_invalid_rows)
        .collect();

    Ok(transactions)
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount REAL NOT NULL,
                kind TEXT NOT NULL,
                category TEXT NOT NULL,
                description TEXT,
                origin TEXT NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    // Index used by the recent list and dashboard queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_created_at ON \"transaction\"(created_at);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a TransactionRecord.
pub fn map_transaction_row(row: &Row) -> Result<TransactionRecord, rusqlite::Error> {
    let id = row.get(0)?;
    let amount = row.get(1)?;
    let kind: String = row.get(2)?;
    let kind = TransactionKind::from_str(&kind).map_err(invalid_text_column(2))?;
    let category = row.get(3)?;
    let description = row.get(4)?;
    let origin: String = row.get(5)?;
    let origin = TransactionOrigin::from_str(&origin).map_err(invalid_text_column(5))?;
    let created_at = row.get(6)?;

    Ok(TransactionRecord {
        id,
        amount,
        kind,
        category,
        description,
        origin,
        created_at,
    })
}

fn invalid_text_column(index: usize) -> impl Fn(String) -> rusqlite::Error {
    move |error| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, error)),
        )
    }
}

fn log_and_skip_invalid_rows(
    row: Result<TransactionRecord, rusqlite::Error>,
) -> Option<TransactionRecord> {
    match row {
        Ok(transaction) => Some(transaction),
        Err(error) => {
            tracing::warn!("Skipping transaction row that could not be read: {error}");
            None
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
