//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, endpoints,
    live::{ChangeEvent, ChangeFeed},
    transaction::{TransactionKind, TransactionRecord, core::create_transaction},
};

/// The state needed to get or create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The feed to notify when a transaction is created.
    pub change_feed: ChangeFeed,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            change_feed: state.change_feed.clone(),
        }
    }
}

/// The form data for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// The value of the transaction in dollars.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,
    /// The category the transaction belongs to.
    pub category: String,
    /// Optional text detailing the transaction.
    #[serde(default)]
    pub description: Option<String>,
}

/// A route handler for creating a new transaction, redirects to transactions view on success.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Form(form): Form<TransactionForm>,
) -> impl IntoResponse {
    let description = form
        .description
        .filter(|description| !description.trim().is_empty());
    let transaction =
        TransactionRecord::build(form.amount, form.kind, form.category.trim()).description(description);

    {
        let connection = state
            .db_connection
            .lock()
            .expect("Could not acquire database lock");

        if let Err(error) = create_transaction(transaction, &connection) {
            return error.into_alert_response();
        }
    }

    state.change_feed.publish(ChangeEvent::Inserted);

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
