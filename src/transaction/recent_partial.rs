//! Defines the endpoint that renders the recent transactions list as an HTML
//! fragment. The transactions page fetches this fragment on load and refetches
//! it whenever the change feed signals that the data changed.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    app_state::RECENT_TRANSACTIONS_COUNT,
    category::category_icon,
    html::{TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency},
    transaction::{TransactionKind, TransactionRecord, core::get_recent_transactions},
};

/// The state needed to list recent transactions.
#[derive(Debug, Clone)]
pub struct TransactionListState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionListState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the most recent transactions as a table fragment.
///
/// A database without the transaction table is treated the same as an empty
/// database so a freshly provisioned app renders an empty list instead of an
/// error.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_recent_transactions_partial(
    State(state): State<TransactionListState>,
) -> Response {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    let transactions = match get_recent_transactions(RECENT_TRANSACTIONS_COUNT, &connection) {
        Ok(transactions) => transactions,
        Err(Error::NotProvisioned) => Vec::new(),
        Err(error) => return error.into_response(),
    };

    recent_transactions_table(&transactions).into_response()
}

/// Render a table of transactions, or an empty state when there are none.
pub fn recent_transactions_table(transactions: &[TransactionRecord]) -> Markup {
    if transactions.is_empty() {
        return html! {
            p class="text-gray-500 dark:text-gray-400" { "No transactions yet." }
        };
    }

    html! {
        table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                }
            }

            tbody
            {
                @for transaction in transactions {
                    (transaction_row(transaction))
                }
            }
        }
    }
}

fn transaction_row(transaction: &TransactionRecord) -> Markup {
    let (sign, amount_style) = match transaction.kind {
        TransactionKind::Income => ("+", "text-green-500"),
        TransactionKind::Expense => ("-", "text-red-500"),
    };

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE)
            {
                (transaction.created_at.date())
            }

            td class=(TABLE_CELL_STYLE)
            {
                span class="mr-1" { (category_icon(&transaction.category)) }
                (transaction.category)
            }

            td class=(TABLE_CELL_STYLE)
            {
                (transaction.description.as_deref().unwrap_or(""))
            }

            td class={ (TABLE_CELL_STYLE) " " (amount_style) }
            {
                (sign) (format_currency(transaction.amount))
            }
        }
    }
}
