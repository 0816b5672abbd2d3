//! Dashboard HTTP handlers and view rendering.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    transaction::{TransactionKind, TransactionRecord, get_all_transactions},
};

use super::{
    aggregation::{group_by_category, group_by_month},
    cards::{category_breakdown_card, monthly_summary_table, summary_cards},
    presentation::{EXPENSE_PALETTE, INCOME_PALETTE},
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display a page with an overview of the user's finances.
pub async fn get_dashboard_page(State(state): State<DashboardState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW);

    let transactions = match get_all_transactions(&connection) {
        Ok(transactions) => transactions,
        // A store without the transaction table reads as no data yet.
        Err(Error::NotProvisioned) => Vec::new(),
        Err(error) => {
            tracing::error!("could not get transactions for dashboard: {error}");
            return Err(error);
        }
    };

    if transactions.is_empty() {
        return Ok(dashboard_no_data_view(nav_bar).into_response());
    }

    Ok(dashboard_view(nav_bar, &transactions).into_response())
}

fn dashboard_view(nav_bar: NavBar, transactions: &[TransactionRecord]) -> Markup {
    let income = group_by_category(transactions, TransactionKind::Income);
    let expenses = group_by_category(transactions, TransactionKind::Expense);
    let months = group_by_month(transactions);

    let content = html! {
        (nav_bar.into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-5xl space-y-6"
            {
                h1 class="text-xl font-bold" { "Dashboard" }

                (summary_cards(income.grand_total, expenses.grand_total))

                div class="grid grid-cols-1 md:grid-cols-2 gap-6"
                {
                    (category_breakdown_card("Expenses by Category", &expenses, &EXPENSE_PALETTE))
                    (category_breakdown_card("Income by Category", &income, &INCOME_PALETTE))
                }

                (monthly_summary_table(&months))
            }
        }
    };

    base("Dashboard", &[], &content)
}

fn dashboard_no_data_view(nav_bar: NavBar) -> Markup {
    let content = html! {
        (nav_bar.into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold" { "Dashboard" }

            p class="text-gray-500 dark:text-gray-400"
            {
                "No transactions yet. "

                a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE) tabindex="0"
                {
                    "Record your first transaction"
                }

                " to see your summary here."
            }
        }
    };

    base("Dashboard", &[], &content)
}
