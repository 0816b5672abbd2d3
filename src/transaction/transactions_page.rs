//! Defines the route handler for the page that displays the live list of
//! recent transactions.
//!
//! The list itself is rendered by the recent transactions fragment. This page
//! fetches the fragment when it loads and listens to the change feed over
//! server-sent events, refetching the whole fragment whenever a change is
//! announced.

use axum::response::{IntoResponse, Response};
use maud::{PreEscaped, html};

use crate::{
    endpoints,
    html::{HeadElement, LINK_STYLE, PAGE_CONTAINER_STYLE, base, loading_spinner},
    navigation::NavBar,
};

/// Script that forwards change feed events to htmx as `transactions-changed`
/// events on the body, which the list container uses as its refetch trigger.
fn change_feed_listener() -> HeadElement {
    HeadElement::ScriptSource(PreEscaped(format!(
        r#"
        const changeFeed = new EventSource("{events}");
        changeFeed.onmessage = () => document.body.dispatchEvent(new Event("transactions-changed"));
        window.addEventListener("beforeunload", () => changeFeed.close());
        "#,
        events = endpoints::EVENTS
    )))
}

/// Renders the transactions page.
pub async fn get_transactions_page() -> Response {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex w-full max-w-3xl items-center justify-between"
            {
                h1 class="text-xl font-bold" { "Transactions" }

                a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE) tabindex="0"
                {
                    "New Transaction"
                }
            }

            div
                id="recent-transactions"
                class="w-full max-w-3xl"
                hx-get=(endpoints::RECENT_TRANSACTIONS_PARTIAL)
                hx-trigger="load, transactions-changed from:body"
                hx-swap="innerHTML"
            {
                (loading_spinner())
            }
        }
    };

    base("Transactions", &[change_feed_listener()], &content).into_response()
}
