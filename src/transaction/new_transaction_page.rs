//! Defines the route handler for the page with the form for recording a transaction.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{
    category::{EXPENSE_CATEGORIES, INCOME_CATEGORIES},
    endpoints,
    html::{
        FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base, dollar_input_styles, form_submit_button,
    },
    navigation::NavBar,
};

const CATEGORY_DATALIST_ID: &str = "category-suggestions";

fn transaction_form_fields() -> Markup {
    html! {
        fieldset class="space-y-2"
        {
            legend class=(FORM_LABEL_STYLE) { "Type" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                div class="flex items-center gap-3"
                {
                    input
                        name="kind"
                        id="transaction-kind-expense"
                        type="radio"
                        value="expense"
                        checked
                        required
                        tabindex="0"
                        class=(FORM_RADIO_INPUT_STYLE);

                    label
                        for="transaction-kind-expense"
                        class=(FORM_RADIO_LABEL_STYLE)
                    {
                        "Expense"
                    }
                }

                div class="flex items-center gap-3"
                {
                    input
                        name="kind"
                        id="transaction-kind-income"
                        type="radio"
                        value="income"
                        required
                        tabindex="0"
                        class=(FORM_RADIO_INPUT_STYLE);

                    label
                        for="transaction-kind-income"
                        class=(FORM_RADIO_LABEL_STYLE)
                    {
                        "Income"
                    }
                }
            }
        }

        div
        {
            label
                for="amount"
                class=(FORM_LABEL_STYLE)
            {
                "Amount"
            }

            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    placeholder="0.00"
                    min="0"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label
                for="category"
                class=(FORM_LABEL_STYLE)
            {
                "Category"
            }

            input
                name="category"
                id="category"
                type="text"
                placeholder="Groceries"
                list=(CATEGORY_DATALIST_ID)
                required
                class=(FORM_TEXT_INPUT_STYLE);

            datalist id=(CATEGORY_DATALIST_ID)
            {
                @for category in EXPENSE_CATEGORIES {
                    option value=(category) {}
                }
                @for category in INCOME_CATEGORIES {
                    option value=(category) {}
                }
            }
        }

        div
        {
            label
                for="description"
                class=(FORM_LABEL_STYLE)
            {
                "Description (optional)"
            }

            input
                name="description"
                id="description"
                type="text"
                placeholder="Description"
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

/// Renders the page for recording a transaction.
pub async fn get_new_transaction_page() -> Response {
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold" { "New Transaction" }

            form
                hx-post=(endpoints::TRANSACTIONS_API)
                hx-indicator="#indicator"
                hx-disabled-elt="#submit-button"
                class="space-y-4 w-full max-w-md"
            {
                (transaction_form_fields())

                (form_submit_button("Create"))
            }
        }
    };

    base("New Transaction", &[dollar_input_styles()], &content).into_response()
}
