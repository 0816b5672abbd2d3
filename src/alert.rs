//! Alert messages for displaying success and error notifications to users.
//!
//! Alerts are rendered as out-of-band swaps into the `#alert-container` div
//! that the base page layout places at the bottom of every page, so any htmx
//! response can attach one.

use maud::{Markup, html};

/// A dismissable notification shown at the bottom of the page.
pub enum Alert {
    Success { message: String, details: String },
    Error { message: String, details: String },
}

impl Alert {
    /// Create a new success alert.
    pub fn success(message: &str, details: &str) -> Self {
        Self::Success {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Create a new error alert.
    pub fn error(message: &str, details: &str) -> Self {
        Self::Error {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    pub fn into_html(self) -> Markup {
        let (message, details, container_style, icon) = match self {
            Alert::Success { message, details } => (
                message,
                details,
                "flex items-start p-4 mb-4 rounded-lg shadow-lg border \
                text-green-800 border-green-300 bg-green-50 dark:bg-gray-800 \
                dark:text-green-400 dark:border-green-800",
                "✓",
            ),
            Alert::Error { message, details } => (
                message,
                details,
                "flex items-start p-4 mb-4 rounded-lg shadow-lg border \
                text-red-800 border-red-300 bg-red-50 dark:bg-gray-800 \
                dark:text-red-400 dark:border-red-800",
                "!",
            ),
        };

        html! {
            div id="alert-container" hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div class=(container_style) role="alert"
                {
                    span class="shrink-0 inline-flex items-center justify-center w-5 h-5 me-3 font-bold" { (icon) }

                    div class="flex-1 text-sm"
                    {
                        p class="font-medium" { (message) }

                        @if !details.is_empty()
                        {
                            p class="mt-1" { (details) }
                        }
                    }

                    button
                        type="button"
                        class="ms-3 -mx-1.5 -my-1.5 rounded-lg p-1.5 inline-flex items-center justify-center h-8 w-8 hover:bg-gray-200 dark:hover:bg-gray-700"
                        aria-label="Close"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "✕"
                    }
                }
            }
        }
    }
}
