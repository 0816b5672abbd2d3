//! The navigation bar shown on every page behind the auth guard.
//!
//! Desktop gets a top bar, small screens get a fixed bottom bar. Both render
//! the same links; the link matching the current page is highlighted.

use maud::{Markup, html};

use crate::endpoints;

/// Label and target of every navigation link, in display order.
const NAV_LINKS: &[(&str, &str)] = &[
    ("Dashboard", endpoints::DASHBOARD_VIEW),
    ("Transactions", endpoints::TRANSACTIONS_VIEW),
    ("Settings", endpoints::SETTINGS_VIEW),
    ("Log out", endpoints::LOG_OUT),
];

const TOP_LINK_ACTIVE_STYLE: &str = "block py-2 px-3 text-white bg-blue-700 rounded-sm \
    lg:bg-transparent lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500";

const TOP_LINK_STYLE: &str = "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100 \
    lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0 \
    dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700 \
    dark:hover:text-white lg:dark:hover:bg-transparent";

const BOTTOM_LINK_ACTIVE_STYLE: &str = "flex w-full min-w-0 items-center justify-center \
    rounded-lg bg-blue-50 px-2.5 py-2 text-xs font-semibold leading-tight text-blue-700 \
    shadow-sm sm:px-4 sm:text-sm dark:bg-blue-900/30 dark:text-blue-200";

const BOTTOM_LINK_STYLE: &str = "flex w-full min-w-0 items-center justify-center rounded-lg \
    px-2.5 py-2 text-xs font-semibold leading-tight text-gray-600 sm:px-4 sm:text-sm \
    hover:bg-blue-50/70 hover:text-blue-700 dark:text-gray-300 \
    dark:hover:bg-blue-900/20 dark:hover:text-blue-200";

/// The navigation bar, with the link matching `active_endpoint` highlighted.
pub struct NavBar<'a> {
    active_endpoint: &'a str,
}

impl<'a> NavBar<'a> {
    /// Create a navigation bar that highlights the link matching `active_endpoint`.
    pub fn new(active_endpoint: &'a str) -> Self {
        Self { active_endpoint }
    }

    fn is_current(&self, url: &str) -> bool {
        url == self.active_endpoint
    }

    /// Render the navigation bar.
    pub fn into_html(self) -> Markup {
        // Top bar template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a href="/" class="flex items-center space-x-3 rtl:space-x-reverse"
                    {
                        img src="/static/favicon-128x128.png" alt="Life-OS Logo" class="h-8";

                        span class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Life-OS"
                        }
                    }

                    div class="hidden w-full lg:block lg:w-auto"
                    {
                        ul
                            class="font-medium flex flex-col p-4 lg:p-0 mt-4
                            border border-gray-100 rounded bg-gray-50
                            lg:flex-row lg:space-x-8 rtl:space-x-reverse lg:mt-0
                            lg:border-0 lg:bg-white dark:bg-gray-800
                            lg:dark:bg-gray-900 dark:border-gray-700"
                        {
                            @for &(title, url) in NAV_LINKS {
                                li {
                                    a
                                        href=(url)
                                        class=(if self.is_current(url) { TOP_LINK_ACTIVE_STYLE } else { TOP_LINK_STYLE })
                                        aria-current=[self.is_current(url).then_some("page")]
                                    {
                                        (title)
                                    }
                                }
                            }
                        }
                    }
                }
            }

            nav class="fixed inset-x-0 bottom-0 z-40 lg:hidden"
            {
                div class="mx-auto max-w-screen-xl px-4 pb-4"
                {
                    div
                        class="rounded-xl border border-gray-200 bg-white/95
                        shadow-lg backdrop-blur dark:border-gray-700 dark:bg-gray-900/95"
                    {
                        ul
                            class="grid grid-cols-4 gap-2 px-4 py-3 text-xs font-semibold
                            text-gray-600 dark:text-gray-300"
                            aria-label="Primary"
                        {
                            @for &(title, url) in NAV_LINKS {
                                li class="min-w-0" {
                                    a
                                        href=(url)
                                        class=(if self.is_current(url) { BOTTOM_LINK_ACTIVE_STYLE } else { BOTTOM_LINK_STYLE })
                                        aria-current=[self.is_current(url).then_some("page")]
                                    {
                                        span class="truncate" { (title) }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        )
    }
}
