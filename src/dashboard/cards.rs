//! Card and chart components for the dashboard.
//!
//! The bars are plain divs whose widths come from the presentation
//! functions, there is no charting library involved.

use maud::{Markup, html};

use crate::{
    dashboard::{
        aggregation::{CategoryTotals, MonthlyBucket},
        presentation::{bar_width_percent, palette_color, share_percent},
    },
    html::{TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency},
};

const CARD_STYLE: &str = "bg-white dark:bg-gray-800 border border-gray-200 \
    dark:border-gray-700 rounded-lg p-4 shadow-md";

/// Renders the headline cards with the overall totals.
pub(super) fn summary_cards(income_total: f64, expense_total: f64) -> Markup {
    let balance = income_total - expense_total;
    let savings_rate = if income_total > 0.0 {
        balance / income_total * 100.0
    } else {
        0.0
    };

    html! {
        section class="grid grid-cols-2 md:grid-cols-4 gap-4 w-full" {
            (summary_card("Income", format_currency(income_total), "text-green-500"))
            (summary_card("Expenses", format_currency(expense_total), "text-red-500"))
            (summary_card(
                "Balance",
                format_currency(balance),
                if balance >= 0.0 { "text-green-500" } else { "text-red-500" },
            ))
            (summary_card("Savings Rate", format!("{savings_rate:.1}%"), "text-blue-500"))
        }
    }
}

fn summary_card(title: &str, value: String, value_style: &str) -> Markup {
    html! {
        div class=(CARD_STYLE) {
            h3 class="text-sm text-gray-600 dark:text-gray-400" { (title) }
            p class={ "text-xl font-semibold " (value_style) } { (value) }
        }
    }
}

/// Renders one category breakdown card with a bar per bucket.
///
/// Bar widths are relative to the largest bucket, the percentage labels are
/// each bucket's share of the grand total over all matching records.
pub(super) fn category_breakdown_card(
    title: &str,
    totals: &CategoryTotals,
    palette: &'static [&'static str],
) -> Markup {
    let max_total = totals
        .buckets
        .first()
        .map(|bucket| bucket.total)
        .unwrap_or(0.0);

    html! {
        section class=(CARD_STYLE) {
            h3 class="text-lg font-semibold mb-4" { (title) }

            @if totals.buckets.is_empty() {
                p class="text-gray-500 dark:text-gray-400" { "No data yet." }
            } @else {
                ul class="space-y-3" {
                    @for (index, bucket) in totals.buckets.iter().enumerate() {
                        li {
                            div class="flex justify-between text-sm mb-1" {
                                span {
                                    span
                                        class="inline-block w-2 h-2 rounded-full mr-2"
                                        style=(format!("background-color: {}", palette_color(palette, index))) {}
                                    (bucket.label)
                                }
                                span {
                                    (format_currency(bucket.total))
                                    " ("
                                    (format!("{:.1}%", share_percent(bucket.total, totals.grand_total)))
                                    ")"
                                }
                            }
                            div class="h-2 rounded bg-gray-200 dark:bg-gray-700" {
                                div
                                    class="h-2 rounded"
                                    style=(format!(
                                        "width: {:.2}%; background-color: {}",
                                        bar_width_percent(bucket.total, max_total),
                                        palette_color(palette, index),
                                    )) {}
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Renders the income/expense/net table for the last months.
pub(super) fn monthly_summary_table(buckets: &[MonthlyBucket]) -> Markup {
    html! {
        section class=(CARD_STYLE) {
            h3 class="text-lg font-semibold mb-4" { "Monthly Summary" }

            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400" {
                thead class=(TABLE_HEADER_STYLE) {
                    tr {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Month" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Income" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Expenses" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Net" }
                    }
                }

                tbody {
                    @for bucket in buckets {
                        tr class=(TABLE_ROW_STYLE) {
                            td class=(TABLE_CELL_STYLE) { (bucket.month) }
                            td class=(TABLE_CELL_STYLE) { (format_currency(bucket.income)) }
                            td class=(TABLE_CELL_STYLE) { (format_currency(bucket.expense)) }
                            td class={
                                (TABLE_CELL_STYLE) " "
                                (if bucket.net >= 0.0 { "text-green-500" } else { "text-red-500" })
                            } {
                                (format_currency(bucket.net))
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod cards_tests {
    use scraper::{Html, Selector};

    use crate::dashboard::{
        aggregation::{AggregateBucket, CategoryTotals},
        presentation::EXPENSE_PALETTE,
    };

    use super::{category_breakdown_card, summary_cards};

    #[test]
    fn summary_cards_show_savings_rate() {
        let markup = summary_cards(100.0, 40.0);
        let fragment = Html::parse_fragment(&markup.into_string());
        let text = fragment.root_element().text().collect::<String>();

        assert!(text.contains("$100.00"), "income total missing: {text}");
        assert!(text.contains("$40.00"), "expense total missing: {text}");
        assert!(text.contains("$60.00"), "balance missing: {text}");
        assert!(text.contains("60.0%"), "savings rate missing: {text}");
    }

    #[test]
    fn summary_cards_with_no_income_show_zero_savings_rate() {
        let markup = summary_cards(0.0, 40.0);
        let text = Html::parse_fragment(&markup.into_string())
            .root_element()
            .text()
            .collect::<String>();

        assert!(text.contains("0.0%"), "savings rate should be 0: {text}");
    }

    #[test]
    fn breakdown_bars_are_relative_to_largest_bucket() {
        let totals = CategoryTotals {
            buckets: vec![
                AggregateBucket {
                    label: "Food".to_owned(),
                    total: 60.0,
                },
                AggregateBucket {
                    label: "Transport".to_owned(),
                    total: 30.0,
                },
            ],
            grand_total: 90.0,
        };

        let markup = category_breakdown_card("Expenses by Category", &totals, &EXPENSE_PALETTE);
        let fragment = Html::parse_fragment(&markup.into_string());

        let bar_selector = Selector::parse("li div div[style]").unwrap();
        let widths = fragment
            .select(&bar_selector)
            .filter_map(|bar| bar.value().attr("style"))
            .collect::<Vec<_>>();

        assert_eq!(widths.len(), 2, "want 2 bars, got {widths:?}");
        assert!(widths[0].contains("width: 100.00%"), "got {:?}", widths[0]);
        assert!(widths[1].contains("width: 50.00%"), "got {:?}", widths[1]);
        assert!(
            widths[0].contains("#EF4444") && widths[1].contains("#F97316"),
            "colors should be assigned by position, got {widths:?}"
        );
    }

    #[test]
    fn breakdown_without_buckets_shows_empty_state() {
        let totals = CategoryTotals {
            buckets: Vec::new(),
            grand_total: 0.0,
        };

        let markup = category_breakdown_card("Expenses by Category", &totals, &EXPENSE_PALETTE);
        let text = Html::parse_fragment(&markup.into_string())
            .root_element()
            .text()
            .collect::<String>();

        assert!(text.contains("No data yet."), "got {text:?}");
    }
}
