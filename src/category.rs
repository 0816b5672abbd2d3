//! The advisory category catalog.
//!
//! Categories on a transaction are free text. The catalog below only feeds
//! the suggestion lists on the new transaction form and the icons shown next
//! to transactions, it never restricts what a user may type.

/// Suggested categories for income transactions.
pub const INCOME_CATEGORIES: [&str; 6] = [
    "Salary",
    "Freelance",
    "Investment",
    "Gift",
    "Bonus",
    "Other Income",
];

/// Suggested categories for expense transactions.
pub const EXPENSE_CATEGORIES: [&str; 11] = [
    "Groceries",
    "Food & Dining",
    "Transport",
    "Utilities",
    "Shopping",
    "Entertainment",
    "Health",
    "Education",
    "Subscriptions",
    "Insurance",
    "Other",
];

/// Get the emoji icon for `category`.
///
/// Matching is by case-insensitive substring so user-typed variants such as
/// "monthly salary" still get the salary icon. Unrecognized categories fall
/// back to a generic card icon.
pub fn category_icon(category: &str) -> &'static str {
    let category = category.to_lowercase();

    let icons = [
        ("salary", "💰"),
        ("freelance", "💼"),
        ("groceries", "🛒"),
        ("entertainment", "🎬"),
        ("transport", "🚗"),
        ("utilities", "💡"),
        ("dining", "🍽️"),
        ("shopping", "🛍️"),
        ("health", "🏥"),
        ("education", "📚"),
    ];

    for (keyword, icon) in icons {
        if category.contains(keyword) {
            return icon;
        }
    }

    "💳"
}
