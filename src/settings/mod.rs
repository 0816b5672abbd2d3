//! Settings module
//!
//! User preferences stored as key-value pairs behind the [SettingsStore]
//! trait, plus the page for editing them.

mod settings_page;
mod store;

pub use settings_page::{SettingsState, get_settings_page, save_settings};
pub use store::{
    InMemorySettingsStore, SettingsStore, SqliteSettingsStore, THEME_KEY, create_settings_table,
};
