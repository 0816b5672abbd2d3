//! A key-value store for user preferences with a swappable backing store.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use rusqlite::{Connection, OptionalExtension};

use crate::Error;

/// The settings key holding the selected theme.
pub const THEME_KEY: &str = "theme";

/// The themes the settings page offers.
pub const THEMES: [&str; 3] = ["light", "dark", "system"];

/// The theme used when none has been saved yet.
pub const DEFAULT_THEME: &str = "system";

/// Reads and writes user preferences as string key-value pairs.
///
/// The backing store is injected so tests can use an in-memory
/// implementation while the app persists to SQLite.
pub trait SettingsStore {
    /// Get the value for `key`, or `None` if it was never set.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the backing store fails.
    fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Set `key` to `value`, overwriting any previous value.
    ///
    /// # Errors
    /// Returns an [Error::SettingsSaveError] if the value cannot be stored.
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;
}

/// Persists settings to the `settings` table.
#[derive(Debug, Clone)]
pub struct SqliteSettingsStore {
    /// The database connection for reading and writing settings.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl SettingsStore for SqliteSettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let connection = self
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        let value = connection
            .query_row(
                "SELECT value FROM settings WHERE key = :key",
                &[(":key", key)],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let connection = self
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        connection
            .execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                (key, value),
            )
            .map_err(|error| {
                tracing::error!("could not save setting {key}: {error}");
                Error::SettingsSaveError
            })?;

        Ok(())
    }
}

/// Keeps settings in memory. Intended for tests.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    values: Mutex<HashMap<String, String>>,
}

impl SettingsStore for InMemorySettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let values = self.values.lock().map_err(|_| Error::DatabaseLockError)?;

        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut values = self.values.lock().map_err(|_| Error::DatabaseLockError)?;

        values.insert(key.to_owned(), value.to_owned());

        Ok(())
    }
}

/// Create the settings table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_settings_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

#[cfg(test)]
mod settings_store_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::{Error, db::initialize};

    use super::{InMemorySettingsStore, SettingsStore, SqliteSettingsStore, THEME_KEY};

    fn get_sqlite_store() -> SqliteSettingsStore {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        SqliteSettingsStore {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[test]
    fn unset_key_reads_as_none() {
        let store = get_sqlite_store();

        assert_eq!(store.get(THEME_KEY), Ok(None));
    }

    #[test]
    fn set_then_get_round_trips() {
        let store = get_sqlite_store();

        store.set(THEME_KEY, "dark").unwrap();

        assert_eq!(store.get(THEME_KEY), Ok(Some("dark".to_owned())));
    }

    #[test]
    fn set_overwrites_previous_value() {
        let store = get_sqlite_store();

        store.set(THEME_KEY, "dark").unwrap();
        store.set(THEME_KEY, "light").unwrap();

        assert_eq!(store.get(THEME_KEY), Ok(Some("light".to_owned())));
    }

    #[test]
    fn set_fails_without_settings_table() {
        let store = SqliteSettingsStore {
            db_connection: Arc::new(Mutex::new(Connection::open_in_memory().unwrap())),
        };

        assert_eq!(
            store.set(THEME_KEY, "dark"),
            Err(Error::SettingsSaveError)
        );
    }

    #[test]
    fn in_memory_store_behaves_like_sqlite_store() {
        let store = InMemorySettingsStore::default();

        assert_eq!(store.get(THEME_KEY), Ok(None));

        store.set(THEME_KEY, "dark").unwrap();
        store.set(THEME_KEY, "system").unwrap();

        assert_eq!(store.get(THEME_KEY), Ok(Some("system".to_owned())));
    }
}
