//! The settings page and the endpoint for saving preferences.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base,
    },
    navigation::NavBar,
};

use super::store::{DEFAULT_THEME, SettingsStore, SqliteSettingsStore, THEME_KEY, THEMES};

/// The state needed for reading and saving settings.
#[derive(Debug, Clone)]
pub struct SettingsState {
    /// The database connection backing the settings store.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SettingsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

impl SettingsState {
    fn store(&self) -> SqliteSettingsStore {
        SqliteSettingsStore {
            db_connection: self.db_connection.clone(),
        }
    }
}

/// The form data for saving settings.
#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    /// The selected theme, one of `light`, `dark` or `system`.
    pub theme: String,
}

fn settings_form(current_theme: &str) -> Markup {
    html! {
        form hx-post=(endpoints::SETTINGS_API) hx-swap="none" class="w-full max-w-md space-y-4"
        {
            div
            {
                label for="theme" class=(FORM_LABEL_STYLE) { "Theme" }

                select id="theme" name="theme" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for theme in THEMES
                    {
                        option value=(theme) selected[theme == current_theme] { (theme) }
                    }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
        }
    }
}

/// Display the settings page.
pub async fn get_settings_page(State(state): State<SettingsState>) -> Response {
    let current_theme = match state.store().get(THEME_KEY) {
        Ok(Some(theme)) => theme,
        // An unprovisioned store reads as the default theme.
        Ok(None) | Err(Error::NotProvisioned) => DEFAULT_THEME.to_owned(),
        Err(error) => {
            tracing::error!("could not read theme setting: {error}");
            return error.into_response();
        }
    };

    let content = html! {
        (NavBar::new(endpoints::SETTINGS_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-4"
            {
                h1 class="text-xl font-bold" { "Settings" }

                (settings_form(&current_theme))
            }
        }
    };

    base("Settings", &[], &content).into_response()
}

/// Save the submitted settings and confirm with an alert.
pub async fn save_settings(
    State(state): State<SettingsState>,
    Form(form): Form<SettingsForm>,
) -> Response {
    if !THEMES.contains(&form.theme.as_str()) {
        return Error::SettingsSaveError.into_alert_response();
    }

    match state.store().set(THEME_KEY, &form.theme) {
        Ok(()) => Alert::success("Settings saved", "").into_html().into_response(),
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod settings_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Form, extract::State};
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        db::initialize,
        settings::store::{SettingsStore, THEME_KEY},
        test_utils::{assert_status_ok, assert_valid_html, parse_html_document},
    };

    use super::{SettingsForm, SettingsState, get_settings_page, save_settings};

    fn get_test_state() -> SettingsState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        SettingsState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn settings_page_defaults_to_system_theme() {
        let state = get_test_state();

        let response = get_settings_page(State(state)).await;
        assert_status_ok(&response);

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let selector = Selector::parse("select#theme option[selected]").unwrap();
        let selected = document
            .select(&selector)
            .map(|option| option.text().collect::<String>())
            .collect::<Vec<_>>();

        assert_eq!(selected, vec!["system".to_owned()]);
    }

    #[tokio::test]
    async fn settings_page_shows_saved_theme() {
        let state = get_test_state();
        state.store().set(THEME_KEY, "dark").unwrap();

        let response = get_settings_page(State(state)).await;
        let document = parse_html_document(response).await;

        let selector = Selector::parse("select#theme option[selected]").unwrap();
        let selected = document
            .select(&selector)
            .map(|option| option.text().collect::<String>())
            .collect::<Vec<_>>();

        assert_eq!(selected, vec!["dark".to_owned()]);
    }

    #[tokio::test]
    async fn save_settings_persists_theme_and_confirms() {
        let state = get_test_state();

        let response = save_settings(
            State(state.clone()),
            Form(SettingsForm {
                theme: "light".to_owned(),
            }),
        )
        .await;
        assert_status_ok(&response);

        let document = parse_html_document(response).await;
        let text = document.root_element().text().collect::<String>();
        assert!(text.contains("Settings saved"), "got {text:?}");

        assert_eq!(
            state.store().get(THEME_KEY).unwrap(),
            Some("light".to_owned())
        );
    }

    #[tokio::test]
    async fn save_settings_rejects_unknown_theme() {
        let state = get_test_state();

        let response = save_settings(
            State(state.clone()),
            Form(SettingsForm {
                theme: "solarized".to_owned(),
            }),
        )
        .await;

        assert_eq!(
            response.status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(state.store().get(THEME_KEY).unwrap(), None);
    }
}
