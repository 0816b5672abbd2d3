//! The middleware that guards routes behind a valid auth cookie.
//!
//! Guarded handlers receive the authenticated [UserId](crate::auth::UserId)
//! as a request extension. Requests without a valid cookie are sent to the
//! log-in page: full page loads get a plain redirect, htmx requests get an
//! `HX-Redirect` header so the browser swaps the whole page.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::Duration;

use crate::{
    AppState,
    auth::{
        build_log_in_redirect_url,
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::build_log_in_redirect_url_from_target,
    },
    endpoints,
    timezone::get_local_offset,
};

/// How much time a request adds to the auth cookie's expiry.
const SESSION_EXTENSION: Duration = Duration::minutes(5);

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// The log-in URL to send an unauthenticated client to, preserving the page
/// it originally asked for where possible.
fn log_in_url_for(request: &Request) -> String {
    build_log_in_redirect_url(request).unwrap_or_else(|| {
        if request.uri().path().starts_with("/api") {
            tracing::warn!(
                "Missing or invalid HTMX headers for /api request. Falling back to dashboard."
            );
        } else {
            tracing::warn!("Invalid redirect URL from request URI. Falling back to dashboard.");
        }

        build_log_in_redirect_url_from_target(endpoints::DASHBOARD_VIEW)
            .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
    })
}

/// Copy the jar's set-cookie headers onto the response.
fn with_updated_cookies(response: Response, jar: PrivateCookieJar) -> Response {
    let (mut parts, body) = response.into_parts();
    let jar_response = jar.into_response();

    for (name, value) in jar_response.headers() {
        if name == SET_COOKIE {
            parts.headers.append(name, value.to_owned());
        }
    }

    Response::from_parts(parts, body)
}

#[inline]
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    get_redirect: impl Fn(&str) -> Response,
) -> Response {
    let log_in_url = log_in_url_for(&request);

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Error getting local timezone. Redirecting to log in page.");
        return get_redirect(&log_in_url);
    };

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Error getting cookie jar: {error:?}. Redirecting to log in page.");
            return get_redirect(&log_in_url);
        }
    };

    let Ok(token) = get_token_from_cookies(&jar) else {
        return get_redirect(&log_in_url);
    };

    parts.extensions.insert(token.user_id);
    let response = next.run(Request::from_parts(parts, body)).await;

    // Sliding expiry: activity keeps the session alive.
    let jar = match extend_auth_cookie_duration_if_needed(jar.clone(), SESSION_EXTENSION, local_offset)
    {
        Ok(updated_jar) => updated_jar,
        Err(error) => {
            tracing::error!("Error extending cookie duration: {error:?}. Rolling back cookie jar.");
            jar
        }
    };

    with_updated_cookies(response, jar)
}

/// Auth guard for full page loads.
///
/// Requests without a valid auth cookie get a 303 redirect to the log-in
/// page. Handlers behind the guard can take
/// `Extension(user_id): Extension<UserId>` to receive the authenticated user.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, |redirect_url| {
        Redirect::to(redirect_url).into_response()
    })
    .await
}

/// Auth guard for htmx-driven API routes.
///
/// Behaves like [auth_guard], but failures respond with 200 plus an
/// `HX-Redirect` header because htmx ignores the location of 3xx responses.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, |redirect_url| {
        (HxRedirect(redirect_url.to_owned()), StatusCode::OK).into_response()
    })
    .await
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{
        Router,
        extract::State,
        middleware,
        response::Html,
        routing::{get, post},
    };
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key, SameSite},
    };
    use axum_test::TestServer;
    use sha2::Digest;
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error,
        auth::{
            AuthState, COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, UserId, auth_guard, auth_guard_hx,
            set_auth_cookie,
        },
        endpoints,
        timezone::get_local_offset,
    };

    const LOG_IN_ROUTE: &str = "/log_in";
    const PROTECTED_ROUTE: &str = "/protected";
    const API_ROUTE: &str = "/api/protected";

    async fn protected_handler() -> Html<&'static str> {
        Html("<h1>Hello, World!</h1>")
    }

    async fn stub_log_in_route(
        State(state): State<AuthState>,
        jar: PrivateCookieJar,
    ) -> Result<PrivateCookieJar, Error> {
        let local_offset = get_local_offset(&state.local_timezone).unwrap();

        set_auth_cookie(jar, UserId::new(1), state.cookie_duration, local_offset)
    }

    /// A server with one page route behind [auth_guard], one API route
    /// behind [auth_guard_hx] and a stub log-in route that always succeeds.
    fn get_test_server(cookie_duration: Duration) -> TestServer {
        let state = AuthState {
            cookie_key: Key::from(&sha2::Sha512::digest("nafstenoas")),
            cookie_duration,
            local_timezone: "Etc/UTC".to_owned(),
        };

        let pages = Router::new()
            .route(PROTECTED_ROUTE, get(protected_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));
        let api = Router::new()
            .route(API_ROUTE, get(protected_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx));

        let app = pages
            .merge(api)
            .route(LOG_IN_ROUTE, post(stub_log_in_route))
            .with_state(state);

        TestServer::new(app)
    }

    fn log_in_location(target: &str) -> String {
        let query = serde_urlencoded::to_string([("redirect_url", target)]).unwrap();

        format!("{}?{}", endpoints::LOG_IN_VIEW, query)
    }

    #[track_caller]
    fn assert_date_time_close(left: OffsetDateTime, right: OffsetDateTime) {
        assert!(
            (left - right).abs() < Duration::seconds(1),
            "got date time {left:?}, want {right:?}"
        );
    }

    #[tokio::test]
    async fn valid_cookie_reaches_protected_route() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);
        let response = server.post(LOG_IN_ROUTE).await;

        response.assert_status_ok();
        let token_cookie = response.cookie(COOKIE_TOKEN);

        server
            .get(PROTECTED_ROUTE)
            .add_cookie(token_cookie)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn guard_reissues_token_cookie() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);
        let response = server.post(LOG_IN_ROUTE).await;

        response.assert_status_ok();
        let jar = response.cookies();

        let response = server.get(PROTECTED_ROUTE).add_cookies(jar).await;
        assert!(
            response.cookies().get(COOKIE_TOKEN).is_some(),
            "expected the guard to set a fresh token cookie"
        );
    }

    #[tokio::test]
    async fn guard_extends_cookie_expiry() {
        let server = get_test_server(Duration::seconds(5));
        let response = server.post(LOG_IN_ROUTE).await;

        response.assert_status_ok();
        let logged_in_at = OffsetDateTime::now_utc();
        let jar = response.cookies();
        assert_date_time_close(
            jar.get(COOKIE_TOKEN).unwrap().expires_datetime().unwrap(),
            logged_in_at + Duration::seconds(5),
        );

        let response = server.get(PROTECTED_ROUTE).add_cookies(jar).await;

        let auth_cookie = response.cookie(COOKIE_TOKEN);
        assert_date_time_close(
            auth_cookie.expires_datetime().unwrap(),
            logged_in_at + Duration::minutes(5),
        );
        assert_eq!(auth_cookie.secure(), Some(true));
        assert_eq!(auth_cookie.http_only(), Some(true));
        assert_eq!(auth_cookie.same_site(), Some(SameSite::Strict));
    }

    #[tokio::test]
    async fn missing_cookie_redirects_to_log_in() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);

        let response = server.get(PROTECTED_ROUTE).await;

        response.assert_status_see_other();
        assert_eq!(
            response.header("location"),
            log_in_location(PROTECTED_ROUTE)
        );
    }

    #[tokio::test]
    async fn invalid_cookie_redirects_to_log_in() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);

        let response = server
            .get(PROTECTED_ROUTE)
            .add_cookie(Cookie::build((COOKIE_TOKEN, "FOOBAR")).build())
            .await;

        response.assert_status_see_other();
        assert_eq!(
            response.header("location"),
            log_in_location(PROTECTED_ROUTE)
        );
    }

    #[tokio::test]
    async fn api_route_uses_hx_current_url_for_redirect() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);
        let current_url = "/transactions?page=2";

        let response = server
            .get(API_ROUTE)
            .add_header("HX-Request", "true")
            .add_header("HX-Current-URL", current_url)
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("hx-redirect"), log_in_location(current_url));
    }
}
