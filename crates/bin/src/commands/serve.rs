//! Serve command - runs the currex web server.

use std::{sync::Arc, time::Duration};

use axum::{
    Form, Router,
    extract::{FromRequestParts, Query, State},
    http::request::Parts,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use tokio::signal::unix::{SignalKind, signal};
use tower_cookies::{CookieManagerLayer, Cookies};
use tracing_subscriber::EnvFilter;

use currex::{
    AuthService, CredentialStore, Error, Session, SessionManager,
    currency::{Conversion, CurrencyCode, parse_amount},
    session::SessionError,
};

use crate::backend::{backend_label, create_store};
use crate::cli::ServeArgs;
use crate::cookies::{CookieSettings, DEV_SECRET, derive_key};
use crate::flash::Flash;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    auth: AuthService,
    cookies: CookieSettings,
}

impl AppState {
    pub fn new(auth: AuthService, cookies: CookieSettings) -> Self {
        Self { auth, cookies }
    }

    fn store(&self) -> &Arc<dyn CredentialStore> {
        self.auth.store()
    }
}

/// Credentials posted by the login and registration forms.
///
/// Missing fields deserialize as empty so they are rejected by the auth
/// service rather than by the extractor.
#[derive(Deserialize)]
struct CredentialsForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// A missing amount converts zero.
#[derive(Deserialize)]
struct ConvertForm {
    #[serde(default = "zero_amount")]
    amount: String,
    #[serde(default)]
    from_currency: String,
    #[serde(default)]
    to_currency: String,
}

fn zero_amount() -> String {
    "0".to_string()
}

#[derive(Deserialize)]
struct LoginQuery {
    registered: Option<String>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_root_request))
        .route("/health", get(handle_health_endpoint))
        .route("/login", get(handle_login_page).post(handle_login_submit))
        .route(
            "/register",
            get(handle_register_page).post(handle_register_submit),
        )
        .route(
            "/converter",
            get(handle_converter_page).post(handle_converter_submit),
        )
        .route("/logout", get(handle_logout))
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

/// Run the currex server
pub async fn run(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("currex=info".parse()?))
        .init();

    let secret = match args.secret_key.as_deref() {
        Some(secret) if !secret.is_empty() => secret.to_string(),
        _ => {
            tracing::warn!(
                "CURREX_SECRET_KEY is not set, signing cookies with the development secret"
            );
            DEV_SECRET.to_string()
        }
    };

    let store = create_store(&args.backend_config).await?;
    let session_ttl = Duration::from_secs(args.session_ttl_secs);
    let auth = AuthService::new(store.clone(), SessionManager::with_ttl(session_ttl));

    let app_state = AppState::new(
        auth,
        CookieSettings {
            key: derive_key(&secret),
            secure: args.secure_cookies,
            session_ttl,
        },
    );
    let app = router(app_state);

    // Bind server
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    // Print startup message
    println!("currex server started");
    println!();
    println!("Web Interface: http://localhost:{}", local_addr.port());
    println!("Storage:       {}", backend_label(&args.backend_config));
    println!();
    println!("Available endpoints:");
    println!("  GET  /             - Redirect to login or converter");
    println!("  GET  /register     - Registration page");
    println!("  POST /register     - Registration submission");
    println!("  GET  /login        - Login page");
    println!("  POST /login        - Login submission");
    println!("  GET  /converter    - Currency converter (requires login)");
    println!("  POST /converter    - Conversion submission (requires login)");
    println!("  GET  /logout       - End the session");
    println!("  GET  /health       - Health check");
    println!();
    println!("Press Ctrl+C to shutdown");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM, initiating graceful shutdown..."),
                _ = sigint.recv() => tracing::info!("Received SIGINT, initiating graceful shutdown..."),
            }

            match store.flush().await {
                Ok(()) => tracing::info!("Credential store flushed"),
                Err(e) => {
                    tracing::error!("Failed to flush credential store: {e}");
                    eprintln!("Failed to flush credential store: {e}");
                }
            }
        })
        .await?;

    println!("Server shut down");
    Ok(())
}

// ============================================================================
// Session Resolution
// ============================================================================

/// Look up the session named by the request's signed cookie.
///
/// A missing, tampered or revoked cookie is `Invalid`; a stale one is
/// `Expired` and gets cleared.
async fn resolve_session(state: &AppState, cookies: &Cookies) -> Result<Session, SessionError> {
    let token = state
        .cookies
        .session_token(cookies)
        .ok_or(SessionError::Invalid)?;

    match state.auth.current_user(&token).await {
        Ok(session) => Ok(session),
        Err(Error::Session(e)) => {
            state.cookies.clear_session(cookies);
            Err(e)
        }
        Err(e) => {
            tracing::error!("Session lookup failed: {e}");
            Err(SessionError::Invalid)
        }
    }
}

/// An authenticated user, or a redirect to the login page.
struct CurrentUser(Session);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match resolve_session(state, &cookies).await {
            Ok(session) => Ok(CurrentUser(session)),
            Err(e) => {
                let flash = match e {
                    SessionError::Expired => Flash::SessionExpired,
                    SessionError::Invalid => Flash::LoginFirst,
                };
                state.cookies.set_flash(&cookies, flash);
                Err(Redirect::to("/login").into_response())
            }
        }
    }
}

fn redirect_with(state: &AppState, cookies: &Cookies, flash: Flash, to: &str) -> Response {
    state.cookies.set_flash(cookies, flash);
    Redirect::to(to).into_response()
}

// ============================================================================
// Authentication Handlers
// ============================================================================

/// Handler for GET / - Root redirect
async fn handle_root_request(State(state): State<AppState>, cookies: Cookies) -> Redirect {
    if resolve_session(&state, &cookies).await.is_ok() {
        return Redirect::to("/converter");
    }
    Redirect::to("/login")
}

/// Handler for GET /register - Show registration page
async fn handle_register_page(State(state): State<AppState>, cookies: Cookies) -> Response {
    if resolve_session(&state, &cookies).await.is_ok() {
        return Redirect::to("/converter").into_response();
    }

    let flash = state.cookies.take_flash(&cookies);
    Html(crate::templates::register_page(flash)).into_response()
}

/// Handler for POST /register - Process registration
async fn handle_register_submit(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<CredentialsForm>,
) -> Response {
    match state.auth.register(&form.username, &form.password).await {
        Ok(_) => Redirect::to("/login?registered=1").into_response(),
        Err(e) if e.is_conflict() => {
            redirect_with(&state, &cookies, Flash::UsernameTaken, "/register")
        }
        Err(e) if e.is_user_error() => {
            redirect_with(&state, &cookies, Flash::FillBoth, "/register")
        }
        Err(e) => {
            tracing::error!("Registration failed: {e}");
            redirect_with(&state, &cookies, Flash::ServerError, "/register")
        }
    }
}

/// Handler for GET /login - Show login page
async fn handle_login_page(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(query): Query<LoginQuery>,
) -> Response {
    if resolve_session(&state, &cookies).await.is_ok() {
        return Redirect::to("/converter").into_response();
    }

    let flash = state.cookies.take_flash(&cookies).or_else(|| {
        (query.registered.as_deref() == Some("1")).then_some(Flash::Registered)
    });
    Html(crate::templates::login_page(flash)).into_response()
}

/// Handler for POST /login - Process login
async fn handle_login_submit(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<CredentialsForm>,
) -> Response {
    if form.username.trim().is_empty() || form.password.is_empty() {
        return redirect_with(&state, &cookies, Flash::EnterBoth, "/login");
    }

    match state.auth.login(&form.username, &form.password).await {
        Ok(token) => {
            state.cookies.set_session(&cookies, token);
            Redirect::to("/converter").into_response()
        }
        Err(e) if e.is_user_error() => {
            redirect_with(&state, &cookies, Flash::InvalidLogin, "/login")
        }
        Err(e) => {
            tracing::error!("Login failed: {e}");
            redirect_with(&state, &cookies, Flash::ServerError, "/login")
        }
    }
}

/// Handler for GET /logout - Logout and destroy session
async fn handle_logout(State(state): State<AppState>, cookies: Cookies) -> Response {
    if let Some(token) = state.cookies.session_token(&cookies) {
        state.auth.logout(&token).await;
    }
    state.cookies.clear_session(&cookies);
    redirect_with(&state, &cookies, Flash::LoggedOut, "/login")
}

// ============================================================================
// Converter Handlers
// ============================================================================

/// Handler for GET /converter - Show the converter form
async fn handle_converter_page(
    State(state): State<AppState>,
    cookies: Cookies,
    CurrentUser(session): CurrentUser,
) -> Html<String> {
    let flash = state.cookies.take_flash(&cookies);
    Html(crate::templates::converter_page(
        &session.username,
        None,
        flash,
    ))
}

/// Handler for POST /converter - Convert and show the result
async fn handle_converter_submit(
    State(state): State<AppState>,
    cookies: Cookies,
    CurrentUser(session): CurrentUser,
    Form(form): Form<ConvertForm>,
) -> Response {
    let amount = match parse_amount(&form.amount) {
        Ok(amount) => amount,
        Err(_) => {
            return Html(crate::templates::converter_page(
                &session.username,
                None,
                Some(Flash::NotANumber),
            ))
            .into_response();
        }
    };

    let codes = form
        .from_currency
        .parse::<CurrencyCode>()
        .and_then(|from| Ok((from, form.to_currency.parse::<CurrencyCode>()?)));
    let (from, to) = match codes {
        Ok(codes) => codes,
        Err(_) => return redirect_with(&state, &cookies, Flash::InvalidCurrency, "/converter"),
    };

    let conversion = Conversion::new(amount, from, to);
    tracing::debug!(user_id = session.user_id, %conversion, "Converted");
    Html(crate::templates::converter_page(
        &session.username,
        Some(&conversion.to_string()),
        None,
    ))
    .into_response()
}

// ============================================================================
// Health Handler
// ============================================================================

/// Health check response
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    backend: &'static str,
}

/// Handler for GET /health - Health check endpoint
async fn handle_health_endpoint(State(state): State<AppState>) -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "healthy",
        backend: state.store().kind(),
    })
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use currex::store::InMemory;
    use tower::ServiceExt;

    use super::*;

    fn test_state() -> AppState {
        let store: Arc<dyn CredentialStore> = Arc::new(InMemory::new());
        AppState::new(
            AuthService::new(store, SessionManager::new()),
            CookieSettings {
                key: derive_key("test-secret"),
                secure: false,
                session_ttl: Duration::from_secs(3600),
            },
        )
    }

    /// Collect `name=value` pairs from every Set-Cookie header.
    fn set_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .map(str::to_string)
            .collect()
    }

    fn session_cookie(response: &Response) -> Option<String> {
        set_cookies(response)
            .into_iter()
            .find(|c| c.starts_with("currex_session=") && c.len() > "currex_session=".len())
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn post_form(app: &Router, uri: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        app.clone()
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }

    async fn get_page(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        app.clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    /// Register and log in, returning the session cookie pair.
    async fn sign_up(app: &Router, username: &str, password: &str) -> String {
        let body = format!("username={username}&password={password}");
        let response = post_form(app, "/register", &body, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login?registered=1");

        let response = post_form(app, "/login", &body, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/converter");
        session_cookie(&response).expect("login sets a session cookie")
    }

    #[tokio::test]
    async fn register_login_convert() {
        let app = router(test_state());
        let cookie = sign_up(&app, "alice", "s3cret").await;

        let response = get_page(&app, "/converter", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("alice"));

        let response = post_form(
            &app,
            "/converter",
            "amount=100&from_currency=USD&to_currency=EUR",
            Some(&cookie),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("100.00 USD = 92.00 EUR"));
    }

    #[tokio::test]
    async fn converter_requires_login() {
        let app = router(test_state());
        let response = get_page(&app, "/converter", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
        assert!(
            set_cookies(&response)
                .iter()
                .any(|c| c.starts_with("currex_flash="))
        );
    }

    #[tokio::test]
    async fn logout_then_converter_redirects_to_login() {
        let app = router(test_state());
        let cookie = sign_up(&app, "bob", "pw").await;

        let response = get_page(&app, "/logout", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");

        // Replaying the old cookie must not work once the session is revoked
        let response = get_page(&app, "/converter", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn duplicate_registration_goes_back_to_register() {
        let app = router(test_state());
        sign_up(&app, "carol", "pw").await;

        let response = post_form(&app, "/register", "username=carol&password=other", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/register");
    }

    #[tokio::test]
    async fn empty_registration_fields_are_rejected() {
        let app = router(test_state());
        let response = post_form(&app, "/register", "username=%20%20&password=pw", None).await;
        assert_eq!(location(&response), "/register");

        let response = post_form(&app, "/register", "username=dave", None).await;
        assert_eq!(location(&response), "/register");
    }

    #[tokio::test]
    async fn wrong_password_redirects_to_login() {
        let app = router(test_state());
        sign_up(&app, "erin", "right").await;

        let response = post_form(&app, "/login", "username=erin&password=wrong", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
        assert!(session_cookie(&response).is_none());
    }

    #[tokio::test]
    async fn tampered_cookie_is_no_session() {
        let app = router(test_state());
        let cookie = sign_up(&app, "frank", "pw").await;

        let (name, value) = cookie.split_once('=').unwrap();
        let flipped = if value.starts_with('a') { 'b' } else { 'a' };
        let tampered = format!("{name}={flipped}{}", &value[1..]);

        let response = get_page(&app, "/converter", Some(&tampered)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn bad_amount_renders_inline_and_bad_currency_redirects() {
        let app = router(test_state());
        let cookie = sign_up(&app, "gina", "pw").await;

        let response = post_form(
            &app,
            "/converter",
            "amount=lots&from_currency=USD&to_currency=EUR",
            Some(&cookie),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Amount must be a number."));

        let response = post_form(
            &app,
            "/converter",
            "amount=5&from_currency=USD&to_currency=XYZ",
            Some(&cookie),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/converter");
    }

    #[tokio::test]
    async fn currency_codes_must_match_exactly() {
        let app = router(test_state());
        let cookie = sign_up(&app, "ivan", "pw").await;

        for body in [
            "amount=1&from_currency=usd&to_currency=EUR",
            "amount=1&from_currency=USD&to_currency=%20EUR%20",
        ] {
            let response = post_form(&app, "/converter", body, Some(&cookie)).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{body}");
            assert_eq!(location(&response), "/converter", "{body}");
        }
    }

    #[tokio::test]
    async fn missing_amount_converts_zero() {
        let app = router(test_state());
        let cookie = sign_up(&app, "judy", "pw").await;

        let response = post_form(
            &app,
            "/converter",
            "from_currency=USD&to_currency=EUR",
            Some(&cookie),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("0.00 USD = 0.00 EUR"));
    }

    #[tokio::test]
    async fn logged_in_users_skip_the_login_page() {
        let app = router(test_state());
        let cookie = sign_up(&app, "hank", "pw").await;

        for uri in ["/", "/login", "/register"] {
            let response = get_page(&app, uri, Some(&cookie)).await;
            assert_eq!(location(&response), "/converter", "{uri}");
        }
        let response = get_page(&app, "/", None).await;
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn registered_flag_shows_success_message() {
        let app = router(test_state());
        let response = get_page(&app, "/login?registered=1", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            body_text(response)
                .await
                .contains("Successfully registered! Please login.")
        );
    }

    #[tokio::test]
    async fn health_reports_backend() {
        let app = router(test_state());
        let response = get_page(&app, "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["backend"], "inmemory");
    }
}
