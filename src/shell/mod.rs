mod handlers;
mod template;

use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    auth::{self, AdminRequest, Session},
    error::AppError,
    state::AppState,
};

use template::{Notice, Page};

/// Session cookie name.
const SESSION_COOKIE: &str = "ts_session";

// ── Router ────────────────────────────────────────────────────────────────────

/// The full application router with state applied. Request bodies larger
/// than `max_upload_bytes` are rejected with 413.
pub fn app(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(|| async { StatusCode::OK }))
        .merge(router(state.clone()))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(get_root))
        .route("/login", get(get_login).post(post_login))
        .route("/signup", get(get_signup).post(post_signup));

    let admin = Router::new()
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/candidates", get(handlers::get_candidates))
        .route("/candidates/resume", get(handlers::get_resume))
        .route_layer(middleware::from_fn(require_admin));

    // require_auth wraps require_admin, so the session is in place first.
    let protected = Router::new()
        .route("/chat", get(handlers::get_chat).post(handlers::post_chat))
        .route(
            "/screening",
            get(handlers::get_screening).post(handlers::post_screening),
        )
        .route("/profile", get(handlers::get_profile))
        .route("/logout", post(post_logout))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new().merge(public).merge(protected)
}

// ── Auth middleware ───────────────────────────────────────────────────────────

async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if let Some(session) = current_session(&state, req.headers()).await {
        req.extensions_mut().insert(session);
        return next.run(req).await;
    }
    Redirect::to("/login").into_response()
}

async fn require_admin(req: Request, next: Next) -> Response {
    let is_admin = req
        .extensions()
        .get::<Session>()
        .is_some_and(|s| s.is_admin);
    if is_admin {
        next.run(req).await
    } else {
        AppError::Forbidden.into_response()
    }
}

async fn current_session(state: &AppState, headers: &HeaderMap) -> Option<Session> {
    let token = extract_session_cookie(headers)?;
    state.sessions.get(&token).await
}

fn landing_page(session: &Session) -> &'static str {
    Page::for_role(session.role())[0].href()
}

async fn get_root(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match current_session(&state, &headers).await {
        Some(session) => Redirect::to(landing_page(&session)).into_response(),
        None => Redirect::to("/login").into_response(),
    }
}

// ── Login / logout ────────────────────────────────────────────────────────────

async fn get_login() -> Response {
    Html(template::login_page(&[]).into_string()).into_response()
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn post_login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    match auth::login(&state.store, &state.sessions, &form.username, &form.password).await {
        Ok((token, session)) => {
            let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict");
            (
                StatusCode::SEE_OTHER,
                [
                    (header::SET_COOKIE, cookie),
                    (header::LOCATION, landing_page(&session).to_string()),
                ],
            )
                .into_response()
        }
        Err(e) if e.is_recoverable() => {
            Html(template::login_page(&[Notice::warning(e.to_string())]).into_string())
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn post_logout(State(state): State<AppState>, req: Request) -> Response {
    if let Some(tok) = extract_session_cookie(req.headers()) {
        auth::logout(&state.sessions, &tok).await;
    }
    let clear = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0");
    (
        StatusCode::SEE_OTHER,
        [
            (header::SET_COOKIE, clear),
            (header::LOCATION, "/login".to_string()),
        ],
    )
        .into_response()
}

// ── Signup ────────────────────────────────────────────────────────────────────

async fn get_signup() -> Response {
    Html(template::signup_page(&[]).into_string()).into_response()
}

#[derive(Deserialize)]
struct SignupForm {
    username: String,
    password: String,
    /// Present (as "on") only when the checkbox is ticked.
    apply_admin: Option<String>,
    #[serde(default)]
    passkey: String,
}

async fn post_signup(State(state): State<AppState>, Form(form): Form<SignupForm>) -> Response {
    let result = auth::signup(
        &state.store,
        &form.username,
        &form.password,
        form.apply_admin.is_some(),
        &form.passkey,
        &state.admin_passkey,
    )
    .await;

    let notices = match result {
        Ok(outcome) => {
            let mut notices = Vec::new();
            match outcome.admin {
                AdminRequest::Granted => notices.push(Notice::success("Admin Access Granted")),
                AdminRequest::Denied => notices.push(Notice::warning(
                    "Incorrect Admin Passkey. Account created without admin access.",
                )),
                AdminRequest::NotRequested => {}
            }
            notices.push(Notice::success("Registration Successful! Please Login."));
            notices
        }
        Err(e) if e.is_recoverable() => vec![Notice::warning(e.to_string())],
        Err(e) => return e.into_response(),
    };

    Html(template::signup_page(&notices).into_string()).into_response()
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn extract_session_cookie(headers: &HeaderMap) -> Option<String> {
    let cookie_str = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_str.split(';') {
        let part = part.trim();
        if let Some(val) = part.strip_prefix(&format!("{}=", SESSION_COOKIE)) {
            if !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}
