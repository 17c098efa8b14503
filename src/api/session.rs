//! Session endpoints: signup, login, logout, and the token refresh flow.
//!
//! - POST `/login` - Verify credentials, issue both tokens, record the
//!   refresh token in the store
//! - POST `/signup` - Register a new user
//! - GET `/refresh` - Exchange a stored refresh token for a new access
//!   token (the refresh token itself is left untouched)
//! - GET `/logout` - Clear token cookies

use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{error, info, warn};

use super::AppState;
use super::error::{ApiError, ResultExt};
use crate::auth::{
    ACCESS_COOKIE_NAME, AuthError, IIN_COOKIE_NAME, REFRESH_COOKIE_NAME, clear_cookie,
    echo_cookie, get_cookie, http_only_cookie,
};
use crate::db::StoreError;

/// Matches the original cost of the stored hashes.
const BCRYPT_COST: u32 = 10;

/// The IIN echo cookie outlives the access token only slightly.
const IIN_COOKIE_MAX_AGE_SECS: u64 = 25;

#[derive(Deserialize)]
pub struct Credentials {
    login: String,
    password: String,
}

#[derive(Deserialize)]
pub struct SignupForm {
    iin: String,
    login: String,
    password: String,
}

/// Verify credentials and start a session: both tokens are issued, the
/// refresh token becomes the subject's single stored record, and all
/// three cookies are set.
pub async fn login(
    State(state): State<AppState>,
    Form(creds): Form<Credentials>,
) -> Result<Response, ApiError> {
    let user = state
        .users
        .get_by_username(&creds.login)
        .await
        .store_err("Failed to look up user")?
        .ok_or_else(|| ApiError::bad_request("invalid user, try again or sign up"))?;

    let password_ok = bcrypt::verify(&creds.password, &user.password_hash).map_err(|e| {
        error!("Failed to verify password hash: {}", e);
        ApiError::internal("something went wrong, try again later")
    })?;
    if !password_ok {
        return Err(ApiError::unauthorized("invalid password"));
    }

    let access = state
        .codec
        .issue_access(&user.iin, &user.username, &user.created_at, user.is_admin)
        .store_err("Failed to issue access token")?;
    let refresh = state
        .codec
        .issue_refresh(&user.iin, &user.username, &user.created_at)
        .store_err("Failed to issue refresh token")?;

    state
        .refresh_tokens
        .put(&user.iin, &refresh, state.codec.refresh_ttl())
        .await
        .store_err("Failed to record refresh token")?;

    info!(iin = %user.iin, "session started");

    let cookies = AppendHeaders([
        (
            header::SET_COOKIE,
            http_only_cookie(
                ACCESS_COOKIE_NAME,
                &access,
                state.codec.access_ttl().as_secs(),
                state.secure_cookies,
            ),
        ),
        (
            header::SET_COOKIE,
            http_only_cookie(
                REFRESH_COOKIE_NAME,
                &refresh,
                state.codec.refresh_ttl().as_secs(),
                state.secure_cookies,
            ),
        ),
        (
            header::SET_COOKIE,
            echo_cookie(
                IIN_COOKIE_NAME,
                &user.iin,
                IIN_COOKIE_MAX_AGE_SECS,
                state.secure_cookies,
            ),
        ),
    ]);

    Ok((
        StatusCode::OK,
        cookies,
        Json(serde_json::json!({ "success": true })),
    )
        .into_response())
}

/// Register a new user. The IIN checksum is delegated to the configured
/// validator; the gateway itself only checks shape and credential
/// charset.
pub async fn signup(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> Result<Response, ApiError> {
    if !state.iin_check.is_valid(&form.iin) {
        return Err(ApiError::bad_request("invalid IIN"));
    }

    let username = form.login.trim();
    if username.is_empty() || !str_is_print(username) {
        return Err(ApiError::bad_request("invalid username or password"));
    }
    if !str_is_print(&form.password) || !contains_special_char(&form.password) {
        return Err(ApiError::bad_request("invalid username or password"));
    }

    let hash = bcrypt::hash(&form.password, BCRYPT_COST).map_err(|e| {
        error!("Failed to hash password: {}", e);
        ApiError::internal("something went wrong, try again later")
    })?;

    match state.users.insert(&form.iin, username, &hash).await {
        Ok(()) => {
            info!(iin = %form.iin, "user registered");
            Ok(Json(serde_json::json!({ "success": true })).into_response())
        }
        Err(StoreError::Duplicate) => Err(ApiError::bad_request("username / IIN already exist(s)")),
        Err(e) => {
            error!("Failed to insert user: {}", e);
            Err(ApiError::internal("something went wrong, try again later"))
        }
    }
}

/// Exchange a valid, store-matching refresh token for a new access
/// token. On any auth failure the client is sent to login; only a store
/// outage surfaces as an internal error.
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match refresh_access(&state, &headers).await {
        Ok((access, iin)) => {
            let cookies = AppendHeaders([
                (
                    header::SET_COOKIE,
                    http_only_cookie(
                        ACCESS_COOKIE_NAME,
                        &access,
                        state.codec.access_ttl().as_secs(),
                        state.secure_cookies,
                    ),
                ),
                (
                    header::SET_COOKIE,
                    echo_cookie(
                        IIN_COOKIE_NAME,
                        &iin,
                        IIN_COOKIE_MAX_AGE_SECS,
                        state.secure_cookies,
                    ),
                ),
            ]);
            (
                StatusCode::OK,
                cookies,
                Json(serde_json::json!({ "success": true })),
            )
                .into_response()
        }
        Err(e) => {
            warn!(error = %e, "token refresh rejected");
            e.refresh_rejection().into_response()
        }
    }
}

async fn refresh_access(state: &AppState, headers: &HeaderMap) -> Result<(String, String), AuthError> {
    let presented = get_cookie(headers, REFRESH_COOKIE_NAME).ok_or(AuthError::CookieMissing)?;

    let verified = state.codec.verify_refresh(presented)?;

    // Byte-for-byte comparison against the single stored record per
    // subject: a superseded refresh token fails here even though its
    // signature is still good.
    let stored = state.refresh_tokens.get(&verified.iin).await?;
    if stored.as_deref() != Some(presented) {
        return Err(AuthError::RefreshMismatch);
    }

    let user = state
        .users
        .get_by_iin(&verified.iin)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    // Claims are rebuilt from the fetched record; the refresh token and
    // its store entry stay as they are.
    let access = state
        .codec
        .issue_access(&user.iin, &user.username, &user.created_at, user.is_admin)?;
    Ok((access, user.iin))
}

/// Clear the token cookies and send the client home.
pub async fn logout(State(state): State<AppState>) -> Response {
    let cookies = AppendHeaders([
        (
            header::SET_COOKIE,
            clear_cookie(ACCESS_COOKIE_NAME, state.secure_cookies),
        ),
        (
            header::SET_COOKIE,
            clear_cookie(REFRESH_COOKIE_NAME, state.secure_cookies),
        ),
    ]);
    (
        StatusCode::SEE_OTHER,
        [(header::LOCATION, "/")],
        cookies,
        (),
    )
        .into_response()
}

/// Printable Latin characters only.
fn str_is_print(s: &str) -> bool {
    s.chars().all(|c| (' '..='~').contains(&c))
}

/// At least one character outside digits and Latin letters.
fn contains_special_char(s: &str) -> bool {
    s.chars()
        .any(|c| c.is_ascii() && !c.is_ascii_alphanumeric() && c != '\x7f')
}
