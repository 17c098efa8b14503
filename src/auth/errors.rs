//! Authentication failure taxonomy and its routing decisions.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::db::StoreError;
use crate::jwt::TokenError;

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/login";

/// Where holders of an expired access token are sent.
pub const REFRESH_PATH: &str = "/refresh";

/// Why a request could not be authorized. The client is never told
/// which of the login-bound variants fired; they all collapse into the
/// same redirect.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no token cookie presented")]
    CookieMissing,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("presented refresh token does not match the stored record")]
    RefreshMismatch,
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Routing decision for the authorization middleware. Only an
    /// expired access token goes to the refresh flow; every other
    /// failure means re-login.
    pub fn gate_rejection(&self) -> AuthRejection {
        match self {
            AuthError::Token(TokenError::Expired) => AuthRejection::Refresh,
            AuthError::Store(_) => AuthRejection::Internal,
            _ => AuthRejection::Login,
        }
    }

    /// Routing decision for the refresh flow. A refresh token does not
    /// itself refresh, so even its expiry falls back to login; only
    /// store failures surface as internal errors.
    pub fn refresh_rejection(&self) -> AuthRejection {
        match self {
            AuthError::Store(_) => AuthRejection::Internal,
            _ => AuthRejection::Login,
        }
    }
}

/// Terminal outcome of a failed authorization, rendered as a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    Login,
    Refresh,
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Login => Redirect::to(LOGIN_PATH).into_response(),
            AuthRejection::Refresh => Redirect::to(REFRESH_PATH).into_response(),
            AuthRejection::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "something went wrong, try again later"
                })),
            )
                .into_response(),
        }
    }
}
