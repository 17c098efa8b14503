//! Axum extractor gating protected routes.

use axum::{extract::FromRequestParts, http::HeaderMap, http::request::Parts};
use tracing::debug;

use super::cookie::{ACCESS_COOKIE_NAME, get_cookie};
use super::errors::{AuthError, AuthRejection};
use super::state::HasAuthState;
use super::types::Principal;
use crate::jwt::JwtCodec;

/// Extractor for routes that require a verified access token.
///
/// Rejections are routing decisions, not bare status codes: a missing
/// or invalid cookie redirects to login, an expired access token
/// redirects to the refresh flow.
pub struct Authorized(pub Principal);

impl<S> FromRequestParts<S> for Authorized
where
    S: HasAuthState + Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authorize(&parts.headers, state.codec())
            .map(Authorized)
            .map_err(|e| {
                debug!(error = %e, "request not authorized");
                e.gate_rejection()
            })
    }
}

/// Run the authorization sequence against request headers: extract the
/// access cookie, verify it, and build the principal from the already
/// verified token (claims are decoded without a second signature check).
pub fn authorize(headers: &HeaderMap, codec: &JwtCodec) -> Result<Principal, AuthError> {
    let token = get_cookie(headers, ACCESS_COOKIE_NAME).ok_or(AuthError::CookieMissing)?;

    let verified = codec.verify_access(token)?;
    let claims = codec.peek(token)?;

    Ok(Principal {
        iin: verified.iin,
        username: claims.username,
        created_at: claims.created_at,
        admin: verified.admin,
        access_token: token.to_string(),
    })
}
