//! Cookie parsing and formatting for authentication.

use axum::http::header;

/// Cookie name for the access token (short-lived, 20 seconds).
pub const ACCESS_COOKIE_NAME: &str = "access";

/// Cookie name for the refresh token (long-lived, 10 minutes).
pub const REFRESH_COOKIE_NAME: &str = "refresh";

/// Convenience cookie echoing the subject identifier to the frontend.
/// The only auth cookie readable from scripts.
pub const IIN_COOKIE_NAME: &str = "iin";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Format an HTTP-only Set-Cookie value.
pub fn http_only_cookie(name: &str, value: &str, max_age_secs: u64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{name}={value}; HttpOnly; SameSite=Strict; Path=/; Max-Age={max_age_secs}{secure}")
}

/// Format a script-readable Set-Cookie value.
pub fn echo_cookie(name: &str, value: &str, max_age_secs: u64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{name}={value}; SameSite=Strict; Path=/; Max-Age={max_age_secs}{secure}")
}

/// Format a Set-Cookie value that removes the cookie.
pub fn clear_cookie(name: &str, secure: bool) -> String {
    http_only_cookie(name, "", 0, secure)
}
