//! Cookie-based dual-token authorization.
//!
//! Every protected route goes through the [`Authorized`] extractor:
//! access cookie → codec verification → typed principal on success, or a
//! routing decision on failure (expired access tokens go to the refresh
//! flow, everything else back to login).

mod cookie;
mod errors;
mod extractors;
mod state;
mod types;

pub use cookie::{
    ACCESS_COOKIE_NAME, IIN_COOKIE_NAME, REFRESH_COOKIE_NAME, clear_cookie, echo_cookie,
    get_cookie, http_only_cookie,
};
pub use errors::{AuthError, AuthRejection, LOGIN_PATH, REFRESH_PATH};
pub use extractors::{Authorized, authorize};
pub use state::HasAuthState;
pub use types::Principal;
