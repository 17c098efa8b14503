//! State trait consumed by the authorization extractor.

use crate::jwt::JwtCodec;

/// Router state types that can verify tokens.
pub trait HasAuthState {
    fn codec(&self) -> &JwtCodec;
}
