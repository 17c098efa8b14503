//! JWT issuance and verification.
//!
//! Two token classes share one claim shape: short-lived access tokens
//! (20 seconds) and refresh tokens (10 minutes) signed with a separate
//! secret and cross-checked against the refresh-token store.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Access token duration: 20 seconds. Deliberately short so a stolen
/// access token has a narrow exploitation window; the refresh token is
/// the durable credential.
pub const ACCESS_TOKEN_TTL_SECS: u64 = 20;

/// Refresh token duration: 10 minutes.
pub const REFRESH_TOKEN_TTL_SECS: u64 = 10 * 60;

/// Token class for selecting the signing secret and TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Access,
    Refresh,
}

/// Claims carried by every token. All five fields are required; a token
/// missing any of them fails verification regardless of its signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identifier (12-digit national ID number)
    pub iin: String,
    /// Username
    pub username: String,
    /// Account creation marker, carried for display only
    #[serde(rename = "createdAt")]
    pub created_at: String,
    /// Elevated-role flag
    pub admin: bool,
    /// Expiration time (Unix timestamp, seconds)
    pub exp: u64,
}

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    pub iin: String,
    pub admin: bool,
}

/// Signing secrets and TTLs, built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    /// Config with the default TTLs (20s access, 10m refresh).
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::from_secs(ACCESS_TOKEN_TTL_SECS),
            refresh_ttl: Duration::from_secs(REFRESH_TOKEN_TTL_SECS),
        }
    }
}

/// Errors from token issuance and verification.
///
/// `Expired` is deliberately distinct from `Invalid`: callers redirect an
/// expired access token to the refresh flow, everything else to login.
/// `MissingClaim` names the offending field for diagnostics but gates
/// access exactly like `Invalid`.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
    #[error("claim {0} missing or malformed")]
    MissingClaim(&'static str),
    #[error("failed to sign token: {0}")]
    Signing(String),
    #[error("system clock before unix epoch")]
    Clock,
}

struct ClassKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

/// Encoder/verifier for both token classes.
pub struct JwtCodec {
    access: ClassKeys,
    refresh: ClassKeys,
}

impl JwtCodec {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            access: ClassKeys {
                encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
                decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
                ttl: config.access_ttl,
            },
            refresh: ClassKeys {
                encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
                decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
                ttl: config.refresh_ttl,
            },
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access.ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh.ttl
    }

    /// Issue an access token for the given identity.
    pub fn issue_access(
        &self,
        iin: &str,
        username: &str,
        created_at: &str,
        admin: bool,
    ) -> Result<String, TokenError> {
        self.issue(TokenClass::Access, iin, username, created_at, admin)
    }

    /// Issue a refresh token for the given identity. Refresh tokens never
    /// carry the elevated-role flag.
    pub fn issue_refresh(
        &self,
        iin: &str,
        username: &str,
        created_at: &str,
    ) -> Result<String, TokenError> {
        self.issue(TokenClass::Refresh, iin, username, created_at, false)
    }

    fn issue(
        &self,
        class: TokenClass,
        iin: &str,
        username: &str,
        created_at: &str,
        admin: bool,
    ) -> Result<String, TokenError> {
        let keys = self.keys(class);
        let claims = Claims {
            iin: iin.to_string(),
            username: username.to_string(),
            created_at: created_at.to_string(),
            admin,
            exp: unix_now()? + keys.ttl.as_secs(),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &keys.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify an access token.
    pub fn verify_access(&self, token: &str) -> Result<Verified, TokenError> {
        self.verify(token, TokenClass::Access)
    }

    /// Verify a refresh token.
    pub fn verify_refresh(&self, token: &str) -> Result<Verified, TokenError> {
        self.verify(token, TokenClass::Refresh)
    }

    /// Check structure, signature, required claims, and expiry, in that
    /// order. Only an HMAC `alg` is accepted; a token claiming any other
    /// signing method is rejected as invalid, not silently verified.
    fn verify(&self, token: &str, class: TokenClass) -> Result<Verified, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;
        // Expiry is compared by hand below so that an expired token stays
        // distinguishable from a structurally broken one.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<serde_json::Value>(
            token,
            &self.keys(class).decoding,
            &validation,
        )
        .map_err(|_| TokenError::Invalid)?;
        let claims = data.claims;

        let admin = claims
            .get("admin")
            .and_then(serde_json::Value::as_bool)
            .ok_or(TokenError::MissingClaim("admin"))?;
        claims
            .get("username")
            .and_then(serde_json::Value::as_str)
            .ok_or(TokenError::MissingClaim("username"))?;
        claims
            .get("createdAt")
            .and_then(serde_json::Value::as_str)
            .ok_or(TokenError::MissingClaim("createdAt"))?;
        let iin = claims
            .get("iin")
            .and_then(serde_json::Value::as_str)
            .ok_or(TokenError::MissingClaim("iin"))?;
        let exp = claims
            .get("exp")
            .and_then(serde_json::Value::as_u64)
            .ok_or(TokenError::MissingClaim("exp"))?;

        if unix_now()? >= exp {
            return Err(TokenError::Expired);
        }

        Ok(Verified {
            iin: iin.to_string(),
            admin,
        })
    }

    /// Decode a token's claims without checking the signature or expiry.
    /// Only for tokens that already passed [`Self::verify_access`]; the
    /// authorization extractor uses this to attach the full principal.
    pub fn peek(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }

    fn keys(&self, class: TokenClass) -> &ClassKeys {
        match class {
            TokenClass::Access => &self.access,
            TokenClass::Refresh => &self.refresh,
        }
    }
}

/// Current Unix time in seconds.
pub fn unix_now() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| TokenError::Clock)
}
