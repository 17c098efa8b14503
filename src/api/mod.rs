mod error;
mod session;
mod wallet;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::auth::HasAuthState;
use crate::db::{RefreshTokenStore, UserStore};
use crate::iin::IinValidator;
use crate::jwt::JwtCodec;
use crate::wallet::WalletApi;

/// Shared state for all routes. Secrets and TTLs live inside the codec,
/// built once at startup; stores and the wallet client are trait objects
/// selected at wiring time.
#[derive(Clone)]
pub struct AppState {
    pub codec: Arc<JwtCodec>,
    pub users: Arc<dyn UserStore>,
    pub refresh_tokens: Arc<dyn RefreshTokenStore>,
    pub wallet: Arc<dyn WalletApi>,
    pub iin_check: Arc<dyn IinValidator>,
    pub secure_cookies: bool,
}

impl HasAuthState for AppState {
    fn codec(&self) -> &JwtCodec {
        &self.codec
    }
}

/// Create the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Unauthenticated entry points that produce or destroy tokens
        .route("/login", post(session::login))
        .route("/signup", post(session::signup))
        .route("/logout", get(session::logout))
        .route("/refresh", get(session::refresh))
        // Everything below requires a verified access token
        .route("/info", get(wallet::info))
        .route("/wallets", get(wallet::list_wallets).post(wallet::add_wallet))
        .route("/transactions", get(wallet::transactions))
        .route("/topup", post(wallet::top_up))
        .route("/transfer", post(wallet::transfer))
        .with_state(state)
}
