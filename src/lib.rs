pub mod api;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod db;
pub mod iin;
pub mod jwt;
pub mod wallet;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use api::AppState;
use db::{RefreshTokenStore, UserStore};
use iin::IinValidator;
use jwt::{JwtCodec, TokenConfig};
use wallet::WalletApi;

pub struct ServerConfig {
    /// Signing secrets and TTLs, validated at startup
    pub tokens: TokenConfig,
    /// User credential store
    pub users: Arc<dyn UserStore>,
    /// Refresh-token store (one record per subject)
    pub refresh_tokens: Arc<dyn RefreshTokenStore>,
    /// Wallet service client
    pub wallet: Arc<dyn WalletApi>,
    /// IIN validator used at signup
    pub iin_check: Arc<dyn IinValidator>,
    /// Whether to set the Secure flag on cookies (true behind HTTPS)
    pub secure_cookies: bool,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let state = AppState {
        codec: Arc::new(JwtCodec::new(&config.tokens)),
        users: config.users.clone(),
        refresh_tokens: config.refresh_tokens.clone(),
        wallet: config.wallet.clone(),
        iin_check: config.iin_check.clone(),
        secure_cookies: config.secure_cookies,
    };
    api::router(state)
}

/// Run cleanup once and spawn the background scheduler.
/// Call this before starting the server.
pub async fn init_cleanup(store: Arc<dyn RefreshTokenStore>) {
    cleanup::run_cleanup(store.as_ref()).await;
    cleanup::spawn_cleanup_scheduler(store);
}

/// Run the server on the given listener. This function blocks until the
/// server exits.
pub async fn run_server(config: &ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, create_app(config)).await
}
