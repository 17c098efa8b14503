use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tengegate::cli::{Args, init_logging, load_secrets, open_database};
use tengegate::db::RefreshTokenStore;
use tengegate::iin::BasicIinValidator;
use tengegate::wallet::HttpWalletService;
use tengegate::{ServerConfig, init_cleanup, run_server};
use tracing::{error, info};
use url::Url;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(tokens) = load_secrets(
        Duration::from_secs(args.access_ttl_secs),
        Duration::from_secs(args.refresh_ttl_secs),
    ) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    let wallet_url = Url::parse(&args.wallet_url).unwrap_or_else(|e| {
        error!(url = %args.wallet_url, error = %e, "Invalid wallet service URL");
        std::process::exit(1);
    });
    let wallet = HttpWalletService::new(wallet_url).unwrap_or_else(|e| {
        error!(error = %e, "Failed to initialize wallet client");
        std::process::exit(1);
    });

    let refresh_tokens: Arc<dyn RefreshTokenStore> = Arc::new(db.refresh_tokens());
    init_cleanup(refresh_tokens.clone()).await;

    let config = ServerConfig {
        tokens,
        users: Arc::new(db.users()),
        refresh_tokens,
        wallet: Arc::new(wallet),
        iin_check: Arc::new(BasicIinValidator),
        secure_cookies: args.secure_cookies,
    };

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = listener.local_addr().expect("Failed to get local address");
    info!(address = %local_addr, "Listening");

    if let Err(e) = run_server(&config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
