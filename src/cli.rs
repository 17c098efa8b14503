//! CLI argument parsing, validation, and startup helpers.

use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

use crate::db::Database;
use crate::jwt::{ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS, TokenConfig};

const RECOMMENDED_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tengegate",
    about = "Authentication gateway for the tenge wallet service"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8090")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "tengegate.db")]
    pub database: String,

    /// Base URL of the wallet service
    #[arg(long, default_value = "http://localhost:8070")]
    pub wallet_url: String,

    /// Access token lifetime in seconds
    #[arg(long, default_value_t = ACCESS_TOKEN_TTL_SECS)]
    pub access_ttl_secs: u64,

    /// Refresh token lifetime in seconds
    #[arg(long, default_value_t = REFRESH_TOKEN_TTL_SECS)]
    pub refresh_ttl_secs: u64,

    /// Set the Secure flag on cookies (use behind HTTPS)
    #[arg(long)]
    pub secure_cookies: bool,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load both signing secrets from the environment. Returns None and logs
/// an error if either is absent or empty; the process must not serve
/// requests without them.
pub fn load_secrets(access_ttl: Duration, refresh_ttl: Duration) -> Option<TokenConfig> {
    let access_secret = read_secret("ACCESS_SECRET")?;
    let refresh_secret = read_secret("REFRESH_SECRET")?;
    Some(TokenConfig {
        access_secret,
        refresh_secret,
        access_ttl,
        refresh_ttl,
    })
}

fn read_secret(name: &str) -> Option<String> {
    let Ok(secret) = std::env::var(name) else {
        error!("{name} environment variable is required");
        return None;
    };

    // Clear the environment variable to prevent leaking
    // SAFETY: We're single-threaded at this point during startup,
    // and no other code is reading this environment variable.
    unsafe { std::env::remove_var(name) };

    if secret.is_empty() {
        error!("{name} must not be empty");
        return None;
    }
    if secret.len() < RECOMMENDED_SECRET_LENGTH {
        warn!(
            "{name} is shorter than {RECOMMENDED_SECRET_LENGTH} characters; use a longer secret"
        );
    }

    Some(secret)
}

/// Open the database, logging any failure.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database ready");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
