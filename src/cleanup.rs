//! Scheduled cleanup of expired refresh-token records.
//!
//! Reads already filter out expired records; the sweep keeps the store
//! from accumulating dead rows.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::db::RefreshTokenStore;

/// Interval between cleanup runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Run the cleanup once.
pub async fn run_cleanup(store: &dyn RefreshTokenStore) {
    match store.delete_expired().await {
        Ok(count) if count > 0 => info!("Cleaned up {} expired refresh tokens", count),
        Ok(_) => {}
        Err(e) => error!("Failed to clean up expired refresh tokens: {}", e),
    }
}

/// Spawn a background task that runs cleanup periodically.
/// Returns a handle that can be used to abort the task.
pub fn spawn_cleanup_scheduler(store: Arc<dyn RefreshTokenStore>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

        loop {
            interval.tick().await;
            run_cleanup(store.as_ref()).await;
        }
    })
}
