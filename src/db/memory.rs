//! In-memory refresh-token store for tests and single-process setups.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{RefreshTokenStore, StoreError};

#[derive(Default)]
pub struct MemoryRefreshStore {
    records: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryRefreshStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, (String, Instant)>>, StoreError>
    {
        self.records
            .lock()
            .map_err(|_| StoreError::Backend("refresh store lock poisoned".into()))
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshStore {
    async fn put(&self, iin: &str, token: &str, ttl: Duration) -> Result<(), StoreError> {
        self.lock()?
            .insert(iin.to_string(), (token.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn get(&self, iin: &str) -> Result<Option<String>, StoreError> {
        let records = self.lock()?;
        Ok(records
            .get(iin)
            .filter(|(_, expires)| *expires > Instant::now())
            .map(|(token, _)| token.clone()))
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|_, (_, expires)| *expires > Instant::now());
        Ok((before - records.len()) as u64)
    }
}
