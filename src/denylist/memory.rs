//! In-process denylist backend

use super::{DenylistStore, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

/// DashMap-backed store. Expired entries are dropped lazily on lookup and by
/// `purge_expired`.
#[derive(Default)]
pub struct MemoryDenylist {
    entries: DashMap<String, Instant>,
    closed: AtomicBool,
}

impl MemoryDenylist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl DenylistStore for MemoryDenylist {
    async fn put(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.entries.insert(key.to_string(), Instant::now() + ttl);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.ensure_open()?;

        let now = Instant::now();
        let live = match self.entries.get(key) {
            Some(expiry) => *expiry > now,
            None => return Ok(false),
        };

        if !live {
            self.entries.remove_if(key, |_, expiry| *expiry <= now);
        }
        Ok(live)
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        self.ensure_open()?;

        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, expiry| *expiry > now);
        Ok(before.saturating_sub(self.entries.len()) as u64)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.entries.clear();
    }
}
