use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

/// Short-lived key/value cache for one-time codes.
#[async_trait]
pub trait OtpStore: Send + Sync {
    async fn put(&self, key: &str, value: String, ttl: Duration);

    /// Returns the value if present and not yet expired.
    async fn get(&self, key: &str) -> Option<String>;

    async fn delete(&self, key: &str);
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// Process-local store. Entries vanish on restart; that is acceptable for codes
/// that live ten minutes.
#[derive(Debug, Default)]
pub struct InMemoryOtpStore {
    entries: DashMap<String, Entry>,
}

impl InMemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl OtpStore for InMemoryOtpStore {
    async fn put(&self, key: &str, value: String, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    async fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    async fn delete(&self, key: &str) {
        self.entries.remove(key);
    }
}
