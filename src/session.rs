use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const PLAYER_KEY_PREFIX: &str = "player_";
pub const LEADERBOARD_KEY: &str = "cachedLeaderboard";

pub fn player_key(account_id: &str) -> String {
    format!("{PLAYER_KEY_PREFIX}{account_id}")
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Cached payload stamped with the epoch milliseconds it was stored at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: i64,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, timestamp: i64) -> Self {
        Self { data, timestamp }
    }

    pub fn is_fresh(&self, now_ms: i64, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now_ms.saturating_sub(self.timestamp) < ttl_ms
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Fresh(T),
    Stale,
    Missing,
    Corrupt(String),
}

impl<T> Lookup<T> {
    pub fn fresh(self) -> Option<T> {
        match self {
            Lookup::Fresh(data) => Some(data),
            _ => None,
        }
    }
}

/// String key/value store that lives as long as the session. Nothing touches disk.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    items: HashMap<String, String>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    pub fn set_item(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.items.insert(key.into(), value.into());
    }

    pub fn remove_item(&mut self, key: &str) -> Option<String> {
        self.items.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear_prefix(&mut self, prefix: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|key, _| !key.starts_with(prefix));
        before - self.items.len()
    }

    pub fn write_entry<T: Serialize>(&mut self, key: &str, data: &T, now_ms: i64) -> Result<()> {
        let payload = CacheEntry::new(data, now_ms);
        let json = serde_json::to_string(&payload)
            .with_context(|| format!("serialize cache entry {key}"))?;
        self.set_item(key, json);
        Ok(())
    }

    /// Stale entries stay in place; they are only replaced by the next write.
    pub fn read_entry<T: DeserializeOwned>(&self, key: &str, now_ms: i64, ttl: Duration) -> Lookup<T> {
        let Some(raw) = self.get_item(key) else {
            return Lookup::Missing;
        };
        match serde_json::from_str::<CacheEntry<T>>(raw) {
            Ok(entry) if entry.is_fresh(now_ms, ttl) => Lookup::Fresh(entry.data),
            Ok(_) => Lookup::Stale,
            Err(err) => Lookup::Corrupt(err.to_string()),
        }
    }

    pub fn clear_profiles(&mut self) -> usize {
        self.clear_prefix(PLAYER_KEY_PREFIX)
    }
}
