use crate::snapshot::{self, PoolState, SnapshotError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

pub const STATE_KEY: &str = "randomPickerState";
pub const COOKIE_TTL_DAYS: i64 = 7;
/// Browser cookie ceiling. Only enforced when a persistence layer opts in
/// through [`Persistence::with_size_limit`].
pub const COOKIE_MAX_BYTES: usize = 4096;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("value of {size} bytes exceeds the {limit} byte quota")]
    QuotaExceeded { size: usize, limit: usize },
    #[error("stored value is not valid percent-encoding")]
    Encoding,
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Durable string store keyed by name. Entries past their expiry read as
/// absent; `now` is the caller's clock for both reads and writes.
pub trait KeyValueStore {
    fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<String>, StoreError>;
    fn set(
        &mut self,
        key: &str,
        value: String,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub value: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredEntry {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expires| now < expires)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, StoredEntry>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that refuses any value longer than `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(bytes),
        }
    }

    pub fn entry(&self, key: &str) -> Option<&StoredEntry> {
        self.entries.get(key)
    }

    pub fn insert_raw(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(
            key.to_string(),
            StoredEntry {
                value: value.into(),
                expires_at: None,
            },
        );
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<String>, StoreError> {
        Ok(self
            .entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    fn set(
        &mut self,
        key: &str,
        value: String,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(limit) = self.quota {
            if value.len() > limit {
                return Err(StoreError::QuotaExceeded {
                    size: value.len(),
                    limit,
                });
            }
        }
        self.entries.retain(|_, entry| entry.is_live(now));
        self.entries
            .insert(key.to_string(), StoredEntry { value, expires_at });
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreVariant {
    /// Percent-encoded, sliding seven-day expiry.
    #[default]
    Cookie,
    /// Raw text, no expiry.
    Local,
}

/// Saves and restores [`PoolState`] under one fixed key.
#[derive(Debug)]
pub struct Persistence<S> {
    store: S,
    variant: StoreVariant,
    key: String,
    size_limit: Option<usize>,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(store: S, variant: StoreVariant) -> Self {
        Self {
            store,
            variant,
            key: STATE_KEY.to_string(),
            size_limit: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Refuses cookie saves whose `key=value` pair exceeds `bytes`.
    pub fn with_size_limit(mut self, bytes: Option<usize>) -> Self {
        self.size_limit = bytes;
        self
    }

    pub fn size_limit(&self) -> Option<usize> {
        self.size_limit
    }

    pub fn variant(&self) -> StoreVariant {
        self.variant
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn save(&mut self, state: &PoolState, now: DateTime<Utc>) -> Result<(), StoreError> {
        let body = snapshot::encode(state)?;
        match self.variant {
            StoreVariant::Cookie => {
                let value = encode_component(&body);
                let size = self.key.len() + 1 + value.len();
                if let Some(limit) = self.size_limit.filter(|limit| size > *limit) {
                    return Err(StoreError::QuotaExceeded { size, limit });
                }
                let expires = now + Duration::days(COOKIE_TTL_DAYS);
                self.store.set(&self.key, value, Some(expires), now)
            }
            StoreVariant::Local => self.store.set(&self.key, body, None, now),
        }
    }

    /// Reads the saved state. Missing, expired, unreadable or malformed
    /// values all come back as `None`.
    pub fn load(&self, now: DateTime<Utc>) -> Option<PoolState> {
        match self.try_load(now) {
            Ok(state) => state,
            Err(err) => {
                warn!(key = %self.key, error = %err, "discarding saved picker state");
                None
            }
        }
    }

    pub fn try_load(&self, now: DateTime<Utc>) -> Result<Option<PoolState>, StoreError> {
        let Some(raw) = self.store.get(&self.key, now)? else {
            return Ok(None);
        };
        let body = match self.variant {
            StoreVariant::Cookie => decode_component(&raw)?,
            StoreVariant::Local => raw,
        };
        Ok(Some(snapshot::decode(&body)?))
    }
}

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(byte, b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')')
}

/// URI-component percent-encoding of the UTF-8 bytes of `value`.
pub fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if is_unreserved(byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

pub fn decode_component(value: &str) -> Result<String, StoreError> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0usize;
    while idx < bytes.len() {
        if bytes[idx] == b'%' {
            let hex = bytes.get(idx + 1..idx + 3).ok_or(StoreError::Encoding)?;
            if !hex.iter().all(u8::is_ascii_hexdigit) {
                return Err(StoreError::Encoding);
            }
            let byte = (hex_value(hex[0]) << 4) | hex_value(hex[1]);
            out.push(byte);
            idx += 3;
        } else {
            out.push(bytes[idx]);
            idx += 1;
        }
    }
    String::from_utf8(out).map_err(|_| StoreError::Encoding)
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}
