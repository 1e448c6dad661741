//! Cross-worker shared state store.
//!
//! A bounded key-value region holding the serialized policy and backend
//! sets pushed by the control plane. Values are opaque bytes replaced
//! wholesale; every write stamps a process-wide monotonic version so worker
//! caches can detect change with one integer compare. Readers always observe
//! a fully-old or fully-new snapshot and never block writers.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::error::{FluxgateError, FluxgateResult};

/// Logical key for the serialized policy set.
pub const KEY_POLICIES: &str = "policies";
/// Logical key for the serialized backend set.
pub const KEY_BACKENDS: &str = "backends";

/// Largest accepted value per key, mirroring the fixed-size memory segment
/// the store stands in for.
pub const DEFAULT_MAX_VALUE_BYTES: usize = 20 * 1024 * 1024;

/// One fully-written value under a logical key.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub data: Bytes,
    pub version: u64,
    /// Wall-clock stamp of the write; used only for log output.
    pub updated_at: DateTime<Utc>,
}

/// Concurrency-safe store shared by every worker in the process group.
pub struct SharedStateStore {
    entries: DashMap<String, Snapshot>,
    revision: AtomicU64,
    max_value_bytes: usize,
}

impl SharedStateStore {
    /// Creates an empty store with the default value bound.
    pub fn new() -> Self {
        Self::with_max_value_bytes(DEFAULT_MAX_VALUE_BYTES)
    }

    /// Creates an empty store accepting values up to `max_value_bytes`.
    pub fn with_max_value_bytes(max_value_bytes: usize) -> Self {
        Self {
            entries: DashMap::new(),
            revision: AtomicU64::new(0),
            max_value_bytes,
        }
    }

    /// Replaces the full value under `key` atomically.
    ///
    /// Returns the version stamped on the write. Fails only when the value
    /// exceeds the store's bound; the previous value is left untouched.
    pub fn set(&self, key: &str, value: impl Into<Bytes>) -> FluxgateResult<u64> {
        let data: Bytes = value.into();
        if data.len() > self.max_value_bytes {
            return Err(FluxgateError::store(format!(
                "value for key {} is {} bytes, limit is {}",
                key,
                data.len(),
                self.max_value_bytes
            )));
        }

        let bytes = data.len();
        // Writers on the same key serialize on the entry guard, so version
        // order matches write order for every reader of that key.
        let mut slot = self.entries.entry(key.to_string()).or_insert_with(|| Snapshot {
            data: Bytes::new(),
            version: 0,
            updated_at: Utc::now(),
        });
        let version = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        *slot = Snapshot {
            data,
            version,
            updated_at: Utc::now(),
        };
        drop(slot);
        debug!(key, version, bytes, "shared state value replaced");
        Ok(version)
    }

    /// Returns the latest fully-written snapshot under `key`, or `None` if
    /// the key was never written.
    pub fn get(&self, key: &str) -> Option<Snapshot> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Current version under `key`; 0 means never written.
    pub fn version(&self, key: &str) -> u64 {
        self.entries
            .get(key)
            .map(|entry| entry.value().version)
            .unwrap_or(0)
    }
}

impl Default for SharedStateStore {
    fn default() -> Self {
        Self::new()
    }
}
