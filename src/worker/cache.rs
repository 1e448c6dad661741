use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::config::BackendGroup;
use crate::policy::Policy;
use crate::store::{SharedStateStore, KEY_BACKENDS, KEY_POLICIES};

/// 单个 worker 的本地配置缓存
///
/// 每次取值都会对照共享状态存储的版本号,版本变了才重新反序列化,
/// 因此调用方在每个决策点读取也只花一次整数比较的代价。坏载荷降级
/// 为空集合并记录日志,不会让请求处理崩溃。
pub struct WorkerCache {
    store: Arc<SharedStateStore>,
    policies: Vec<Policy>,
    policies_version: u64,
    backends: Vec<BackendGroup>,
    backends_version: u64,
}

impl WorkerCache {
    pub fn new(store: Arc<SharedStateStore>) -> Self {
        Self {
            store,
            policies: Vec::new(),
            policies_version: 0,
            backends: Vec::new(),
            backends_version: 0,
        }
    }

    /// Current policy list, refreshed against the store before returning.
    pub fn get_policies(&mut self) -> &[Policy] {
        refresh_slot(
            &self.store,
            KEY_POLICIES,
            &mut self.policies_version,
            &mut self.policies,
        );
        &self.policies
    }

    /// Current backend groups, refreshed against the store before returning.
    pub fn get_backends(&mut self) -> &[BackendGroup] {
        refresh_slot(
            &self.store,
            KEY_BACKENDS,
            &mut self.backends_version,
            &mut self.backends,
        );
        &self.backends
    }

    /// Store version this cache's backend view was parsed from.
    pub fn backends_version(&self) -> u64 {
        self.backends_version
    }
}

/// 版本号不变直接返回;变了就整体替换本地副本。
fn refresh_slot<T: DeserializeOwned>(
    store: &SharedStateStore,
    key: &str,
    last_version: &mut u64,
    slot: &mut Vec<T>,
) {
    let Some(snapshot) = store.get(key) else {
        // Never written; the slot stays as constructed (empty).
        return;
    };
    if snapshot.version == *last_version {
        return;
    }

    match serde_json::from_slice(&snapshot.data) {
        Ok(parsed) => {
            *slot = parsed;
            debug!(
                key,
                version = snapshot.version,
                count = slot.len(),
                "worker cache refreshed"
            );
        }
        Err(e) => {
            error!(
                "Failed to parse {} payload at version {}: {}",
                key, snapshot.version, e
            );
            slot.clear();
        }
    }
    // Remember the version even for a bad payload so it is not re-parsed
    // on every call; the next good write bumps it again.
    *last_version = snapshot.version;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy_payload() -> &'static str {
        r#"[{"host":"example.com","path":"/a","type":"header","header":"x-region",
            "upstreams":[{"header":"shanghai","upstream":"stream_a"}]}]"#
    }

    #[test]
    fn test_empty_store_yields_empty_collections() {
        let store = Arc::new(SharedStateStore::new());
        let mut cache = WorkerCache::new(store);

        assert!(cache.get_policies().is_empty());
        assert!(cache.get_backends().is_empty());
        assert_eq!(cache.backends_version(), 0);
    }

    #[test]
    fn test_pushed_policies_become_typed() {
        let store = Arc::new(SharedStateStore::new());
        store.set(KEY_POLICIES, policy_payload()).unwrap();

        let mut cache = WorkerCache::new(store);
        let policies = cache.get_policies();

        assert_eq!(policies.len(), 1);
        assert_eq!(policies[0].host, "example.com");
        assert_eq!(policies[0].path, "/a");
        assert_eq!(policies[0].header, "x-region");
        assert_eq!(policies[0].upstreams[0].upstream, "stream_a");
    }

    #[test]
    fn test_every_call_observes_latest_write() {
        let store = Arc::new(SharedStateStore::new());
        let mut cache = WorkerCache::new(Arc::clone(&store));

        assert!(cache.get_policies().is_empty());

        store.set(KEY_POLICIES, policy_payload()).unwrap();
        assert_eq!(cache.get_policies().len(), 1);

        store.set(KEY_POLICIES, "[]").unwrap();
        assert!(cache.get_policies().is_empty());
    }

    #[test]
    fn test_malformed_payload_degrades_to_empty() {
        let store = Arc::new(SharedStateStore::new());
        let mut cache = WorkerCache::new(Arc::clone(&store));

        store.set(KEY_POLICIES, policy_payload()).unwrap();
        assert_eq!(cache.get_policies().len(), 1);

        store.set(KEY_POLICIES, "{not valid json").unwrap();
        assert!(cache.get_policies().is_empty());

        // A corrected push recovers the typed view.
        store.set(KEY_POLICIES, policy_payload()).unwrap();
        assert_eq!(cache.get_policies().len(), 1);
    }

    #[test]
    fn test_backends_and_policies_refresh_independently() {
        let store = Arc::new(SharedStateStore::new());
        let mut cache = WorkerCache::new(Arc::clone(&store));

        store
            .set(
                KEY_BACKENDS,
                r#"[{"name":"web","algorithm":"ewma",
                    "endpoints":[{"address":"10.0.0.1","port":8080}]}]"#,
            )
            .unwrap();

        assert_eq!(cache.get_backends().len(), 1);
        assert_eq!(cache.get_backends()[0].endpoints[0].identity(), "10.0.0.1:8080");
        assert!(cache.get_policies().is_empty());
        assert!(cache.backends_version() > 0);
    }

    #[test]
    fn test_two_caches_see_the_same_store() {
        let store = Arc::new(SharedStateStore::new());
        let mut first = WorkerCache::new(Arc::clone(&store));
        let mut second = WorkerCache::new(Arc::clone(&store));

        store.set(KEY_POLICIES, policy_payload()).unwrap();

        assert_eq!(first.get_policies().len(), 1);
        assert_eq!(second.get_policies().len(), 1);
    }
}
