//! # 数据面 worker 模块
//!
//! 每个 worker 是一个独立的决策单元：自己的本地缓存、自己的每组
//! 均衡器和统计数据,互相之间只通过共享状态存储看到同一份配置。
//! 两个 worker 在同一瞬间对同一个组做出不同的均衡决策是设计上
//! 接受的结果,不做跨 worker 协调。

pub mod cache;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use hyper::header::HeaderMap;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::balancer::{algorithm_for, GroupBalancer};
use crate::diversion;
use crate::store::SharedStateStore;

pub use cache::WorkerCache;

/// One per-request routing outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    /// Backend group the request balances within.
    pub group: String,
    /// Selected endpoint identity (`address:port`).
    pub endpoint: String,
    /// Whether a diversion policy overrode the default group.
    pub diverted: bool,
}

/// A single data-plane decision unit.
pub struct Worker {
    id: usize,
    cache: WorkerCache,
    balancers: HashMap<String, GroupBalancer>,
    reconciled_version: u64,
}

impl Worker {
    pub fn new(id: usize, store: Arc<SharedStateStore>) -> Self {
        Self {
            id,
            cache: WorkerCache::new(store),
            balancers: HashMap::new(),
            reconciled_version: 0,
        }
    }

    /// 对齐均衡器集合与共享状态里的后端组:新组建实例,旧组同步,
    /// 消失的组丢弃。版本没变时什么都不做。
    pub fn reconcile(&mut self) {
        let groups = self.cache.get_backends().to_vec();
        let version = self.cache.backends_version();
        if version == self.reconciled_version {
            return;
        }

        let mut seen = HashSet::with_capacity(groups.len());
        for group in &groups {
            seen.insert(group.name.clone());

            match self.balancers.get_mut(&group.name) {
                Some(balancer) if balancer.algorithm() == algorithm_for(group) => {
                    balancer.sync(group);
                }
                Some(_) => {
                    debug!(
                        worker = self.id,
                        group = %group.name,
                        algorithm = algorithm_for(group),
                        "balancer algorithm changed, rebuilding"
                    );
                    self.balancers
                        .insert(group.name.clone(), GroupBalancer::new(group));
                }
                None => {
                    self.balancers
                        .insert(group.name.clone(), GroupBalancer::new(group));
                }
            }
        }

        self.balancers.retain(|name, _| seen.contains(name));
        self.reconciled_version = version;
        debug!(
            worker = self.id,
            version,
            groups = self.balancers.len(),
            "balancers reconciled"
        );
    }

    /// Decide the upstream for one request.
    ///
    /// Diversion policies are consulted first; a matching policy overrides
    /// the default group, then the group's balancer picks the endpoint.
    /// Returns `None` when the chosen group has no usable endpoint.
    pub fn decide(
        &mut self,
        host: &str,
        path: &str,
        headers: &HeaderMap,
        default_group: &str,
    ) -> Option<RouteDecision> {
        self.reconcile();

        let diverted = diversion::route(self.cache.get_policies(), host, path, headers);
        let (group, diverted) = match diverted {
            Some(name) if self.balancers.contains_key(&name) => (name, true),
            Some(name) => {
                warn!(
                    worker = self.id,
                    group = %name,
                    "diverted group has no backends, falling back to {}",
                    default_group
                );
                (default_group.to_string(), false)
            }
            None => (default_group.to_string(), false),
        };

        let balancer = self.balancers.get_mut(&group)?;
        let endpoint = balancer.balance()?;

        debug!(
            worker = self.id,
            group = %group,
            endpoint = %endpoint,
            diverted,
            "route decided"
        );
        Some(RouteDecision {
            group,
            endpoint,
            diverted,
        })
    }

    /// Fold one observed response latency (seconds) into the group's
    /// statistics. Unknown groups or endpoints are ignored.
    pub fn observe(&mut self, group: &str, endpoint: &str, latency: f64) {
        if let Some(balancer) = self.balancers.get_mut(group) {
            balancer.update_stat(endpoint, latency);
        }
    }

    /// Balancer currently held for `group`, if any.
    pub fn balancer(&self, group: &str) -> Option<&GroupBalancer> {
        self.balancers.get(group)
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// 周期性对齐循环,收到关闭信号后退出。
    ///
    /// 决策路径本身每次都会对齐,这个循环只是让空闲 worker 的均衡器
    /// 不落后于共享状态太久。
    pub async fn run(mut self, sync_interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!("Worker {} started", self.id);
        let mut tick = tokio::time::interval(sync_interval);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.reconcile();
                }
                _ = shutdown.changed() => {
                    info!("Worker {} shutting down", self.id);
                    break;
                }
            }
        }
    }
}
