//! # 负载均衡器模块
//!
//! 本模块按后端组提供端点选择，每个 worker 持有自己的均衡器实例，
//! 统计数据不跨 worker 共享。
//!
//! ## 负载均衡算法
//!
//! - **EWMA**: 基于指数加权移动平均延迟评分，分数越低越优先；
//!   未观测过的端点得分最优，冷启动时优先接收流量
//! - **轮询 (Round Robin)**: 依次分配请求到各个端点
//!
//! 算法由后端组描述符的 `algorithm` 字段选择，未识别的值回退到 EWMA。
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use fluxgate::balancer::GroupBalancer;
//! use fluxgate::config::BackendGroup;
//!
//! let group = BackendGroup::default();
//! let mut balancer = GroupBalancer::new(&group);
//! if let Some(endpoint) = balancer.balance() {
//!     println!("选择的端点: {}", endpoint);
//! }
//! ```

pub mod ewma; // EWMA 延迟感知均衡器
pub mod round_robin; // 轮询均衡器

pub use ewma::{EndpointStat, EwmaBalancer};
pub use round_robin::RoundRobinBalancer;

use crate::config::upstreams::BackendGroup;

/// Selector value for the cycling balancer; everything else means EWMA.
pub const ALGORITHM_ROUND_ROBIN: &str = "round_robin";

/// The algorithm a group's descriptor selects.
pub fn algorithm_for(group: &BackendGroup) -> &'static str {
    if group.algorithm == ALGORITHM_ROUND_ROBIN {
        ALGORITHM_ROUND_ROBIN
    } else {
        "ewma"
    }
}

/// Per-group balancer, dispatching on the descriptor's algorithm selector.
#[derive(Debug)]
pub enum GroupBalancer {
    Ewma(EwmaBalancer),
    RoundRobin(RoundRobinBalancer),
}

impl GroupBalancer {
    pub fn new(group: &BackendGroup) -> Self {
        match algorithm_for(group) {
            ALGORITHM_ROUND_ROBIN => GroupBalancer::RoundRobin(RoundRobinBalancer::new(group)),
            _ => GroupBalancer::Ewma(EwmaBalancer::new(group)),
        }
    }

    /// Pick an endpoint identity for one request.
    pub fn balance(&mut self) -> Option<String> {
        match self {
            GroupBalancer::Ewma(balancer) => balancer.balance(),
            GroupBalancer::RoundRobin(balancer) => balancer.balance(),
        }
    }

    /// Record a response latency (seconds) for an endpoint. Cycling
    /// balancers keep no statistics and ignore this.
    pub fn update_stat(&mut self, identity: &str, latency: f64) {
        if let GroupBalancer::Ewma(balancer) = self {
            balancer.update_stat(identity, latency);
        }
    }

    /// Reconcile against a new group definition.
    pub fn sync(&mut self, group: &BackendGroup) {
        match self {
            GroupBalancer::Ewma(balancer) => balancer.sync(group),
            GroupBalancer::RoundRobin(balancer) => balancer.sync(group),
        }
    }

    /// Name of the algorithm this balancer runs.
    pub fn algorithm(&self) -> &'static str {
        match self {
            GroupBalancer::Ewma(_) => "ewma",
            GroupBalancer::RoundRobin(_) => ALGORITHM_ROUND_ROBIN,
        }
    }
}
