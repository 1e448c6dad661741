//! # Fluxgate - 动态 A/B 分流与负载均衡数据面
//!
//! Fluxgate 是一个用 Rust 编写的数据面决策引擎：控制面把路由策略和
//! 后端组推进共享状态存储，每个 worker 按版本号惰性拉取并独立完成
//! 分流与端点选择，无需重启即可生效。
//!
//! ## 核心功能
//!
//! - **配置同步通道**: 控制面通过 HTTP 推送完整的策略/后端载荷
//! - **共享状态存储**: 带版本号的整值替换存储，读侧永不阻塞
//! - **A/B 分流策略**: 按 (host, path) 匹配、按请求头取值改写目标组
//! - **EWMA 负载均衡**: 延迟感知的端点选择，统计数据按 worker 隔离
//! - **注解解析**: 从路由规则元数据宽松解析并校验分流策略
//! - **配置热重载**: 引导配置变更后自动重新播种共享状态
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use fluxgate::config::Config;
//! use fluxgate::store::SharedStateStore;
//! use fluxgate::worker::Worker;
//! use hyper::header::HeaderMap;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file_with_env("config.toml").await?;
//!     let store = Arc::new(SharedStateStore::new());
//!     fluxgate::sync::seed_backends(&store, &config.upstreams)?;
//!
//!     let mut worker = Worker::new(0, Arc::clone(&store));
//!     if let Some(decision) = worker.decide("example.com", "/a", &HeaderMap::new(), "web") {
//!         println!("路由到 {} ({})", decision.endpoint, decision.group);
//!     }
//!     Ok(())
//! }
//! ```

pub mod annotations;
pub mod balancer;
pub mod config;
pub mod diversion;
pub mod error;
pub mod policy;
pub mod store;
pub mod sync;
pub mod worker;

// Re-export commonly used types
pub use balancer::GroupBalancer;
pub use error::{ErrorSeverity, FluxgateError, FluxgateResult};
pub use policy::{DiversionType, Policy, PolicyBackend};
pub use store::{SharedStateStore, Snapshot};
pub use worker::{RouteDecision, Worker, WorkerCache};
