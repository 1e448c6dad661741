//! # 配置同步通道模块
//!
//! 控制面与数据面之间的进程组内通道：控制面通过 POST 把完整的
//! 策略/后端载荷推进共享状态存储,工作线程再按版本号惰性拉取。
//! GET 返回当前原始载荷,便于控制面核对已生效的状态。

pub mod handlers;
pub mod server;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::BackendGroup;
use crate::error::FluxgateResult;
use crate::store::{SharedStateStore, KEY_BACKENDS};

pub use handlers::handle_sync;
pub use server::run_sync_server;

/// Spawns the sync endpoint as a background task.
pub async fn start_sync_server(
    addr: SocketAddr,
    store: Arc<SharedStateStore>,
    shutdown: watch::Receiver<bool>,
) -> Result<JoinHandle<()>> {
    let handle = tokio::spawn(async move {
        if let Err(e) = run_sync_server(addr, store, shutdown).await {
            tracing::error!("Configuration sync endpoint error: {}", e);
        }
    });

    Ok(handle)
}

/// Seeds the store's backend key from bootstrap configuration.
///
/// Uses the same wire shape the control plane pushes, so workers cannot
/// tell seeded groups from pushed ones. Called once at startup and again
/// after each configuration reload.
pub fn seed_backends(store: &SharedStateStore, groups: &[BackendGroup]) -> FluxgateResult<u64> {
    let payload = serde_json::to_vec(groups)?;
    let version = store.set(KEY_BACKENDS, payload)?;
    info!(
        "Seeded {} backend group(s) into shared state at version {}",
        groups.len(),
        version
    );
    Ok(version)
}
