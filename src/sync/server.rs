use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::Server;
use tokio::sync::watch;
use tracing::info;

use super::handlers::handle_sync;
use crate::store::SharedStateStore;

/// 启动配置同步通道的 HTTP 服务并一直运行到收到关闭信号
///
/// 这个端点只面向同进程组的控制面,不属于对外代理面。
pub async fn run_sync_server(
    addr: SocketAddr,
    store: Arc<SharedStateStore>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let service = make_service_fn(move |_conn: &AddrStream| {
        let store = Arc::clone(&store);
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                handle_sync(req, Arc::clone(&store))
            }))
        }
    });

    let server = Server::try_bind(&addr)?.serve(service);
    info!("Configuration sync endpoint listening on {}", addr);

    let graceful = server.with_graceful_shutdown(async move {
        let _ = shutdown.changed().await;
        info!("Configuration sync endpoint shutting down");
    });

    graceful.await?;
    Ok(())
}
