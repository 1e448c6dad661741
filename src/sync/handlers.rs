use std::sync::Arc;

use hyper::{Body, Method, Request, Response, StatusCode};
use tracing::{error, info};

use crate::store::{SharedStateStore, KEY_BACKENDS, KEY_POLICIES};

/// 配置同步通道的请求分发入口
///
/// 路由表刻意保持很小：策略与后端两个配置键的读写,加一个存活探针。
/// 载荷在这里是不透明字节,不做反序列化校验;坏载荷由工作线程侧的
/// 缓存层降级处理,而不是在推送时拒绝。
pub async fn handle_sync(
    req: Request<Body>,
    store: Arc<SharedStateStore>,
) -> Result<Response<Body>, hyper::http::Error> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/configuration/policies") => state_get(&store, KEY_POLICIES),
        (&Method::POST, "/configuration/policies") => state_set(req, &store, KEY_POLICIES).await,
        (&Method::GET, "/configuration/backends") => state_get(&store, KEY_BACKENDS),
        (&Method::POST, "/configuration/backends") => state_set(req, &store, KEY_BACKENDS).await,
        (&Method::GET, "/healthz") => Response::builder()
            .status(StatusCode::OK)
            .body(Body::from("ok")),
        (method, path @ "/configuration/policies")
        | (method, path @ "/configuration/backends") => {
            error!("Rejected {} request for {}", method, path);
            Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .body(Body::from("Only GET and POST requests are allowed"))
        }
        _ => Response::builder().status(StatusCode::NOT_FOUND).body(Body::from(
            "Not found. Available endpoints: /configuration/policies, /configuration/backends, /healthz",
        )),
    }
}

/// 读取某个配置键的当前原始载荷;从未写入时返回空载荷而不是错误。
fn state_get(
    store: &SharedStateStore,
    key: &str,
) -> Result<Response<Body>, hyper::http::Error> {
    let body = store
        .get(key)
        .map(|snapshot| Body::from(snapshot.data))
        .unwrap_or_else(Body::empty);

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(body)
}

/// 用请求体整体替换某个配置键的载荷。
async fn state_set(
    mut req: Request<Body>,
    store: &SharedStateStore,
    key: &str,
) -> Result<Response<Body>, hyper::http::Error> {
    use hyper::body::to_bytes;

    let payload = match to_bytes(req.body_mut()).await {
        Ok(bytes) if !bytes.is_empty() => bytes,
        Ok(_) => {
            error!("Rejected empty {} payload", key);
            return Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .body(Body::from("Empty body"));
        }
        Err(e) => {
            error!("Failed to read {} payload: {}", key, e);
            return Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .body(Body::from("Unable to read request body"));
        }
    };

    match store.set(key, payload) {
        Ok(version) => {
            info!("Replaced {} payload, now at version {}", key, version);
            Response::builder().status(StatusCode::CREATED).body(Body::empty())
        }
        Err(e) => {
            error!("Failed to store {} payload: {}", key, e);
            Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .body(Body::from("Unable to store request body"))
        }
    }
}
