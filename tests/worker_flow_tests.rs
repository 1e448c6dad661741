use std::collections::HashMap;
use std::sync::Arc;

use fluxgate::annotations;
use fluxgate::config::{BackendGroup, ConfigManager, Endpoint};
use fluxgate::store::SharedStateStore;
use fluxgate::sync::{handle_sync, seed_backends};
use fluxgate::worker::Worker;
use hyper::header::{HeaderMap, HeaderValue};
use hyper::{Body, Request, StatusCode};

fn create_test_group(name: &str, algorithm: &str, addresses: &[&str]) -> BackendGroup {
    BackendGroup {
        name: name.to_string(),
        algorithm: algorithm.to_string(),
        endpoints: addresses
            .iter()
            .map(|address| Endpoint {
                address: address.to_string(),
                port: 8080,
                max_fails: 3,
                fail_timeout: 10,
            })
            .collect(),
    }
}

async fn push(store: &Arc<SharedStateStore>, path: &str, payload: String) {
    let req = Request::builder()
        .method("POST")
        .uri(path)
        .body(Body::from(payload))
        .unwrap();
    let resp = handle_sync(req, Arc::clone(store)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
}

async fn push_groups(store: &Arc<SharedStateStore>, groups: &[BackendGroup]) {
    let payload = serde_json::to_string(groups).unwrap();
    push(store, "/configuration/backends", payload).await;
}

fn headers_with(name: &'static str, value: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(name, HeaderValue::from_static(value));
    headers
}

fn region_metadata() -> HashMap<String, String> {
    [
        ("abpolicy", "true"),
        ("abpolicy-host", "example.com"),
        ("abpolicy-path", "/a"),
        ("abpolicy-type", "header"),
        ("abpolicy-header", "x-region"),
        (
            "abpolicy-backends",
            r#"[{"name": "stream_a", "header": "shanghai"}, {"name": "stream_b", "header": "beijing"}]"#,
        ),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[tokio::test]
async fn test_annotation_to_decision_flow() {
    // Control-plane side: one routing rule's metadata becomes a policy.
    let policy = annotations::parse(&region_metadata()).unwrap();
    let payload = serde_json::to_string(&vec![policy]).unwrap();
    // The enabled flag stays control-plane-internal.
    assert!(!payload.contains("enabled"));

    // Data-plane side: seed backends, push the policy, decide.
    let store = Arc::new(SharedStateStore::new());
    seed_backends(
        &store,
        &[
            create_test_group("web", "ewma", &["10.0.0.1"]),
            create_test_group("stream_a", "ewma", &["10.0.1.1"]),
            create_test_group("stream_b", "ewma", &["10.0.2.1"]),
        ],
    )
    .unwrap();
    push(&store, "/configuration/policies", payload).await;

    let mut worker = Worker::new(0, Arc::clone(&store));

    let decision = worker
        .decide("example.com", "/a", &headers_with("x-region", "shanghai"), "web")
        .unwrap();
    assert_eq!(decision.group, "stream_a");
    assert_eq!(decision.endpoint, "10.0.1.1:8080");
    assert!(decision.diverted);

    let decision = worker
        .decide("example.com", "/a", &headers_with("x-region", "beijing"), "web")
        .unwrap();
    assert_eq!(decision.group, "stream_b");

    // No mapping for this value: ordinary balancing in the default group.
    let decision = worker
        .decide("example.com", "/a", &headers_with("x-region", "chengdu"), "web")
        .unwrap();
    assert_eq!(decision.group, "web");
    assert!(!decision.diverted);
}

#[tokio::test]
async fn test_policies_on_other_routes_leave_requests_alone() {
    let store = Arc::new(SharedStateStore::new());
    seed_backends(&store, &[create_test_group("web", "ewma", &["10.0.0.1"])]).unwrap();

    let policy = annotations::parse(&region_metadata()).unwrap();
    push(
        &store,
        "/configuration/policies",
        serde_json::to_string(&vec![policy]).unwrap(),
    )
    .await;

    let mut worker = Worker::new(0, Arc::clone(&store));
    let decision = worker
        .decide("other.com", "/b", &headers_with("x-region", "shanghai"), "web")
        .unwrap();

    assert_eq!(decision.group, "web");
    assert!(!decision.diverted);
}

#[tokio::test]
async fn test_latency_observations_shift_selection() {
    let store = Arc::new(SharedStateStore::new());
    seed_backends(
        &store,
        &[create_test_group("web", "ewma", &["10.0.0.1", "10.0.0.2"])],
    )
    .unwrap();

    let mut worker = Worker::new(0, Arc::clone(&store));
    worker.reconcile();

    worker.observe("web", "10.0.0.1:8080", 0.8);
    worker.observe("web", "10.0.0.2:8080", 0.05);

    let decision = worker
        .decide("example.com", "/", &HeaderMap::new(), "web")
        .unwrap();
    assert_eq!(decision.endpoint, "10.0.0.2:8080");
}

#[tokio::test]
async fn test_scale_up_push_prefers_unobserved_endpoint() {
    let store = Arc::new(SharedStateStore::new());
    push_groups(&store, &[create_test_group("web", "ewma", &["10.0.0.1", "10.0.0.2"])]).await;

    let mut worker = Worker::new(0, Arc::clone(&store));
    worker.reconcile();
    worker.observe("web", "10.0.0.1:8080", 0.1);
    worker.observe("web", "10.0.0.2:8080", 0.2);

    push_groups(
        &store,
        &[create_test_group("web", "ewma", &["10.0.0.1", "10.0.0.2", "10.0.0.3"])],
    )
    .await;

    let decision = worker
        .decide("example.com", "/", &HeaderMap::new(), "web")
        .unwrap();
    assert_eq!(decision.endpoint, "10.0.0.3:8080");
}

#[tokio::test]
async fn test_scale_down_push_discards_departed_stats() {
    let store = Arc::new(SharedStateStore::new());
    push_groups(&store, &[create_test_group("web", "ewma", &["10.0.0.1", "10.0.0.2"])]).await;

    let mut worker = Worker::new(0, Arc::clone(&store));
    worker.reconcile();
    worker.observe("web", "10.0.0.1:8080", 0.1);
    worker.observe("web", "10.0.0.2:8080", 0.9);

    // Scale down past the slow endpoint, then bring it back.
    push_groups(&store, &[create_test_group("web", "ewma", &["10.0.0.1"])]).await;
    let decision = worker
        .decide("example.com", "/", &HeaderMap::new(), "web")
        .unwrap();
    assert_eq!(decision.endpoint, "10.0.0.1:8080");

    push_groups(&store, &[create_test_group("web", "ewma", &["10.0.0.1", "10.0.0.2"])]).await;

    // Its history went with it: the re-added endpoint counts as fresh and
    // is preferred over the endpoint with a recorded score.
    let decision = worker
        .decide("example.com", "/", &HeaderMap::new(), "web")
        .unwrap();
    assert_eq!(decision.endpoint, "10.0.0.2:8080");
}

#[tokio::test]
async fn test_algorithm_switch_push_rebuilds_balancer() {
    let store = Arc::new(SharedStateStore::new());
    push_groups(&store, &[create_test_group("web", "ewma", &["10.0.0.1", "10.0.0.2"])]).await;

    let mut worker = Worker::new(0, Arc::clone(&store));
    worker.reconcile();
    assert_eq!(worker.balancer("web").unwrap().algorithm(), "ewma");

    push_groups(
        &store,
        &[create_test_group("web", "round_robin", &["10.0.0.1", "10.0.0.2"])],
    )
    .await;

    let first = worker
        .decide("example.com", "/", &HeaderMap::new(), "web")
        .unwrap();
    let second = worker
        .decide("example.com", "/", &HeaderMap::new(), "web")
        .unwrap();

    assert_eq!(worker.balancer("web").unwrap().algorithm(), "round_robin");
    assert_ne!(first.endpoint, second.endpoint);
}

#[tokio::test]
async fn test_workers_learn_independently() {
    let store = Arc::new(SharedStateStore::new());
    push_groups(&store, &[create_test_group("web", "ewma", &["10.0.0.1", "10.0.0.2"])]).await;

    let mut busy = Worker::new(0, Arc::clone(&store));
    let mut idle = Worker::new(1, Arc::clone(&store));
    busy.reconcile();
    idle.reconcile();

    busy.observe("web", "10.0.0.1:8080", 0.9);
    busy.observe("web", "10.0.0.2:8080", 0.1);

    let busy_pick = busy
        .decide("example.com", "/", &HeaderMap::new(), "web")
        .unwrap();
    let idle_pick = idle
        .decide("example.com", "/", &HeaderMap::new(), "web")
        .unwrap();

    // Statistics never cross worker boundaries.
    assert_eq!(busy_pick.endpoint, "10.0.0.2:8080");
    assert_eq!(idle_pick.endpoint, "10.0.0.1:8080");
}

#[tokio::test]
async fn test_hot_reload_reseeds_running_workers() {
    use std::io::{Seek, Write};
    use tempfile::NamedTempFile;

    fn write_config(temp_file: &mut NamedTempFile, address: &str) {
        let content = format!(
            r#"
[server]
bind = "127.0.0.1:10246"

[[upstreams]]
name = "web"

[[upstreams.endpoints]]
address = "{}"
port = 8080
"#,
            address
        );
        temp_file.as_file_mut().set_len(0).unwrap();
        temp_file.as_file_mut().rewind().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
    }

    let mut temp_file = NamedTempFile::new().unwrap();
    write_config(&mut temp_file, "10.0.0.1");

    let store = Arc::new(SharedStateStore::new());
    let mut manager = ConfigManager::new(temp_file.path()).await.unwrap();
    manager.set_store_reseed(Arc::clone(&store));
    seed_backends(&store, &manager.get_config().upstreams).unwrap();

    let mut worker = Worker::new(0, Arc::clone(&store));
    let decision = worker
        .decide("example.com", "/", &HeaderMap::new(), "web")
        .unwrap();
    assert_eq!(decision.endpoint, "10.0.0.1:8080");

    write_config(&mut temp_file, "10.0.9.9");
    manager.reload_config().await.unwrap();

    let decision = worker
        .decide("example.com", "/", &HeaderMap::new(), "web")
        .unwrap();
    assert_eq!(decision.endpoint, "10.0.9.9:8080");
}
