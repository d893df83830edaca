//! End-to-end tests against a live gateway and mock upstreams.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

#[tokio::test]
async fn test_debug_header_routing() {
    let default_addr: SocketAddr = "127.0.0.1:28181".parse().unwrap();
    let debug_addr: SocketAddr = "127.0.0.1:28182".parse().unwrap();
    common::start_mock_backend(default_addr, "default").await;
    common::start_mock_backend(debug_addr, "debug").await;

    let gateway = common::start_gateway(
        r#"
[[backends]]
name = "default"
[backends.reverse_proxy]
targets = ["http://127.0.0.1:28181"]

[[backends]]
name = "debug"
[backends.reverse_proxy]
targets = ["http://127.0.0.1:28182"]

[[frontends]]
name = "public"
bind = "127.0.0.1"
port = 28183

[[frontends.routes]]
name = "debug"
backend = "debug"
[[frontends.routes.match.header]]
field = "X-Debug"
is = "true"

[[frontends.routes]]
name = "default"
backend = "default"
"#,
    )
    .await;

    let client = common::client();
    let res = client
        .get("http://127.0.0.1:28183/anything")
        .header("X-Debug", "true")
        .send()
        .await
        .expect("Gateway unreachable");
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "debug");

    let res = client
        .get("http://127.0.0.1:28183/anything")
        .header("X-Debug", "false")
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "default");

    let res = client.get("http://127.0.0.1:28183/").send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "default");

    gateway.stop().await.unwrap();
}

#[tokio::test]
async fn test_request_is_rewritten_before_forwarding() {
    let upstream: SocketAddr = "127.0.0.1:28184".parse().unwrap();
    common::start_echo_backend(upstream).await;

    let gateway = common::start_gateway(
        r#"
[[backends]]
name = "api"
[backends.reverse_proxy]
targets = ["http://127.0.0.1:28184"]

[[frontends]]
name = "public"
bind = "127.0.0.1"
port = 28185

[[frontends.routes]]
name = "api"
backend = "api"
[[frontends.routes.match.path]]
has_prefix = "/api/"
[[frontends.routes.modify.path]]
strip_prefix = ["/api"]
[[frontends.routes.modify.header]]
field = "X-Gateway"
set = "frontdoor"
[[frontends.routes.modify.header]]
field = "X-Secret"
remove = true
"#,
    )
    .await;

    let res = common::client()
        .get("http://127.0.0.1:28185/api/users?page=2")
        .header("X-Secret", "hunter2")
        .header("X-Gateway", "client")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let head = res.text().await.unwrap();
    assert!(head.starts_with("get /users?page=2 http/1.1"), "{}", head);
    assert!(head.contains("x-gateway: frontdoor"), "{}", head);
    assert!(!head.contains("x-gateway: client"), "{}", head);
    assert!(!head.contains("x-secret"), "{}", head);
    assert!(head.contains("x-forwarded-for: 127.0.0.1"), "{}", head);

    gateway.stop().await.unwrap();
}

#[tokio::test]
async fn test_unmatched_request_is_not_found() {
    let gateway = common::start_gateway(
        r#"
[[backends]]
name = "files"
[backends.file_server]
root = "."

[[frontends]]
name = "public"
bind = "127.0.0.1"
port = 28186

[[frontends.routes]]
name = "only"
backend = "files"
[[frontends.routes.match.path]]
is = "/only"
"#,
    )
    .await;

    let res = common::client()
        .get("http://127.0.0.1:28186/other")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    assert!(res.text().await.unwrap().is_empty());

    gateway.stop().await.unwrap();
}

#[tokio::test]
async fn test_round_robin_targets() {
    common::start_mock_backend("127.0.0.1:28187".parse().unwrap(), "b1").await;
    common::start_mock_backend("127.0.0.1:28188".parse().unwrap(), "b2").await;

    let gateway = common::start_gateway(
        r#"
[[backends]]
name = "pool"
[backends.reverse_proxy]
targets = ["http://127.0.0.1:28187", "http://127.0.0.1:28188"]

[[frontends]]
name = "public"
bind = "127.0.0.1"
port = 28189

[[frontends.routes]]
name = "default"
backend = "pool"
"#,
    )
    .await;

    let client = common::client();
    let mut bodies = Vec::new();
    for _ in 0..4 {
        let res = client.get("http://127.0.0.1:28189/").send().await.unwrap();
        bodies.push(res.text().await.unwrap());
    }
    assert_eq!(bodies, ["b1", "b2", "b1", "b2"]);

    gateway.stop().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let gateway = common::start_gateway(
        r#"
[[backends]]
name = "dead"
[backends.reverse_proxy]
targets = ["http://127.0.0.1:28190"]

[[frontends]]
name = "public"
bind = "127.0.0.1"
port = 28191

[[frontends.routes]]
name = "default"
backend = "dead"
"#,
    )
    .await;

    let res = common::client()
        .get("http://127.0.0.1:28191/")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 502);

    gateway.stop().await.unwrap();
}

#[tokio::test]
async fn test_graceful_shutdown_releases_port() {
    let gateway = common::start_gateway(
        r#"
[shutdown]
grace_period_secs = 1

[[backends]]
name = "files"
[backends.file_server]
root = "."

[[frontends]]
name = "public"
bind = "127.0.0.1"
port = 28192
"#,
    )
    .await;

    let res = common::client()
        .get("http://127.0.0.1:28192/")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    tokio::time::timeout(Duration::from_secs(5), gateway.stop())
        .await
        .expect("Shutdown took too long")
        .unwrap();

    assert!(common::client()
        .get("http://127.0.0.1:28192/")
        .send()
        .await
        .is_err());
}
