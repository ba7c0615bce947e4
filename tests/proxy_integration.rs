//! End-to-end tests of the HTTP front end against mock backends.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use tower::ServiceExt;

use vhost_router::config::{ProxyConfig, SubdomainPolicy};
use vhost_router::routing::Router;
use vhost_router::{HttpServer, Shutdown};

mod common;
use common::{backend, empty_config, route};

async fn body_text(res: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(host: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("host", host)
        .body(Body::empty())
        .unwrap()
}

async fn site_config() -> ProxyConfig {
    let web = common::start_echo_backend("web").await;
    let api = common::start_echo_backend("api").await;
    let live = common::start_echo_backend("live").await;

    let mut config = empty_config();
    config.backends = vec![
        backend("web", web, &["/socket"]),
        backend("api", api, &[]),
        backend("live", live, &["/live"]),
    ];
    config.routes = vec![
        route("site", "web", Some("example.com"), SubdomainPolicy::Both, None),
        route("oauth", "api", Some("example.com"), SubdomainPolicy::Exclude, Some("/v1")),
        route("live", "live", None, SubdomainPolicy::Exclude, Some("/live")),
    ];
    config
}

#[tokio::test]
async fn test_forwards_by_host_and_path() {
    let config = site_config().await;
    let router = Router::from_config(&config).unwrap().into_shared();
    let app = HttpServer::new(config, router).app();

    let res = app.clone().oneshot(get("example.com", "/v1/users?page=2")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_text(res).await, "api /v1/users?page=2 example.com");

    let res = app.clone().oneshot(get("example.com", "/v2")).await.unwrap();
    assert_eq!(body_text(res).await, "web /v2 example.com");

    let res = app.clone().oneshot(get("shop.example.com:8080", "/v1")).await.unwrap();
    assert_eq!(body_text(res).await, "web /v1 shop.example.com:8080");

    let res = app.clone().oneshot(get("elsewhere.net", "/live/feed")).await.unwrap();
    assert_eq!(body_text(res).await, "live /live/feed elsewhere.net");
}

#[tokio::test]
async fn test_unmatched_without_default_is_404() {
    let config = site_config().await;
    let router = Router::from_config(&config).unwrap().into_shared();
    let app = HttpServer::new(config, router).app();

    let res = app.oneshot(get("elsewhere.net", "/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unmatched_goes_to_default() {
    let mut config = site_config().await;
    config.router.default_backend = Some("web".into());
    let router = Router::from_config(&config).unwrap().into_shared();
    let app = HttpServer::new(config, router).app();

    let res = app.oneshot(get("elsewhere.net", "/anything")).await.unwrap();
    assert_eq!(body_text(res).await, "web /anything elsewhere.net");
}

#[tokio::test]
async fn test_request_id_is_generated_and_preserved() {
    let config = site_config().await;
    let router = Router::from_config(&config).unwrap().into_shared();
    let app = HttpServer::new(config, router).app();

    let res = app.clone().oneshot(get("example.com", "/")).await.unwrap();
    let id = res.headers().get("x-request-id").expect("request id").to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());

    let req = Request::builder()
        .uri("/")
        .header("host", "example.com")
        .header("x-request-id", "client-chosen")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.headers().get("x-request-id").unwrap(), "client-chosen");
}

#[tokio::test]
async fn test_unreachable_backend_is_502() {
    let closed: SocketAddr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let mut config = empty_config();
    config.backends = vec![backend("gone", closed, &[])];
    config.router.default_backend = Some("gone".into());
    let router = Router::from_config(&config).unwrap().into_shared();
    let app = HttpServer::new(config, router).app();

    let res = app.oneshot(get("example.com", "/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_slow_backend_is_504() {
    let stalled = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = stalled.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = stalled.accept().await {
            held.push(socket);
        }
    });

    let mut config = empty_config();
    config.timeouts.request_secs = 1;
    config.backends = vec![backend("slow", addr, &[])];
    config.router.default_backend = Some("slow".into());
    let router = Router::from_config(&config).unwrap().into_shared();
    let app = HttpServer::new(config, router).app();

    let res = app.oneshot(get("example.com", "/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_swapped_router_takes_effect() {
    let mut config = site_config().await;
    let shared = Router::from_config(&config).unwrap().into_shared();
    let app = HttpServer::new(config.clone(), shared.clone()).app();

    let res = app.clone().oneshot(get("example.com", "/v1")).await.unwrap();
    assert_eq!(body_text(res).await, "api /v1 example.com");

    config.routes.retain(|r| r.name != "oauth");
    shared.store(Arc::new(Router::from_config(&config).unwrap()));

    let res = app.oneshot(get("example.com", "/v1")).await.unwrap();
    assert_eq!(body_text(res).await, "web /v1 example.com");
}

#[tokio::test]
async fn test_serves_over_tcp_until_shutdown() {
    let config = site_config().await;
    let router = Router::from_config(&config).unwrap().into_shared();
    let server = HttpServer::new(config, router);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let client = Client::builder(TokioExecutor::new()).build_http::<Body>();
    let req = Request::builder()
        .uri(format!("http://{}/live/x", addr))
        .header("host", "elsewhere.net")
        .body(Body::empty())
        .unwrap();
    let res = client.request(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_text(res.map(Body::new)).await;
    assert_eq!(body, "live /live/x elsewhere.net");

    drop(client);
    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
    assert!(matches!(result, Ok(Ok(Ok(())))));
}
