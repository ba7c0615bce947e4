//! Shared utilities for integration testing.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use vhost_router::config::{BackendConfig, ProxyConfig, RouteConfig, SubdomainPolicy};

/// Start a mock backend on a free loopback port.
///
/// It answers every request with `"<name> <request target> <host header>"`.
#[allow(dead_code)]
pub async fn start_echo_backend(name: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }

                let head = String::from_utf8_lossy(&buf);
                let target = head.split_whitespace().nth(1).unwrap_or("?").to_string();
                let host = head
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("host").then(|| v.trim().to_string())
                    })
                    .unwrap_or_default();

                let body = format!("{} {} {}", name, target, host);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

#[allow(dead_code)]
pub fn backend(name: &str, addr: SocketAddr, sockets: &[&str]) -> BackendConfig {
    BackendConfig {
        name: name.into(),
        address: addr.to_string(),
        sockets: sockets.iter().map(|s| s.to_string()).collect(),
    }
}

#[allow(dead_code)]
pub fn route(name: &str, backend: &str, host: Option<&str>, subdomains: SubdomainPolicy, path: Option<&str>) -> RouteConfig {
    RouteConfig {
        name: name.into(),
        backend: backend.into(),
        host: host.map(Into::into),
        subdomains,
        path_prefix: path.map(Into::into),
    }
}

#[allow(dead_code)]
pub fn empty_config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config
}
