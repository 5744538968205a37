//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Response;
use switchyard::config::ServerConfig;
use switchyard::http::HttpServer;
use switchyard::lifecycle::Shutdown;
use switchyard::{Engine, ServerError};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A server bound to an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server task to finish.
    pub async fn stop(self) -> Result<(), ServerError> {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
    }
}

/// Serve `engine` on 127.0.0.1 with an OS-assigned port.
pub async fn spawn_server(engine: Engine, config: ServerConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(Arc::new(engine), &config);
    let receiver = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, receiver).await });
    TestServer {
        addr,
        shutdown,
        handle,
    }
}

/// Client that never reuses connections, so each request sees a fresh socket.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
