//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use frontdoor::config::parse_config;
use frontdoor::lifecycle::{Gateway, StartupError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Start a simple mock backend that returns a fixed response.
pub async fn start_mock_backend(addr: SocketAddr, response: &'static str) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = read_head(&mut socket).await;
                respond(&mut socket, response).await;
            });
        }
    });
}

/// Start a mock backend that answers with the request head it received
/// (request line and headers), lowercased.
pub async fn start_echo_backend(addr: SocketAddr) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let head = read_head(&mut socket).await.to_lowercase();
                respond(&mut socket, &head).await;
            });
        }
    });
}

async fn read_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

async fn respond(socket: &mut TcpStream, body: &str) {
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// A gateway serving in the background.
pub struct RunningGateway {
    stop: oneshot::Sender<()>,
    task: JoinHandle<Result<(), StartupError>>,
}

impl RunningGateway {
    /// Signal shutdown and wait for every frontend to finish.
    pub async fn stop(self) -> Result<(), StartupError> {
        let _ = self.stop.send(());
        self.task.await.unwrap()
    }
}

/// Build a gateway from TOML and serve it until stopped.
pub async fn start_gateway(config: &str) -> RunningGateway {
    let config = parse_config(config).unwrap();
    let gateway = Gateway::build(&config, None).await.unwrap();
    let (stop, rx) = oneshot::channel::<()>();
    let task = tokio::spawn(gateway.run_until(async {
        let _ = rx.await;
    }));

    // Give the listeners time to bind.
    tokio::time::sleep(Duration::from_millis(300)).await;
    RunningGateway { stop, task }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
