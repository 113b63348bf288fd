// tests/common/mod.rs
//! Loopback servers standing in for EmotiBit endpoints

#![allow(dead_code)]

use emotibit_core::ServiceConfig;
use futures::SinkExt;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

/// Nothing listens on port 1
pub const UNREACHABLE_WS: &str = "ws://127.0.0.1:1/emotibit";
pub const UNREACHABLE_HTTP: &str = "http://127.0.0.1:1/api/emotibit";

/// Config with fast ticks and no serial probe
pub fn test_config(websocket_url: &str, http_endpoint: &str) -> ServiceConfig {
    ServiceConfig {
        websocket_url: websocket_url.to_string(),
        http_endpoint: http_endpoint.to_string(),
        serial_port: String::new(),
        connect_timeout_ms: 1_000,
        simulation_interval_ms: 20,
        sample_rate_hz: 50,
        ..Default::default()
    }
}

/// HTTP server answering every request with one response.
///
/// With `max_requests` the listener is dropped after that many requests,
/// so later connections are refused.
pub async fn serve_http(status_line: &'static str, body: &'static str, max_requests: Option<usize>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut served = 0usize;
        while max_requests.map_or(true, |max| served < max) {
            let Ok((mut socket, _)) = listener.accept().await else { return };
            served += 1;
            tokio::spawn(async move {
                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}/api/emotibit", addr)
}

/// Listener that accepts connections and never answers, as `ws://` and
/// `http://` URLs for the same port
pub async fn serve_silent() -> (String, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    (format!("ws://{}/emotibit", addr), format!("http://{}/api/emotibit", addr))
}

/// WebSocket server for a single client: sends `frames` a few ms apart, then
/// either closes the socket or keeps it open for `hold`.
pub async fn serve_ws(frames: Vec<String>, close_after: bool, hold: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let Ok((tcp, _)) = listener.accept().await else { return };
        let Ok(mut ws) = tokio_tungstenite::accept_async(tcp).await else { return };
        for frame in frames {
            if ws.send(Message::Text(frame)).await.is_err() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        if close_after {
            let _ = ws.close(None).await;
        } else {
            tokio::time::sleep(hold).await;
        }
    });

    format!("ws://{}/emotibit", addr)
}
