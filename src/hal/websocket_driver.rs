// src/hal/websocket_driver.rs
//! WebSocket transport tier
//!
//! Inbound text frames (and binary frames holding UTF-8) are parsed as JSON
//! and handed to the session sink. A close frame, a socket error or the end
//! of the stream after the handshake is a runtime failure.

use crate::config::ServiceConfig;
use crate::error::{EmotiBitError, IntoTransportError};
use crate::hal::{AcquisitionStrategy, ConnectOutcome, SharedSink, TransportKind};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type ClientStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to a streaming WebSocket endpoint
#[derive(Debug, Clone)]
pub struct WebSocketStrategy {
    url: String,
    timeout: Duration,
}

impl WebSocketStrategy {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.websocket_url.clone(), config.connect_timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AcquisitionStrategy for WebSocketStrategy {
    fn transport(&self) -> TransportKind {
        TransportKind::WebSocket
    }

    async fn try_connect(&self, sink: SharedSink) -> ConnectOutcome {
        debug!(url = %self.url, timeout_ms = self.timeout.as_millis() as u64, "Opening WebSocket");

        match tokio::time::timeout(self.timeout, connect_async(self.url.as_str())).await {
            Err(_) => ConnectOutcome::Unavailable(EmotiBitError::Timeout {
                transport: TransportKind::WebSocket,
                after_ms: self.timeout.as_millis() as u64,
            }),
            Ok(Err(err)) => ConnectOutcome::Unavailable(err.into()),
            Ok(Ok((stream, _response))) => {
                info!(url = %self.url, "WebSocket connected");
                ConnectOutcome::Connected(Box::pin(read_frames(stream, sink)))
            }
        }
    }
}

async fn read_frames(mut stream: ClientStream, sink: SharedSink) {
    while let Some(frame) = stream.next().await {
        let message = match frame.transport_err(TransportKind::WebSocket) {
            Ok(message) => message,
            Err(err) => {
                sink.fail(err);
                return;
            }
        };

        let text = match message {
            Message::Text(text) => text,
            Message::Binary(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    debug!("Ignoring non-UTF-8 binary frame");
                    continue;
                }
            },
            Message::Close(frame) => {
                let reason = frame
                    .map(|f| format!("closed by peer ({}): {}", f.code, f.reason))
                    .unwrap_or_else(|| "closed by peer".to_string());
                sink.fail(EmotiBitError::TransportRuntime {
                    transport: TransportKind::WebSocket,
                    reason,
                });
                return;
            }
            _ => continue,
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(payload) => {
                if !sink.ingest(&payload) {
                    debug!("WebSocket session ended, closing reader");
                    return;
                }
            }
            Err(err) => warn!(error = %err, "Dropping malformed WebSocket message"),
        }
    }

    sink.fail(EmotiBitError::TransportRuntime {
        transport: TransportKind::WebSocket,
        reason: "stream ended".to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::tests::RecordingSink;
    use futures::SinkExt;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    async fn serve_frames(frames: Vec<Message>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            for frame in frames {
                ws.send(frame).await.unwrap();
            }
            let _ = ws.close(None).await;
        });
        format!("ws://{}/emotibit", addr)
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let strategy = WebSocketStrategy::new("ws://127.0.0.1:1/emotibit", Duration::from_millis(500));
        let sink = Arc::new(RecordingSink::default());
        match strategy.try_connect(sink).await {
            ConnectOutcome::Unavailable(err) => assert_eq!(err.transport(), Some(TransportKind::WebSocket)),
            other => panic!("Expected unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unanswered_handshake_times_out() {
        // accepts TCP but never completes the upgrade
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let strategy = WebSocketStrategy::new(format!("ws://{}/emotibit", addr), Duration::from_millis(150));
        let sink = Arc::new(RecordingSink::default());
        let started = tokio::time::Instant::now();

        match strategy.try_connect(sink.clone()).await {
            ConnectOutcome::Unavailable(EmotiBitError::Timeout { transport, after_ms }) => {
                assert_eq!(transport, TransportKind::WebSocket);
                assert_eq!(after_ms, 150);
            }
            other => panic!("Expected timeout, got {:?}", other),
        }
        assert!(started.elapsed() >= Duration::from_millis(150));
        assert_eq!(sink.failure_count(), 0);
    }

    #[tokio::test]
    async fn test_frames_are_ingested_then_close_fails() {
        let url = serve_frames(vec![
            Message::Text(r#"{"hr": 82, "eda": 0.4}"#.to_string()),
            Message::Text("not json".to_string()),
            Message::Binary(br#"{"heartRate": 90}"#.to_vec()),
        ])
        .await;

        let strategy = WebSocketStrategy::new(url, Duration::from_secs(2));
        let sink = Arc::new(RecordingSink::default());
        let reader = match strategy.try_connect(sink.clone()).await {
            ConnectOutcome::Connected(reader) => reader,
            other => panic!("Expected connection, got {:?}", other),
        };
        reader.await;

        let payloads = sink.payloads.lock();
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0]["hr"], 82);
        assert_eq!(payloads[1]["heartRate"], 90);
        assert_eq!(sink.failure_count(), 1);
        assert!(sink.failures.lock()[0].triggers_fallback());
    }

    #[tokio::test]
    async fn test_inactive_sink_stops_reader_quietly() {
        let url = serve_frames(vec![
            Message::Text(r#"{"hr": 70}"#.to_string()),
            Message::Text(r#"{"hr": 71}"#.to_string()),
        ])
        .await;

        let strategy = WebSocketStrategy::new(url, Duration::from_secs(2));
        let sink = Arc::new(RecordingSink::default());
        sink.close();
        if let ConnectOutcome::Connected(reader) = strategy.try_connect(sink.clone()).await {
            reader.await;
        }
        assert_eq!(sink.payload_count(), 0);
        assert_eq!(sink.failure_count(), 0);
    }
}
