// src/bridge/server.rs
//! HTTP and WebSocket endpoints of the bridge, plus the CSV monitor task

use crate::bridge::{BridgePayload, CsvSource};
use crate::config::constants::paths::DEFAULT_CSV_FILE;
use crate::error::EmotiBitResult;
use crate::hal::BiometricSimulator;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use parking_lot::RwLock;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Bridge runtime settings
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub csv_path: PathBuf,
    /// Delay between CSV reads
    pub refresh_interval: Duration,
    /// Delay after a failed read
    pub error_backoff: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from(DEFAULT_CSV_FILE),
            refresh_interval: Duration::from_secs(1),
            error_backoff: Duration::from_secs(5),
        }
    }
}

/// Shared state behind every handler and the monitor
pub struct BridgeState {
    config: BridgeConfig,
    csv: CsvSource,
    simulator: BiometricSimulator,
    latest: RwLock<Option<BridgePayload>>,
    tx: broadcast::Sender<String>,
}

impl BridgeState {
    pub fn new(config: BridgeConfig) -> Arc<Self> {
        let (tx, _) = broadcast::channel(64);
        Arc::new(Self {
            csv: CsvSource::new(config.csv_path.clone()),
            simulator: BiometricSimulator::system(),
            latest: RwLock::new(None),
            tx,
            config,
        })
    }

    pub fn csv(&self) -> &CsvSource {
        &self.csv
    }

    pub fn latest(&self) -> Option<BridgePayload> {
        self.latest.read().clone()
    }

    /// Re-read the CSV and store its last row.
    ///
    /// A missing file is replaced by the sample file; the new rows are
    /// picked up on the next refresh.
    pub fn refresh(&self) -> EmotiBitResult<Option<BridgePayload>> {
        if self.csv.ensure_exists()? {
            return Ok(None);
        }

        let Some(row) = self.csv.read_latest()? else {
            return Ok(None);
        };
        let payload = BridgePayload::from_row(&row, self.simulator.now_millis());
        *self.latest.write() = Some(payload.clone());
        Ok(Some(payload))
    }

    /// Payload for `/api/emotibit`: latest row, a fresh read, or a simulated reading
    pub fn current_payload(&self) -> EmotiBitResult<BridgePayload> {
        if let Some(payload) = self.latest() {
            return Ok(payload);
        }
        match self.refresh()? {
            Some(payload) => Ok(payload),
            None => Ok(self.simulated_payload()),
        }
    }

    /// Append one simulated row to the CSV
    pub fn simulate(&self) -> EmotiBitResult<BridgePayload> {
        let payload = self.simulated_payload();
        self.csv.append(&payload.to_row())?;
        Ok(payload)
    }

    /// [`current_payload`](Self::current_payload) with any file access moved
    /// to the blocking pool; a cached payload is returned without touching it
    pub async fn load_payload(self: &Arc<Self>) -> EmotiBitResult<BridgePayload> {
        if let Some(payload) = self.latest() {
            return Ok(payload);
        }
        run_blocking(self, |state| state.current_payload()).await
    }

    fn simulated_payload(&self) -> BridgePayload {
        BridgePayload::from_simulated(&self.simulator.generate())
    }

    fn publish(&self, payload: &BridgePayload) {
        match serde_json::to_string(payload) {
            // no subscribers is not an error
            Ok(json) => {
                let _ = self.tx.send(json);
            }
            Err(err) => warn!(error = %err, "Failed to encode bridge payload"),
        }
    }
}

/// Run CSV work on the blocking pool
async fn run_blocking<T, F>(state: &Arc<BridgeState>, work: F) -> EmotiBitResult<T>
where
    T: Send + 'static,
    F: FnOnce(&BridgeState) -> EmotiBitResult<T> + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || work(&state))
        .await
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?
}

/// Routes served by the bridge
pub fn router(state: Arc<BridgeState>) -> Router {
    Router::new()
        .route("/api/emotibit", get(latest_reading).post(latest_reading))
        .route("/api/emotibit/status", get(status))
        .route("/api/emotibit/simulate", post(simulate))
        .route("/emotibit", get(ws_handler))
        .with_state(state)
}

/// Re-read the CSV forever, pushing each result to WebSocket clients
pub async fn run_monitor(state: Arc<BridgeState>) {
    info!(path = %state.csv.path().display(), "Monitoring EmotiBit CSV file");

    loop {
        let delay = match run_blocking(&state, |state| state.refresh()).await {
            Ok(_) => state.config.refresh_interval,
            Err(err) => {
                warn!(error = %err, "CSV read failed, serving simulated data");
                *state.latest.write() = Some(state.simulated_payload());
                state.config.error_backoff
            }
        };

        if let Some(payload) = state.latest() {
            state.publish(&payload);
        }
        tokio::time::sleep(delay).await;
    }
}

/// Start the monitor and serve the router until the listener fails
pub async fn serve(listener: TcpListener, state: Arc<BridgeState>) -> std::io::Result<()> {
    let monitor = tokio::spawn(run_monitor(state.clone()));
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Bridge listening");
    }

    let result = axum::serve(listener, router(state)).await;
    monitor.abort();
    result
}

async fn latest_reading(State(state): State<Arc<BridgeState>>) -> impl IntoResponse {
    match state.load_payload().await {
        Ok(payload) => (StatusCode::OK, Json(payload)),
        Err(err) => {
            warn!(error = %err, "Serving error fallback payload");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(BridgePayload::error_fallback(err.to_string(), state.simulator.now_millis())),
            )
        }
    }
}

async fn status(State(state): State<Arc<BridgeState>>) -> impl IntoResponse {
    Json(json!({
        "csv_exists": state.csv.exists(),
        "last_update": state.latest().map(|payload| payload.timestamp),
    }))
}

async fn simulate(State(state): State<Arc<BridgeState>>) -> impl IntoResponse {
    match run_blocking(&state, |state| state.simulate()).await {
        Ok(data) => (StatusCode::OK, Json(json!({ "success": true, "data": data }))),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        ),
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<BridgeState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws_client(socket, state))
}

async fn handle_ws_client(mut socket: WebSocket, state: Arc<BridgeState>) {
    let mut rx = state.tx.subscribe();
    debug!("WebSocket client connected");

    if let Some(json) = state.latest().and_then(|payload| serde_json::to_string(&payload).ok()) {
        if socket.send(Message::Text(json)).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            msg = rx.recv() => {
                match msg {
                    Ok(json) => {
                        if socket.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "WebSocket client lagging");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    debug!("WebSocket client disconnected");
}
