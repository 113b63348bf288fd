// src/hal/http_driver.rs
//! HTTP polling transport tier

use crate::config::ServiceConfig;
use crate::error::{EmotiBitError, EmotiBitResult, IntoTransportError};
use crate::hal::{AcquisitionStrategy, ConnectOutcome, SharedSink, TransportKind};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Probes an HTTP endpoint once, then polls it at the sample rate
#[derive(Clone)]
pub struct HttpPollingStrategy {
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
    poll_interval: Duration,
    client: Client,
}

impl std::fmt::Debug for HttpPollingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPollingStrategy")
            .field("endpoint", &self.endpoint)
            .field("authenticated", &self.api_key.is_some())
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl HttpPollingStrategy {
    pub fn new(endpoint: impl Into<String>, timeout: Duration, poll_interval: Duration) -> EmotiBitResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key: None,
            timeout,
            poll_interval,
            client,
        })
    }

    pub fn from_config(config: &ServiceConfig) -> EmotiBitResult<Self> {
        let strategy = Self::new(
            config.http_endpoint.clone(),
            config.connect_timeout(),
            config.poll_interval(),
        )?;
        Ok(match &config.http_api_key {
            Some(key) => strategy.with_api_key(key.clone()),
            None => strategy,
        })
    }

    /// Authenticate the probe and every poll with a bearer token
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn setup_error(&self, err: reqwest::Error) -> EmotiBitError {
        if err.is_timeout() {
            EmotiBitError::Timeout {
                transport: TransportKind::Http,
                after_ms: self.timeout.as_millis() as u64,
            }
        } else {
            err.into()
        }
    }
}

#[async_trait]
impl AcquisitionStrategy for HttpPollingStrategy {
    fn transport(&self) -> TransportKind {
        TransportKind::Http
    }

    async fn try_connect(&self, sink: SharedSink) -> ConnectOutcome {
        debug!(endpoint = %self.endpoint, "Probing HTTP endpoint");

        let probe = authorized(&self.client, &self.endpoint, self.api_key.as_deref());
        let response = match probe.send().await {
            Ok(response) => response,
            Err(err) => return ConnectOutcome::Unavailable(self.setup_error(err)),
        };

        let status = response.status();
        if !status.is_success() {
            return ConnectOutcome::Unavailable(EmotiBitError::TransportSetup {
                transport: TransportKind::Http,
                reason: format!("probe returned HTTP {}", status),
            });
        }

        info!(
            endpoint = %self.endpoint,
            poll_ms = self.poll_interval.as_millis() as u64,
            "HTTP endpoint reachable, polling"
        );
        ConnectOutcome::Connected(Box::pin(poll_endpoint(
            self.client.clone(),
            self.endpoint.clone(),
            self.api_key.clone(),
            self.poll_interval,
            sink,
        )))
    }
}

fn authorized(client: &Client, endpoint: &str, api_key: Option<&str>) -> RequestBuilder {
    let request = client.get(endpoint);
    match api_key {
        Some(key) => request.bearer_auth(key),
        None => request,
    }
}

async fn poll_endpoint(
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    period: Duration,
    sink: SharedSink,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if !sink.is_active() {
            return;
        }

        match fetch_payload(&client, &endpoint, api_key.as_deref()).await {
            Ok(Some(payload)) => {
                if !sink.ingest(&payload) {
                    return;
                }
            }
            Ok(None) => {}
            Err(err) => {
                sink.fail(err);
                return;
            }
        }
    }
}

/// One poll. Transport errors are fatal; bad status or body skips the tick.
async fn fetch_payload(client: &Client, endpoint: &str, api_key: Option<&str>) -> EmotiBitResult<Option<Value>> {
    let response = authorized(client, endpoint, api_key)
        .send()
        .await
        .transport_err(TransportKind::Http)?;

    let status = response.status();
    if !status.is_success() {
        debug!(%status, "Skipping poll with non-success status");
        return Ok(None);
    }

    match response.json::<Value>().await {
        Ok(payload) => Ok(Some(payload)),
        Err(err) => {
            warn!(error = %err, "Dropping malformed HTTP payload");
            Ok(None)
        }
    }
}
