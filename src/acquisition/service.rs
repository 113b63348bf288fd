// src/acquisition/service.rs
//! Biometric acquisition service
//!
//! [`BiometricService`] is a cheap clonable handle. On start it walks the
//! ordered acquisition strategies (WebSocket, HTTP, serial probe) until one
//! connects, and falls back to the procedural simulator when none does or
//! when a live transport breaks later on.
//!
//! Every acquisition session is identified by a generation number. Background
//! tasks carry the generation they were started for and may only write while
//! it is still current; teardown bumps the generation and aborts all tasks
//! before anything new is started. Tasks hold a weak reference, so dropping
//! the last handle aborts everything.

use crate::acquisition::ReadingBuffer;
use crate::config::{ConfigPatch, ServiceConfig};
use crate::error::EmotiBitError;
use crate::hal::{
    parse_serial_line, AcquisitionStrategy, BiometricReading, BiometricSimulator, ConnectOutcome,
    ConnectionStatus, HttpPollingStrategy, ReadingSink, SerialProbeStrategy, SharedSink,
    TransportKind, WebSocketStrategy,
};
use crate::processing::{assemble_reading, PayloadProcessor, TolerantExtractor};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

/// Handle to the acquisition service
#[derive(Clone)]
pub struct BiometricService {
    inner: Arc<ServiceInner>,
}

struct ServiceState {
    connected: bool,
    simulating: bool,
    transport: Option<TransportKind>,
    current: Option<BiometricReading>,
    buffer: ReadingBuffer,
    generation: u64,
}

impl ServiceState {
    fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            connected: self.connected,
            simulating: self.simulating,
            transport: self.transport,
            last_update: self.current.as_ref().map(BiometricReading::timestamp),
        }
    }
}

struct ServiceInner {
    state: Mutex<ServiceState>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    config: RwLock<ServiceConfig>,
    simulator: Arc<BiometricSimulator>,
    processor: RwLock<Arc<dyn PayloadProcessor>>,
    strategies: Option<Vec<Arc<dyn AcquisitionStrategy>>>,
}

/// Configures a [`BiometricService`] before acquisition starts
pub struct ServiceBuilder {
    config: ServiceConfig,
    strategies: Option<Vec<Arc<dyn AcquisitionStrategy>>>,
    simulator: Option<Arc<BiometricSimulator>>,
    processor: Option<Arc<dyn PayloadProcessor>>,
}

impl ServiceBuilder {
    /// Replace the default WebSocket, HTTP, serial sequence
    pub fn strategies(mut self, strategies: Vec<Arc<dyn AcquisitionStrategy>>) -> Self {
        self.strategies = Some(strategies);
        self
    }

    pub fn simulator(mut self, simulator: Arc<BiometricSimulator>) -> Self {
        self.simulator = Some(simulator);
        self
    }

    pub fn processor(mut self, processor: Arc<dyn PayloadProcessor>) -> Self {
        self.processor = Some(processor);
        self
    }

    /// Start acquisition in the background and return immediately
    pub fn build(self) -> BiometricService {
        let service = self.into_service();
        service.start_background();
        service
    }

    /// Run acquisition to completion before returning
    pub async fn connect(self) -> BiometricService {
        let service = self.into_service();
        service.reconnect().await;
        service
    }

    fn into_service(self) -> BiometricService {
        if let Err(err) = self.config.validate() {
            warn!(error = %err, "Service configuration is invalid, affected tiers will fail");
        }

        let buffer = ReadingBuffer::new(self.config.retained_readings());
        let inner = ServiceInner {
            state: Mutex::new(ServiceState {
                connected: false,
                simulating: true,
                transport: None,
                current: None,
                buffer,
                generation: 0,
            }),
            tasks: Mutex::new(Vec::new()),
            config: RwLock::new(self.config),
            simulator: self
                .simulator
                .unwrap_or_else(|| Arc::new(BiometricSimulator::system())),
            processor: RwLock::new(self.processor.unwrap_or_else(|| Arc::new(TolerantExtractor))),
            strategies: self.strategies,
        };

        BiometricService {
            inner: Arc::new(inner),
        }
    }
}

impl BiometricService {
    /// Create the service and start acquisition in the background.
    ///
    /// Must be called from within a Tokio runtime; until acquisition settles
    /// the service reports disconnected and simulating.
    pub fn new(config: ServiceConfig) -> Self {
        Self::builder(config).build()
    }

    /// Create the service and wait for the acquisition sequence to settle
    pub async fn connect(config: ServiceConfig) -> Self {
        Self::builder(config).connect().await
    }

    /// Create the service with an explicit strategy list
    pub fn with_strategies(config: ServiceConfig, strategies: Vec<Arc<dyn AcquisitionStrategy>>) -> Self {
        Self::builder(config).strategies(strategies).build()
    }

    pub fn builder(config: ServiceConfig) -> ServiceBuilder {
        ServiceBuilder {
            config,
            strategies: None,
            simulator: None,
            processor: None,
        }
    }

    /// Latest reading. Never fails.
    ///
    /// With `prefer_real_data` and a live transport, this is the most recent
    /// live reading. Otherwise it is the current reading if there is one, or
    /// a freshly generated simulated reading that is not stored.
    pub fn get_reading(&self, prefer_real_data: bool) -> BiometricReading {
        {
            let state = self.inner.state.lock();
            if let Some(current) = state.current.as_ref() {
                if prefer_real_data && state.connected && !state.simulating {
                    trace!(transport = ?state.transport, "Serving live reading");
                }
                return current.clone();
            }
        }
        self.inner.simulator.generate()
    }

    /// Up to `count` most recent readings, oldest first
    pub fn get_buffered_data(&self, count: usize) -> Vec<BiometricReading> {
        self.inner.state.lock().buffer.latest(count)
    }

    /// Connected over a live transport
    pub fn is_device_connected(&self) -> bool {
        let state = self.inner.state.lock();
        state.connected && !state.simulating
    }

    pub fn is_using_simulation(&self) -> bool {
        self.inner.state.lock().simulating
    }

    pub fn get_connection_status(&self) -> ConnectionStatus {
        self.inner.state.lock().status()
    }

    /// Tear everything down, clear readings and rerun acquisition.
    ///
    /// Returns whether a live transport was established.
    ///
    /// The sequence runs as a service task; dropping the returned future only
    /// stops the wait, acquisition still settles in the background.
    pub async fn reconnect(&self) -> bool {
        if let Some(settled) = self.start_acquisition() {
            // a superseding session aborts the task and drops the sender
            let _ = settled.await;
        }
        self.is_device_connected()
    }

    /// Stop all tasks and sockets and clear readings. Idempotent.
    pub fn disconnect(&self) {
        let generation = self.inner.begin_session(false);
        info!(generation, "Service disconnected");
    }

    /// Merge a partial configuration; takes effect on the next `reconnect`.
    ///
    /// An update that would make the configuration invalid is rejected and
    /// `false` is returned.
    pub fn set_connection_config(&self, patch: ConfigPatch) -> bool {
        let mut config = self.inner.config.write();
        let mut candidate = config.clone();
        candidate.apply(patch);
        match candidate.validate() {
            Ok(()) => {
                *config = candidate;
                debug!("Connection configuration updated");
                true
            }
            Err(err) => {
                warn!(error = %err, "Rejected connection configuration update");
                false
            }
        }
    }

    pub fn config(&self) -> ServiceConfig {
        self.inner.config.read().clone()
    }

    /// Replace the payload processor used for live messages
    pub fn set_payload_processor<P>(&self, processor: P)
    where
        P: PayloadProcessor + 'static,
    {
        *self.inner.processor.write() = Arc::new(processor);
    }

    /// Feed one line read from a serial port the user opened.
    ///
    /// The first accepted line switches the service to the serial transport,
    /// stopping any other source. Returns `false` for unparsable lines.
    pub fn ingest_serial_line(&self, line: &str) -> bool {
        let Some(raw) = parse_serial_line(line) else {
            debug!(line, "Ignoring unparsable serial line");
            return false;
        };
        let reading = assemble_reading(raw, self.inner.simulator.now_millis());

        let switched = {
            let mut state = self.inner.state.lock();
            let switched = state.transport != Some(TransportKind::Serial);
            if switched {
                state.generation += 1;
                state.connected = true;
                state.simulating = false;
                state.transport = Some(TransportKind::Serial);
            }
            state.current = Some(reading.clone());
            state.buffer.push(reading);
            switched
        };

        if switched {
            self.inner.abort_tasks();
            info!("Switched to serial transport");
        }
        true
    }

    fn start_background(&self) {
        self.start_acquisition();
    }

    /// Begin a new session and spawn its acquisition sequence.
    ///
    /// The receiver resolves once the sequence has settled on a transport or
    /// on simulation.
    fn start_acquisition(&self) -> Option<oneshot::Receiver<()>> {
        let generation = self.inner.begin_session(true);
        info!(generation, "Starting acquisition");

        let (settled_tx, settled_rx) = oneshot::channel();
        let weak = Arc::downgrade(&self.inner);
        let sequence = async move {
            run_acquisition(weak, generation).await;
            let _ = settled_tx.send(());
        };

        if self.inner.spawn_task(generation, sequence) {
            Some(settled_rx)
        } else {
            warn!("Acquisition not started; call reconnect from within a Tokio runtime");
            None
        }
    }
}

impl std::fmt::Debug for BiometricService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BiometricService")
            .field("status", &self.get_connection_status())
            .finish_non_exhaustive()
    }
}

impl ServiceInner {
    fn is_current(&self, generation: u64) -> bool {
        self.state.lock().generation == generation
    }

    /// Store a reading for `generation`; `false` if the session has ended
    fn store(&self, generation: u64, reading: BiometricReading) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            return false;
        }
        state.current = Some(reading.clone());
        state.buffer.push(reading);
        true
    }

    /// Invalidate the current session, clear state and stop all tasks.
    ///
    /// `pending` marks an acquisition about to run, which reads as simulating
    /// until it settles; otherwise the service is left idle.
    fn begin_session(&self, pending: bool) -> u64 {
        let generation = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.connected = false;
            state.simulating = pending;
            state.transport = None;
            state.current = None;
            state.buffer.clear();
            state.generation
        };
        self.abort_tasks();
        generation
    }

    fn abort_tasks(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            task.abort();
        }
    }

    /// Spawn a task owned by `generation`; dropped if that session has ended
    fn spawn_task<F>(&self, generation: u64, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            warn!("No Tokio runtime available for background task");
            return false;
        };

        let mut tasks = self.tasks.lock();
        if !self.is_current(generation) {
            return false;
        }
        tasks.retain(|handle| !handle.is_finished());
        tasks.push(runtime.spawn(task));
        true
    }

    fn mark_connected(&self, generation: u64, transport: TransportKind) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            return false;
        }
        state.connected = true;
        state.simulating = false;
        state.transport = Some(transport);
        true
    }

    /// Leave `generation` for a fresh simulation session
    fn enter_simulation(self: &Arc<Self>, generation: u64) {
        let sim_generation = {
            let mut state = self.state.lock();
            if state.generation != generation {
                return;
            }
            state.generation += 1;
            state.connected = false;
            state.simulating = true;
            state.transport = None;
            state.generation
        };
        self.abort_tasks();

        let period = self.config.read().simulation_interval();
        info!(period_ms = period.as_millis() as u64, "Simulation mode active");
        self.spawn_task(
            sim_generation,
            run_simulation(Arc::downgrade(self), sim_generation, period),
        );
    }

    fn acquisition_strategies(&self) -> Vec<Arc<dyn AcquisitionStrategy>> {
        match &self.strategies {
            Some(strategies) => strategies.clone(),
            None => default_strategies(&self.config.read()),
        }
    }
}

impl Drop for ServiceInner {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}

/// WebSocket, then HTTP polling, then the serial probe
pub fn default_strategies(config: &ServiceConfig) -> Vec<Arc<dyn AcquisitionStrategy>> {
    let mut strategies: Vec<Arc<dyn AcquisitionStrategy>> =
        vec![Arc::new(WebSocketStrategy::from_config(config))];

    match HttpPollingStrategy::from_config(config) {
        Ok(http) => strategies.push(Arc::new(http)),
        Err(err) => warn!(error = %err, "HTTP tier disabled"),
    }

    strategies.push(Arc::new(SerialProbeStrategy::from_config(config)));
    strategies
}

/// Sink handed to strategies for one session
struct SessionSink {
    inner: Weak<ServiceInner>,
    generation: u64,
    transport: TransportKind,
}

impl ReadingSink for SessionSink {
    fn ingest(&self, payload: &Value) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        if !inner.is_current(self.generation) {
            return false;
        }

        let processor = inner.processor.read().clone();
        match processor.process(payload) {
            Ok(raw) => {
                if raw.is_empty() {
                    debug!(transport = %self.transport, "Payload carried no known fields, using baselines");
                }
                let reading = assemble_reading(raw, inner.simulator.now_millis());
                trace!(transport = %self.transport, hr = reading.heart_rate(), score = reading.score(), "Live reading");
                inner.store(self.generation, reading)
            }
            Err(err) => {
                warn!(transport = %self.transport, error = %err, "Dropping live payload");
                true
            }
        }
    }

    fn fail(&self, error: EmotiBitError) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        if !inner.is_current(self.generation) {
            return;
        }
        warn!(transport = %self.transport, error = %error, "Live transport lost, falling back to simulation");
        inner.enter_simulation(self.generation);
    }

    fn is_active(&self) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.is_current(self.generation))
            .unwrap_or(false)
    }
}

async fn run_acquisition(weak: Weak<ServiceInner>, generation: u64) {
    let Some(strategies) = weak.upgrade().map(|inner| inner.acquisition_strategies()) else {
        return;
    };

    for strategy in strategies {
        let transport = strategy.transport();
        let sink: SharedSink = Arc::new(SessionSink {
            inner: weak.clone(),
            generation,
            transport,
        });

        debug!(%transport, "Trying transport");
        let outcome = strategy.try_connect(sink).await;

        let Some(inner) = weak.upgrade() else {
            return;
        };
        if !inner.is_current(generation) {
            debug!(generation, "Acquisition superseded");
            return;
        }

        match outcome {
            ConnectOutcome::Connected(stream) => {
                if inner.mark_connected(generation, transport) {
                    info!(%transport, "Live transport connected");
                    inner.spawn_task(generation, stream);
                }
                return;
            }
            ConnectOutcome::Unavailable(err) => {
                debug!(%transport, error = %err, "Transport unavailable");
            }
        }
    }

    if let Some(inner) = weak.upgrade() {
        info!("No live transport available");
        inner.enter_simulation(generation);
    }
}

async fn run_simulation(weak: Weak<ServiceInner>, generation: u64, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let reading = inner.simulator.generate();
        trace!(hr = reading.heart_rate(), score = reading.score(), "Simulated reading");
        if !inner.store(generation, reading) {
            return;
        }
    }
}
