//! Lifecycle controller: `Created -> Running -> Stopped`, no way back.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, info_span, Instrument};
use validator::Validate;

use clocksim_config::{ConfigError, MachineConfig};
use clocksim_core::{EventSink, LamportClock};
use clocksim_telemetry::MetricsRecorder;

use crate::context::MachineContext;
use crate::error::MachineError;
use crate::listener::Listener;
use crate::ticker::Ticker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Created,
    Running,
    Stopped,
}

pub struct Machine {
    config: MachineConfig,
    ctx: Arc<MachineContext>,
    state: MachineState,
    local_addr: Option<SocketAddr>,
    shutdown: Option<watch::Sender<bool>>,
    listener_task: Option<JoinHandle<()>>,
    ticker_task: Option<JoinHandle<()>>,
}

impl Machine {
    /// Validates the configuration and prepares an idle machine at clock 0.
    pub fn new(config: MachineConfig, sink: Arc<dyn EventSink>) -> Result<Self, MachineError> {
        config
            .validate()
            .map_err(|errors| ConfigError::validation(format!("machine {}", config.id), errors))?;
        let metrics = MetricsRecorder::new(config.id)?;
        let ctx = MachineContext::new(config.id, LamportClock::new(0), sink, metrics);
        Ok(Self {
            config,
            ctx: Arc::new(ctx),
            state: MachineState::Created,
            local_addr: None,
            shutdown: None,
            listener_task: None,
            ticker_task: None,
        })
    }

    pub fn id(&self) -> u32 {
        self.config.id
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn clock(&self) -> u64 {
        self.ctx.clock.now()
    }

    pub fn inbox_len(&self) -> usize {
        self.ctx.inbox.len()
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.ctx.metrics
    }

    /// Bound listening address, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Binds the listener, then launches the listener and ticker tasks.
    /// A bind failure leaves the machine in `Created`.
    pub async fn start(&mut self) -> Result<SocketAddr, MachineError> {
        match self.state {
            MachineState::Running => return Err(MachineError::AlreadyRunning),
            MachineState::Stopped => return Err(MachineError::AlreadyStopped),
            MachineState::Created => {}
        }

        let listener = Listener::bind(
            &self.config.bind_addr(),
            self.ctx.clone(),
            self.config.read_buffer_size,
        )
        .await?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| MachineError::Bind {
                addr: self.config.bind_addr(),
                source,
            })?;
        let ticker = Ticker::new(self.ctx.clone(), &self.config)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.ctx.set_running(true);

        let id = self.config.id;
        self.listener_task = Some(tokio::spawn(
            listener
                .run(shutdown_rx.clone())
                .instrument(info_span!("listener", machine_id = id)),
        ));
        self.ticker_task = Some(tokio::spawn(
            ticker
                .run(shutdown_rx)
                .instrument(info_span!("ticker", machine_id = id)),
        ));
        self.shutdown = Some(shutdown_tx);
        self.local_addr = Some(local_addr);
        self.state = MachineState::Running;

        info!(
            machine_id = id,
            %local_addr,
            tick_rate = self.config.tick_rate,
            peers = self.config.peers.len(),
            "Machine started"
        );
        Ok(local_addr)
    }

    /// Clears the running flag, unblocks the listener and waits for both
    /// tasks. Calling it again, or on a machine never started, is a no-op.
    pub async fn stop(&mut self) -> Result<(), MachineError> {
        if self.state != MachineState::Running {
            return Ok(());
        }

        self.ctx.set_running(false);
        if let Some(shutdown) = self.shutdown.take() {
            // Receivers only vanish once both tasks have already exited.
            let _ = shutdown.send(true);
        }

        let mut failures = Vec::new();
        for task in [self.listener_task.take(), self.ticker_task.take()]
            .into_iter()
            .flatten()
        {
            if let Err(e) = task.await {
                failures.push(e.to_string());
            }
        }
        self.state = MachineState::Stopped;

        info!(machine_id = self.config.id, clock = self.clock(), "Machine stopped");
        if failures.is_empty() {
            Ok(())
        } else {
            Err(MachineError::Task(failures.join("; ")))
        }
    }
}

impl Drop for Machine {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            self.ctx.set_running(false);
            let _ = shutdown.send(true);
        }
    }
}
