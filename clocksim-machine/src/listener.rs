//! Inbound side: one connection, one bounded read, one receive event.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use clocksim_core::{ClockMessage, EventKind};

use crate::context::MachineContext;
use crate::error::{MachineError, ReceiveError};

/// Pause after a failed accept so a persistent error does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

pub struct Listener {
    listener: TcpListener,
    ctx: Arc<MachineContext>,
    read_buffer_size: usize,
}

impl Listener {
    /// Binds the listening endpoint. Failure here is fatal for the machine.
    pub async fn bind(
        addr: &str,
        ctx: Arc<MachineContext>,
        read_buffer_size: usize,
    ) -> Result<Self, MachineError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| MachineError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        Ok(Self {
            listener,
            ctx,
            read_buffer_size,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until shutdown is signalled. The listening socket
    /// is dropped on return, releasing the port.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            let accepted = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                accepted = self.listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, remote)) => {
                    let outcome = tokio::select! {
                        biased;
                        _ = shutdown.changed() => break,
                        outcome = self.receive(stream) => outcome,
                    };
                    match outcome {
                        Ok(Some(clock)) => trace!(machine_id = self.ctx.id, %remote, clock, "Received message"),
                        Ok(None) => trace!(machine_id = self.ctx.id, %remote, "Connection closed without payload"),
                        Err(e) => {
                            if matches!(e, ReceiveError::Decode(_)) {
                                self.ctx.metrics.decode_failures.inc();
                            }
                            info!(machine_id = self.ctx.id, %remote, "Dropped inbound message: {e}");
                        }
                    }
                }
                Err(e) if !self.ctx.is_running() => {
                    debug!(machine_id = self.ctx.id, "Accept interrupted by shutdown: {e}");
                    break;
                }
                Err(e) => {
                    warn!(machine_id = self.ctx.id, "Accept failed: {e}");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
        debug!(machine_id = self.ctx.id, "Listener stopped");
    }

    /// Reads once, decodes, applies the receive rule and queues the raw value.
    /// Returns the updated clock, or `None` if the peer sent nothing.
    async fn receive(&self, mut stream: TcpStream) -> Result<Option<u64>, ReceiveError> {
        let mut buffer = vec![0u8; self.read_buffer_size];
        let read = stream.read(&mut buffer).await?;
        if read == 0 {
            return Ok(None);
        }

        let message = ClockMessage::decode(&buffer[..read])?;
        let clock = self.ctx.clock.apply_received(message.logical_clock)?;
        self.ctx.inbox.push(message.logical_clock);
        self.ctx.record(EventKind::Receive, clock);
        Ok(Some(clock))
    }
}
