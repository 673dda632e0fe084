//! Outbound delivery: one fresh connection per message, at most once.
//!
//! No retry, no backoff, no pooling, no timeout. A slow peer stalls the
//! caller for as long as the connection attempt takes.

use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, instrument, warn};

use clocksim_config::{BroadcastMode, FailedSendPolicy, PeerEndpoint};
use clocksim_core::{ClockMessage, ConnectionStatus, EventKind};
use clocksim_telemetry::EventLogger;

use crate::context::MachineContext;
use crate::error::SendError;

/// Connects, writes the full payload, closes.
pub async fn transmit(peer: &PeerEndpoint, message: ClockMessage) -> Result<(), SendError> {
    let mut stream = TcpStream::connect((peer.address.as_str(), peer.port))
        .await
        .map_err(|source| SendError::Connect {
            peer: peer.to_string(),
            source,
        })?;

    let write = async {
        stream.write_all(&message.encode()).await?;
        stream.shutdown().await
    };
    write.await.map_err(|source| SendError::Write {
        peer: peer.to_string(),
        source,
    })
}

#[derive(Clone)]
pub struct Sender {
    ctx: Arc<MachineContext>,
    failed_send: FailedSendPolicy,
}

impl Sender {
    pub fn new(ctx: Arc<MachineContext>, failed_send: FailedSendPolicy) -> Self {
        Self { ctx, failed_send }
    }

    /// Sends `advertised` to `peer`. On success the clock advances by one and a
    /// `send` event is recorded; on failure only a connection status is
    /// recorded unless the policy says otherwise. Returns whether delivery
    /// succeeded.
    #[instrument(level = "debug", skip(self, peer), fields(machine_id = self.ctx.id, peer = %peer))]
    pub async fn send(&self, peer: &PeerEndpoint, advertised: u64) -> bool {
        let delivered = self.deliver(peer, advertised).await;
        if delivered || self.failed_send == FailedSendPolicy::AdvanceClock {
            self.advance();
        }
        delivered
    }

    /// Sends to every peer in list order. Returns how many deliveries succeeded.
    pub async fn broadcast(&self, peers: &[PeerEndpoint], mode: BroadcastMode) -> usize {
        match mode {
            BroadcastMode::PerPeer => {
                let mut delivered = 0;
                for peer in peers {
                    // Read per peer: each success advances the clock before the next send.
                    if self.send(peer, self.ctx.clock.now()).await {
                        delivered += 1;
                    }
                }
                delivered
            }
            BroadcastMode::Snapshot => {
                let advertised = self.ctx.clock.now();
                let mut delivered = 0;
                for peer in peers {
                    if self.deliver(peer, advertised).await {
                        delivered += 1;
                    }
                }
                let advance = delivered > 0
                    || (!peers.is_empty() && self.failed_send == FailedSendPolicy::AdvanceClock);
                if advance {
                    self.advance();
                }
                delivered
            }
        }
    }

    /// Applies the send rule and records the `send` event.
    fn advance(&self) {
        match self.ctx.clock.apply_local() {
            Ok(clock) => self.ctx.record(EventKind::Send, clock),
            Err(e) => warn!(machine_id = self.ctx.id, "Send not recorded: {e}"),
        }
    }

    /// Transmits and records the connection outcome. Never touches the clock.
    async fn deliver(&self, peer: &PeerEndpoint, advertised: u64) -> bool {
        let peer_name = peer.to_string();
        match transmit(peer, ClockMessage::new(advertised)).await {
            Ok(()) => {
                debug!(machine_id = self.ctx.id, peer = %peer_name, advertised, "Message delivered");
                self.ctx
                    .record_connection(ConnectionStatus::succeeded(peer_name));
                true
            }
            Err(e) => {
                EventLogger::log_connection_issue(self.ctx.id, &peer_name, &e);
                self.ctx.metrics.send_failures.inc();
                self.ctx
                    .record_connection(ConnectionStatus::failed(peer_name, e.to_string()));
                false
            }
        }
    }
}
