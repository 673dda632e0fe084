//! The machine's main loop.
//!
//! Every `1 / tick_rate` seconds: drain one inbox entry if there is one,
//! otherwise draw an action from the weighted table. Draining always takes
//! priority over generating new workload.

use std::sync::Arc;
use std::time::Duration;

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, warn};

use clocksim_config::{BroadcastMode, MachineConfig, PeerEndpoint};
use clocksim_core::EventKind;

use crate::context::MachineContext;
use crate::error::MachineError;
use crate::sender::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    Internal,
    /// Send to the peer at this index of the peer list.
    SendTo(usize),
    Broadcast,
}

/// Explicit weighted choice over the workload actions.
///
/// Internal events get weight `p`; the remaining `1 - p` is split evenly
/// over one "send to peer i" entry per peer plus one "send to all" entry.
/// Two peers and `p = 0.7` gives the classic 7/1/1/1 split out of ten.
#[derive(Debug, Clone)]
pub struct ActionTable {
    entries: Vec<(TickAction, f64)>,
    index: WeightedIndex<f64>,
}

impl ActionTable {
    pub fn new(internal_event_probability: f64, peer_count: usize) -> Result<Self, MachineError> {
        let entries = if peer_count == 0 {
            vec![(TickAction::Internal, 1.0)]
        } else {
            let p = internal_event_probability.clamp(0.0, 1.0);
            let share = (1.0 - p) / (peer_count + 1) as f64;
            std::iter::once((TickAction::Internal, p))
                .chain((0..peer_count).map(|i| (TickAction::SendTo(i), share)))
                .chain(std::iter::once((TickAction::Broadcast, share)))
                .collect()
        };

        let index = WeightedIndex::new(entries.iter().map(|(_, w)| *w))
            .map_err(|e| MachineError::Workload(e.to_string()))?;
        Ok(Self { entries, index })
    }

    pub fn entries(&self) -> &[(TickAction, f64)] {
        &self.entries
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> TickAction {
        self.entries[self.index.sample(rng)].0
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Processed { dequeued: u64, clock: u64 },
    Acted(TickAction),
    /// The clock is at its maximum; nothing was recorded.
    ClockExhausted,
}

pub struct Ticker {
    ctx: Arc<MachineContext>,
    sender: Sender,
    peers: Vec<PeerEndpoint>,
    period: Duration,
    broadcast: BroadcastMode,
    table: ActionTable,
    rng: StdRng,
}

impl Ticker {
    pub fn new(ctx: Arc<MachineContext>, config: &MachineConfig) -> Result<Self, MachineError> {
        let table = ActionTable::new(config.internal_event_probability, config.peers.len())?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            sender: Sender::new(ctx.clone(), config.failed_send),
            ctx,
            peers: config.peers.clone(),
            period: config.tick_period(),
            broadcast: config.broadcast,
            table,
            rng,
        })
    }

    /// Ticks until the machine stops running. The running flag is checked
    /// before every tick; an action already under way is allowed to finish.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        while self.ctx.is_running() {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = sleep(self.period) => {}
            }
            self.tick().await;
        }
        debug!(machine_id = self.ctx.id, "Ticker stopped");
    }

    /// One tick without the sleep.
    pub async fn tick(&mut self) -> TickOutcome {
        if let Some(dequeued) = self.ctx.inbox.pop() {
            return match self.ctx.clock.apply_received(dequeued) {
                Ok(clock) => {
                    self.ctx.record(EventKind::Process, clock);
                    TickOutcome::Processed { dequeued, clock }
                }
                Err(e) => {
                    warn!(machine_id = self.ctx.id, "Dropped queued message: {e}");
                    TickOutcome::ClockExhausted
                }
            };
        }

        let action = self.table.sample(&mut self.rng);
        match action {
            TickAction::Internal => match self.ctx.clock.apply_local() {
                Ok(clock) => self.ctx.record(EventKind::Internal, clock),
                Err(e) => {
                    warn!(machine_id = self.ctx.id, "Skipped internal event: {e}");
                    return TickOutcome::ClockExhausted;
                }
            },
            TickAction::SendTo(i) => {
                let peer = &self.peers[i];
                self.sender.send(peer, self.ctx.clock.now()).await;
            }
            TickAction::Broadcast => {
                self.sender.broadcast(&self.peers, self.broadcast).await;
            }
        }
        TickOutcome::Acted(action)
    }
}
