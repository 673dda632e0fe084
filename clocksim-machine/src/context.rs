//! State shared by a machine's listener and ticker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{trace, warn};

use clocksim_core::{ConnectionStatus, EventKind, EventRecord, EventSink, Inbox, LamportClock};
use clocksim_telemetry::MetricsRecorder;

pub struct MachineContext {
    pub id: u32,
    pub clock: LamportClock,
    pub inbox: Inbox,
    pub metrics: MetricsRecorder,
    sink: Arc<dyn EventSink>,
    running: AtomicBool,
}

impl MachineContext {
    pub fn new(id: u32, clock: LamportClock, sink: Arc<dyn EventSink>, metrics: MetricsRecorder) -> Self {
        Self {
            id,
            clock,
            inbox: Inbox::new(),
            metrics,
            sink,
            running: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    /// Appends one event with the current inbox length.
    pub fn record(&self, kind: EventKind, logical_clock: u64) {
        let record = EventRecord::now(kind, self.inbox.len(), logical_clock);
        trace!(machine_id = self.id, event = %kind, queue_length = record.queue_length, logical_clock, "Event");
        self.metrics.record_event(kind, logical_clock);
        if let Err(e) = self.sink.append(&record) {
            warn!(machine_id = self.id, "Failed to record {kind} event: {e}");
        }
    }

    pub fn record_connection(&self, status: ConnectionStatus) {
        if let Err(e) = self.sink.append_connection(&status) {
            warn!(machine_id = self.id, "Failed to record connection status: {e}");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use clocksim_core::MemorySink;

    /// Context starting at `clock`, recording into the returned memory sink.
    pub(crate) fn context_at(clock: u64) -> (Arc<MachineContext>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let ctx = MachineContext::new(
            1,
            LamportClock::new(clock),
            sink.clone(),
            MetricsRecorder::new(1).unwrap(),
        );
        (Arc::new(ctx), sink)
    }

    #[test]
    fn record_captures_queue_length_and_metrics() {
        let (ctx, sink) = context_at(0);
        ctx.inbox.push(4);
        ctx.inbox.push(8);
        ctx.record(EventKind::Internal, 1);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].queue_length, 2);
        assert_eq!(records[0].logical_clock, 1);
        assert_eq!(ctx.metrics.events_of(EventKind::Internal), 1);
    }

    #[test]
    fn starts_not_running() {
        let (ctx, _) = context_at(0);
        assert!(!ctx.is_running());
        ctx.set_running(true);
        assert!(ctx.is_running());
    }
}
