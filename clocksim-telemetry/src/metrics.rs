//! ## clocksim-telemetry::metrics
//! **Prometheus counters per machine**

use std::sync::Arc;

use parking_lot::Mutex;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};

use clocksim_core::EventKind;

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub events: IntCounterVec,
    pub send_failures: IntCounter,
    pub decode_failures: IntCounter,
    pub logical_clock: IntGauge,
    /// Highest clock published to the gauge. Listener and ticker record
    /// concurrently and may arrive out of clock order.
    highest_clock: Arc<Mutex<u64>>,
}

impl MetricsRecorder {
    /// Builds a registry whose series all carry `machine_id`.
    pub fn new(machine_id: u32) -> Result<Self, prometheus::Error> {
        let labels = std::iter::once(("machine_id".to_string(), machine_id.to_string())).collect();
        let registry = Registry::new_custom(None, Some(labels))?;

        let events = IntCounterVec::new(
            Opts::new("clocksim_events_total", "Clock-affecting events by kind"),
            &["kind"],
        )?;
        let send_failures = IntCounter::new(
            "clocksim_send_failures_total",
            "Outbound messages that could not be delivered",
        )?;
        let decode_failures = IntCounter::new(
            "clocksim_decode_failures_total",
            "Inbound payloads that could not be decoded",
        )?;
        let logical_clock = IntGauge::new("clocksim_logical_clock", "Latest logical clock value")?;

        registry.register(Box::new(events.clone()))?;
        registry.register(Box::new(send_failures.clone()))?;
        registry.register(Box::new(decode_failures.clone()))?;
        registry.register(Box::new(logical_clock.clone()))?;

        Ok(Self {
            registry,
            events,
            send_failures,
            decode_failures,
            logical_clock,
            highest_clock: Arc::new(Mutex::new(0)),
        })
    }

    /// Counts the event and raises the clock gauge; the gauge never moves back.
    pub fn record_event(&self, kind: EventKind, logical_clock: u64) {
        self.events.with_label_values(&[kind.as_str()]).inc();
        let mut highest = self.highest_clock.lock();
        if logical_clock > *highest {
            *highest = logical_clock;
            self.logical_clock
                .set(i64::try_from(logical_clock).unwrap_or(i64::MAX));
        }
    }

    pub fn events_of(&self, kind: EventKind) -> u64 {
        self.events.with_label_values(&[kind.as_str()]).get()
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
