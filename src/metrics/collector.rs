//! Metrics collection and registry.

use crate::workflow::{CaptureResult, IdentifyResult};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Outcome label for identifications that failed as a whole.
pub const IDENTIFY_FAILED: &str = "failed";

/// Prometheus metrics registry for capture and identification.
pub struct MetricsRegistry {
    registry: Registry,

    captures_total: IntCounterVec,
    identify_total: IntCounterVec,
    capture_duration: Histogram,
    device_busy: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new registry with all metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let captures_total = IntCounterVec::new(
            Opts::new("fingerprint_capture_total", "Capture attempts by outcome"),
            &["outcome"],
        )?;
        let identify_total = IntCounterVec::new(
            Opts::new(
                "fingerprint_identify_total",
                "Identification requests by outcome",
            ),
            &["outcome"],
        )?;
        let capture_duration = Histogram::with_opts(
            HistogramOpts::new(
                "fingerprint_capture_duration_seconds",
                "Wall-clock time spent holding the reader per request",
            )
            .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0, 30.0, 60.0]),
        )?;
        let device_busy = IntGauge::new(
            "fingerprint_device_busy",
            "Whether a request currently holds the reader (1=busy, 0=idle)",
        )?;

        registry.register(Box::new(captures_total.clone()))?;
        registry.register(Box::new(identify_total.clone()))?;
        registry.register(Box::new(capture_duration.clone()))?;
        registry.register(Box::new(device_busy.clone()))?;

        Ok(Self {
            registry,
            captures_total,
            identify_total,
            capture_duration,
            device_busy,
        })
    }

    /// Records one capture attempt.
    pub fn record_capture(&self, result: &CaptureResult, elapsed: Duration) {
        self.captures_total.with_label_values(&[result.label()]).inc();
        self.capture_duration.observe(elapsed.as_secs_f64());
    }

    /// Records one identification outcome.
    pub fn record_identify(&self, result: Option<&IdentifyResult>, elapsed: Duration) {
        let label = result.map_or(IDENTIFY_FAILED, IdentifyResult::label);
        self.identify_total.with_label_values(&[label]).inc();
        self.capture_duration.observe(elapsed.as_secs_f64());
    }

    /// Marks the reader as held or released.
    pub fn set_device_busy(&self, busy: bool) {
        self.device_busy.set(if busy { 1 } else { 0 });
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
