//! Capture workflow.
//!
//! ```text
//! Idle -> DeviceOpening -> Polling -> { Captured | TimedOut | DeviceError }
//!                                              \________ Closing ________/
//! ```
//!
//! The reader is closed exactly once on every path that opened it. A
//! failed open never reaches `close`.

use crate::device::{DeviceSession, FingerprintDevice, RawSample, SessionError};
use crate::extraction::{ExtractedSample, SampleExtractor};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Capture budget and probe cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Reader index to open.
    pub device_index: usize,
    /// Wall-clock budget for a finger presentation, in seconds.
    pub timeout_secs: f64,
    /// Pause between empty probes, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            timeout_secs: 15.0,
            poll_interval_ms: 20,
        }
    }
}

impl CaptureConfig {
    /// Returns the capture budget, or `None` when it is too large to
    /// represent and the wait is unbounded.
    pub fn timeout(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.timeout_secs.max(0.0)).ok()
    }

    /// Returns the pause between empty probes.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Outcome of one capture attempt.
#[derive(Debug, Clone)]
pub enum CaptureResult {
    /// A finger was presented and extracted.
    Captured(ExtractedSample),
    /// No finger within the budget.
    TimedOut,
    /// No reader, or the reader could not be opened.
    DeviceUnavailable { reason: String },
    /// The driver failed while probing, or the sample was unusable.
    AcquisitionError { reason: String },
}

impl CaptureResult {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Captured(_) => "captured",
            Self::TimedOut => "timed_out",
            Self::DeviceUnavailable { .. } => "device_unavailable",
            Self::AcquisitionError { .. } => "acquisition_error",
        }
    }
}

/// Opens a reader, waits for a finger within the budget, and extracts it.
#[derive(Debug, Clone, Default)]
pub struct CaptureWorkflow {
    config: CaptureConfig,
    extractor: SampleExtractor,
}

impl CaptureWorkflow {
    pub fn new(config: CaptureConfig, extractor: SampleExtractor) -> Self {
        Self { config, extractor }
    }

    /// Returns the capture settings.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Returns a copy of this workflow with a different budget.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let mut workflow = self.clone();
        workflow.config.timeout_secs = timeout.as_secs_f64();
        workflow
    }

    /// Runs one capture attempt against an initialised driver.
    pub fn capture<D>(&self, device: &mut D) -> CaptureResult
    where
        D: FingerprintDevice + ?Sized,
    {
        let started = Instant::now();

        let mut session = match DeviceSession::open(device, self.config.device_index) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Reader unavailable");
                return CaptureResult::DeviceUnavailable {
                    reason: e.to_string(),
                };
            }
        };

        let polled = self.poll_until_deadline(&mut session);
        session.close();

        let result = match polled {
            Ok(Some(sample)) => self.extract(sample),
            Ok(None) => CaptureResult::TimedOut,
            Err(e) => CaptureResult::AcquisitionError {
                reason: e.to_string(),
            },
        };

        tracing::info!(
            outcome = result.label(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Capture finished"
        );
        result
    }

    fn poll_until_deadline<D>(
        &self,
        session: &mut DeviceSession<'_, D>,
    ) -> Result<Option<RawSample>, SessionError>
    where
        D: FingerprintDevice + ?Sized,
    {
        let interval = self.config.poll_interval();
        let deadline = self
            .config
            .timeout()
            .and_then(|timeout| Instant::now().checked_add(timeout));
        let mut probes = 0u64;

        match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                tracing::debug!(timeout_ms = remaining.as_millis() as u64, "Waiting for finger");
            }
            None => tracing::debug!("Waiting for finger without deadline"),
        }

        loop {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                tracing::debug!(probes, "No finger before deadline");
                return Ok(None);
            }

            probes += 1;
            if let Some(sample) = session.poll()? {
                tracing::debug!(probes, "Finger detected");
                return Ok(Some(sample));
            }

            let pause = deadline.map_or(interval, |deadline| {
                interval.min(deadline.saturating_duration_since(Instant::now()))
            });
            std::thread::sleep(pause);
        }
    }

    fn extract(&self, sample: RawSample) -> CaptureResult {
        match self.extractor.extract(sample) {
            Ok(extracted) => {
                tracing::info!(
                    template = %extracted.template.digest(),
                    captured_at = %extracted.captured_at,
                    "Fingerprint captured"
                );
                CaptureResult::Captured(extracted)
            }
            Err(e) => {
                tracing::error!(error = %e, "Reader returned an unusable sample");
                CaptureResult::AcquisitionError {
                    reason: format!("Capture failed: {}", e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MockDevice;
    use proptest::prelude::*;

    fn workflow(timeout: Duration) -> CaptureWorkflow {
        let config = CaptureConfig {
            poll_interval_ms: 1,
            ..Default::default()
        };
        CaptureWorkflow::new(config, SampleExtractor::default()).with_timeout(timeout)
    }

    fn finger() -> Vec<u8> {
        (0..16u8).map(|i| i * 10).collect()
    }

    #[test]
    fn test_no_device_never_opens() {
        let mut device = MockDevice::new(4, 4).with_device_count(0);

        let result = workflow(Duration::from_secs(1)).capture(&mut device);

        match result {
            CaptureResult::DeviceUnavailable { reason } => {
                assert_eq!(reason, "No fingerprint devices found")
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(device.stats().opens, 0);
        assert_eq!(device.stats().closes, 0);
    }

    #[test]
    fn test_open_failure_is_device_unavailable() {
        let mut device = MockDevice::new(4, 4).fail_open("device busy");

        let result = workflow(Duration::from_secs(1)).capture(&mut device);

        match result {
            CaptureResult::DeviceUnavailable { reason } => {
                assert_eq!(reason, "Cannot open device: device busy")
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(device.stats().closes, 0);
    }

    #[test]
    fn test_captures_after_empty_probes() {
        let mut device = MockDevice::new(4, 4)
            .then_empty(3)
            .then_sample(vec![42], finger());

        let result = workflow(Duration::from_secs(5)).capture(&mut device);

        let CaptureResult::Captured(sample) = result else {
            panic!("expected a capture");
        };
        assert_eq!(sample.template.as_bytes(), &[42]);
        assert_eq!((sample.width, sample.height), (8, 8));
        assert_eq!(device.stats().probes, 4);
        assert_eq!(device.stats().closes, 1);
    }

    #[test]
    fn test_times_out_and_closes_once() {
        let mut device = MockDevice::new(4, 4);

        let started = Instant::now();
        let result = workflow(Duration::from_millis(40)).capture(&mut device);

        assert!(matches!(result, CaptureResult::TimedOut));
        assert!(started.elapsed() >= Duration::from_millis(40));
        assert_eq!(device.stats().opens, 1);
        assert_eq!(device.stats().closes, 1);
        assert!(!device.is_open());
    }

    #[test]
    fn test_zero_budget_never_probes() {
        let mut device = MockDevice::new(4, 4).then_sample(vec![1], finger());

        let result = workflow(Duration::ZERO).capture(&mut device);

        assert!(matches!(result, CaptureResult::TimedOut));
        assert_eq!(device.stats().probes, 0);
        assert_eq!(device.stats().closes, 1);
    }

    #[test]
    fn test_probe_error_aborts_loop() {
        let mut device = MockDevice::new(4, 4)
            .then_empty(2)
            .then_fail("USB disconnected")
            .then_sample(vec![1], finger());

        let result = workflow(Duration::from_secs(5)).capture(&mut device);

        match result {
            CaptureResult::AcquisitionError { reason } => {
                assert_eq!(reason, "Capture failed: USB disconnected")
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(device.stats().probes, 3);
        assert_eq!(device.stats().closes, 1);
    }

    #[test]
    fn test_malformed_sample_is_acquisition_error() {
        let mut device = MockDevice::new(4, 4).then_sample(vec![1], vec![0u8; 3]);

        let result = workflow(Duration::from_secs(5)).capture(&mut device);

        assert!(matches!(result, CaptureResult::AcquisitionError { .. }));
        assert_eq!(device.stats().closes, 1);
    }

    #[test]
    fn test_unrepresentable_budget_waits_without_deadline() {
        for budget in [Duration::MAX, Duration::from_secs(u64::MAX / 2)] {
            let mut device = MockDevice::new(4, 4)
                .then_empty(2)
                .then_sample(vec![7], finger());

            let result = workflow(budget).capture(&mut device);

            assert!(matches!(result, CaptureResult::Captured(_)));
            assert_eq!(device.stats().probes, 3);
            assert_eq!(device.stats().closes, 1);
        }
    }

    #[test]
    fn test_config_timeout_overflow_is_unbounded() {
        let config = CaptureConfig {
            timeout_secs: f64::MAX,
            ..Default::default()
        };
        assert_eq!(config.timeout(), None);
        assert_eq!(
            CaptureConfig::default().timeout(),
            Some(Duration::from_secs(15))
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_timeout_closes_exactly_once(timeout_ms in 0u64..25) {
            let mut device = MockDevice::new(2, 2);

            let result = workflow(Duration::from_millis(timeout_ms)).capture(&mut device);

            prop_assert!(matches!(result, CaptureResult::TimedOut));
            prop_assert_eq!(device.stats().opens, 1);
            prop_assert_eq!(device.stats().closes, 1);
        }
    }
}
