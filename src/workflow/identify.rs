//! Capture-and-identify workflow.

use super::capture::{CaptureResult, CaptureWorkflow};
use crate::device::{FingerprintDevice, Template};
use crate::matching::{CandidateId, MatchCandidate, MatchEngine, MatchScan};
use crate::store::{StoreError, StoredCandidate, TemplateStore};
use thiserror::Error;

/// Failures that abort an identification as a whole.
#[derive(Debug, Error)]
pub enum IdentifyError {
    #[error("template store error: {0}")]
    Store(#[from] StoreError),
    #[error("cannot decode enrolled template for candidate {id}: {source}")]
    Decode {
        id: CandidateId,
        #[source]
        source: base64::DecodeError,
    },
}

/// Outcome of a capture-and-identify request.
#[derive(Debug, Clone)]
pub enum IdentifyResult {
    /// The captured finger matched an enrolled candidate.
    Identified {
        candidate_id: CandidateId,
        score: i32,
        image_png: Vec<u8>,
    },
    /// A finger was captured but nobody matched.
    NoMatch { image_png: Vec<u8> },
    /// No usable finger was captured.
    NotCaptured { reason: String },
}

impl IdentifyResult {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Identified { .. } => "identified",
            Self::NoMatch { .. } => "no_match",
            Self::NotCaptured { .. } => "not_captured",
        }
    }
}

/// Capture followed by a 1:N scan of the enrolled templates.
#[derive(Debug, Clone, Default)]
pub struct IdentifyWorkflow {
    capture: CaptureWorkflow,
    engine: MatchEngine,
}

impl IdentifyWorkflow {
    pub fn new(capture: CaptureWorkflow, engine: MatchEngine) -> Self {
        Self { capture, engine }
    }

    /// Returns the capture stage.
    pub fn capture_workflow(&self) -> &CaptureWorkflow {
        &self.capture
    }

    /// Returns a copy of this workflow with a different capture budget.
    pub fn with_timeout(&self, timeout: std::time::Duration) -> Self {
        Self {
            capture: self.capture.with_timeout(timeout),
            engine: self.engine,
        }
    }

    /// Captures once and identifies the finger against `store`.
    ///
    /// The capture is never retried. Store and decode failures abort the
    /// request with an [`IdentifyError`] instead of a partial result.
    pub fn identify<D, S>(
        &self,
        device: &mut D,
        store: &S,
    ) -> Result<IdentifyResult, IdentifyError>
    where
        D: FingerprintDevice + ?Sized,
        S: TemplateStore + ?Sized,
    {
        let sample = match self.capture.capture(device) {
            CaptureResult::Captured(sample) => sample,
            other => {
                let reason = self.not_captured_reason(&other);
                return Ok(IdentifyResult::NotCaptured { reason });
            }
        };

        let candidates = decode_candidates(store.load_candidates()?)?;
        let total = candidates.len();

        let scan: MatchScan = self.engine.scan(&*device, &sample.template, candidates);

        let result = match scan.outcome {
            Some(outcome) => IdentifyResult::Identified {
                candidate_id: outcome.candidate_id,
                score: outcome.score,
                image_png: sample.image_png,
            },
            None => IdentifyResult::NoMatch {
                image_png: sample.image_png,
            },
        };

        tracing::info!(
            outcome = result.label(),
            policy = ?self.engine.policy(),
            candidates = total,
            compared = scan.compared,
            failures = scan.failures,
            "Identification finished"
        );
        Ok(result)
    }

    fn not_captured_reason(&self, result: &CaptureResult) -> String {
        match result {
            CaptureResult::TimedOut => format!(
                "No finger detected within {} seconds",
                self.capture.config().timeout_secs
            ),
            CaptureResult::DeviceUnavailable { reason }
            | CaptureResult::AcquisitionError { reason } => reason.clone(),
            CaptureResult::Captured(_) => String::new(),
        }
    }
}

/// Decodes every stored row, failing on the first corrupt template.
fn decode_candidates(
    rows: Vec<StoredCandidate>,
) -> Result<Vec<MatchCandidate>, IdentifyError> {
    rows.into_iter()
        .map(|row| {
            Template::from_base64(&row.encoded_template)
                .map(|template| MatchCandidate::new(row.id, template))
                .map_err(|source| IdentifyError::Decode { id: row.id, source })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MockDevice;
    use crate::extraction::SampleExtractor;
    use crate::matching::MatchPolicy;
    use crate::store::MemoryTemplateStore;
    use crate::workflow::CaptureConfig;
    use std::time::Duration;

    struct UnreachableStore;

    impl TemplateStore for UnreachableStore {
        fn load_candidates(&self) -> Result<Vec<StoredCandidate>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    fn workflow(policy: MatchPolicy) -> IdentifyWorkflow {
        let config = CaptureConfig {
            timeout_secs: 2.0,
            poll_interval_ms: 1,
            ..Default::default()
        };
        IdentifyWorkflow::new(
            CaptureWorkflow::new(config, SampleExtractor::default()),
            MatchEngine::new(policy),
        )
    }

    fn device() -> MockDevice {
        MockDevice::new(4, 4)
            .then_empty(1)
            .then_sample(b"probe".to_vec(), (0..16u8).collect())
    }

    fn store(rows: &[(CandidateId, &str)]) -> MemoryTemplateStore {
        let mut store = MemoryTemplateStore::default();
        for (id, bytes) in rows {
            store.enroll(*id, &Template::from_bytes(bytes.as_bytes().to_vec()));
        }
        store
    }

    #[test]
    fn test_single_candidate_identified() {
        let mut device = device().with_score(b"parent-12", 7);
        let store = store(&[(12, "parent-12")]);

        let result = workflow(MatchPolicy::FirstMatch)
            .identify(&mut device, &store)
            .unwrap();

        match result {
            IdentifyResult::Identified {
                candidate_id,
                score,
                image_png,
            } => {
                assert_eq!(candidate_id, 12);
                assert_eq!(score, 7);
                assert!(!image_png.is_empty());
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_all_zero_scores_no_match() {
        let mut device = device();
        let store = store(&[(1, "a"), (2, "b"), (3, "c")]);

        let result = workflow(MatchPolicy::FirstMatch)
            .identify(&mut device, &store)
            .unwrap();

        assert!(matches!(result, IdentifyResult::NoMatch { .. }));
        assert_eq!(device.stats().comparisons, 3);
    }

    #[test]
    fn test_earliest_match_wins_over_higher_score() {
        let mut device = device().with_score(b"a", 2).with_score(b"b", 80);
        let store = store(&[(1, "a"), (2, "b")]);

        let first = workflow(MatchPolicy::FirstMatch)
            .identify(&mut device.clone(), &store)
            .unwrap();
        let best = workflow(MatchPolicy::BestMatch)
            .identify(&mut device, &store)
            .unwrap();

        assert!(matches!(
            first,
            IdentifyResult::Identified { candidate_id: 1, score: 2, .. }
        ));
        assert!(matches!(
            best,
            IdentifyResult::Identified { candidate_id: 2, score: 80, .. }
        ));
    }

    #[test]
    fn test_timeout_is_not_captured() {
        let mut device = MockDevice::new(4, 4);
        let workflow = workflow(MatchPolicy::FirstMatch).with_timeout(Duration::from_millis(10));

        let result = workflow.identify(&mut device, &store(&[(1, "a")])).unwrap();

        match result {
            IdentifyResult::NotCaptured { reason } => {
                assert!(reason.starts_with("No finger detected within"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(device.stats().comparisons, 0);
        assert_eq!(device.stats().closes, 1);
    }

    #[test]
    fn test_no_device_is_not_captured() {
        let mut device = MockDevice::new(4, 4).with_device_count(0);

        let result = workflow(MatchPolicy::FirstMatch)
            .identify(&mut device, &UnreachableStore)
            .unwrap();

        match result {
            IdentifyResult::NotCaptured { reason } => {
                assert_eq!(reason, "No fingerprint devices found")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_store_failure_fails_whole_request() {
        let mut device = device();

        let result = workflow(MatchPolicy::FirstMatch).identify(&mut device, &UnreachableStore);

        let err = result.unwrap_err();
        assert!(matches!(err, IdentifyError::Store(StoreError::Unavailable(_))));
        assert_eq!(
            err.to_string(),
            "template store error: template store unavailable: connection refused"
        );
        assert_eq!(device.stats().closes, 1);
    }

    #[test]
    fn test_corrupt_template_fails_whole_request() {
        let mut device = device().with_score(b"a", 5);
        let store = MemoryTemplateStore::new(vec![
            StoredCandidate::new(1, Template::from_bytes(b"a".to_vec()).to_base64()),
            StoredCandidate::new(2, "%%% not base64 %%%"),
        ]);

        let result = workflow(MatchPolicy::FirstMatch).identify(&mut device, &store);

        assert!(matches!(result, Err(IdentifyError::Decode { id: 2, .. })));
        assert_eq!(device.stats().comparisons, 0);
    }
}
