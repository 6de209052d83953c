//! JSON response bodies.
//!
//! These are the only shapes the transport layer serializes. Workflow
//! outcomes are mapped here; no error type reaches the wire unconverted.

use crate::matching::CandidateId;
use crate::workflow::{CaptureResult, IdentifyError, IdentifyResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Body of `POST /capture`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureResponse {
    pub captured: bool,
    /// Base64 PNG preview.
    pub fingerprint: Option<String>,
    /// Base64 template.
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<CaptureResult> for CaptureResponse {
    fn from(result: CaptureResult) -> Self {
        match result {
            CaptureResult::Captured(sample) => Self {
                captured: true,
                fingerprint: Some(STANDARD.encode(&sample.image_png)),
                template: Some(sample.template.to_base64()),
                error: None,
            },
            CaptureResult::TimedOut => Self {
                captured: false,
                fingerprint: None,
                template: None,
                error: None,
            },
            CaptureResult::DeviceUnavailable { reason }
            | CaptureResult::AcquisitionError { reason } => Self {
                captured: false,
                fingerprint: None,
                template: None,
                error: Some(reason),
            },
        }
    }
}

/// Body of `POST /verify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub captured: bool,
    /// Base64 PNG preview.
    pub fingerprint_image: Option<String>,
    #[serde(rename = "match")]
    pub matched: bool,
    pub parent_id: Option<CandidateId>,
    pub score: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<IdentifyResult> for VerifyResponse {
    fn from(result: IdentifyResult) -> Self {
        match result {
            IdentifyResult::Identified {
                candidate_id,
                score,
                image_png,
            } => Self {
                captured: true,
                fingerprint_image: Some(STANDARD.encode(image_png)),
                matched: true,
                parent_id: Some(candidate_id),
                score,
                error: None,
            },
            IdentifyResult::NoMatch { image_png } => Self {
                captured: true,
                fingerprint_image: Some(STANDARD.encode(image_png)),
                matched: false,
                parent_id: None,
                score: 0,
                error: None,
            },
            IdentifyResult::NotCaptured { reason } => Self {
                captured: false,
                fingerprint_image: None,
                matched: false,
                parent_id: None,
                score: 0,
                error: Some(reason),
            },
        }
    }
}

/// Body returned with a non-2xx status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

impl From<&IdentifyError> for ErrorResponse {
    fn from(err: &IdentifyError) -> Self {
        Self::new(format!("Verification failed: {}", err))
    }
}
