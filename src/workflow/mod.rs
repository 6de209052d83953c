//! Request-level workflows.
//!
//! Each workflow runs end-to-end against one freshly initialised driver and
//! reports a tagged outcome. Nothing is retried automatically: a timed-out
//! or failed capture is reported once and left to the caller.

mod capture;
mod identify;

pub use capture::{CaptureConfig, CaptureResult, CaptureWorkflow};
pub use identify::{IdentifyError, IdentifyResult, IdentifyWorkflow};
