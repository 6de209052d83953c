//! Fingerprint Capture Library
//!
//! Drives a fingerprint reader through a bounded capture, turns the raw
//! sample into an opaque template plus a contrast-enhanced preview image,
//! and identifies the finger against a set of enrolled templates.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! device → extraction → workflow::capture ─→ response
//!                             ↓
//!              store → workflow::identify → matching
//! ```
//!
//! # Design Principles
//!
//! - **Scoped acquisition**: an open reader is closed exactly once on every path
//! - **Bounded waiting**: the only long suspension is the capture budget
//! - **No automatic retries**: failures are reported once, with their cause
//! - **Uniform outcomes**: workflows return tagged results, never raw errors
//!
//! # Example
//!
//! ```no_run
//! use fingerprint_capture::{
//!     device::{simulated_template, MockDevice, Template},
//!     matching::MatchEngine,
//!     store::MemoryTemplateStore,
//!     workflow::{CaptureWorkflow, IdentifyResult, IdentifyWorkflow},
//! };
//!
//! let mut store = MemoryTemplateStore::default();
//! store.enroll(1, &Template::from_bytes(simulated_template()));
//!
//! let workflow = IdentifyWorkflow::new(CaptureWorkflow::default(), MatchEngine::default());
//! let mut device = MockDevice::simulated(3);
//!
//! match workflow.identify(&mut device, &store).unwrap() {
//!     IdentifyResult::Identified { candidate_id, score, .. } => {
//!         println!("matched {} (score {})", candidate_id, score);
//!     }
//!     other => println!("{}", other.label()),
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod device;
pub mod extraction;
pub mod matching;
pub mod metrics;
pub mod response;
#[cfg(feature = "server")]
pub mod server;
pub mod store;
pub mod workflow;

// Re-export commonly used types at crate root
pub use config::FileConfig;
pub use device::{DeviceProvider, DeviceSession, FingerprintDevice, MockDevice, Template};
pub use extraction::{ExtractedSample, SampleExtractor};
pub use matching::{MatchEngine, MatchPolicy};
pub use store::{MemoryTemplateStore, SqliteTemplateStore, TemplateStore};
pub use workflow::{CaptureResult, CaptureWorkflow, IdentifyResult, IdentifyWorkflow};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
