//! Prometheus metrics for the capture service.
//!
//! # Metrics Exposed
//!
//! - `fingerprint_capture_total{outcome}` - Capture attempts by outcome
//! - `fingerprint_identify_total{outcome}` - Identification requests by outcome
//! - `fingerprint_capture_duration_seconds` - Time spent holding the reader
//! - `fingerprint_device_busy` - Whether a request currently holds the reader
//!
//! # Example
//!
//! ```no_run
//! use fingerprint_capture::metrics::MetricsRegistry;
//! use fingerprint_capture::workflow::CaptureResult;
//! use std::time::Duration;
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! registry.record_capture(&CaptureResult::TimedOut, Duration::from_secs(15));
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry, IDENTIFY_FAILED};
