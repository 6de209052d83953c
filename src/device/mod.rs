//! Fingerprint reader access.
//!
//! This module wraps the vendor driver behind a trait, hands out scoped
//! [`DeviceSession`]s that always release the reader, and provides a mock
//! reader for tests and simulation.

mod driver;
mod mock;
mod sample;
mod session;

pub use driver::{DeviceError, DeviceProvider, FingerprintDevice};
pub use mock::{
    simulated_template, MockDevice, MockStats, Probe, SimulatedProvider, IDENTICAL_SCORE,
};
pub use sample::{Acquisition, RawSample, Template};
pub use session::{DeviceHandle, DeviceSession, SessionError};
