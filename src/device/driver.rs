//! Fingerprint reader driver abstraction.
//!
//! The vendor SDK is an external collaborator. This module describes the
//! surface the workflows need from it, so real hardware bindings and mock
//! readers can be swapped freely.

use super::Acquisition;
use crate::matching::TemplateMatcher;
use thiserror::Error;

/// Errors reported by a reader driver.
#[derive(Debug, Clone, Error)]
pub enum DeviceError {
    #[error("driver initialization failed: {0}")]
    InitFailed(String),
    #[error("device is busy")]
    Busy,
    #[error("device is not open")]
    NotOpen,
    #[error("{0}")]
    Driver(String),
}

/// Driver for one initialised fingerprint SDK instance.
///
/// A driver instance is created per request by a [`DeviceProvider`] and
/// terminated when dropped. It also exposes the device family's template
/// matching primitive, which does not require an open reader.
pub trait FingerprintDevice: TemplateMatcher + Send {
    /// Number of readers currently attached.
    fn device_count(&mut self) -> usize;

    /// Opens the reader at `index` for exclusive use.
    fn open(&mut self, index: usize) -> Result<(), DeviceError>;

    /// Probes the sensor once.
    ///
    /// Returns `Ok(None)` when no finger is presented. Never blocks longer
    /// than one probe interval.
    fn acquire(&mut self) -> Result<Option<Acquisition>, DeviceError>;

    /// Raw image width reported by the open reader.
    fn image_width(&self) -> u32;

    /// Raw image height reported by the open reader.
    fn image_height(&self) -> u32;

    /// Releases the open reader.
    fn close(&mut self);
}

/// Creates freshly initialised drivers, one per request.
pub trait DeviceProvider: Send + Sync {
    /// Initialises the SDK and returns a driver handle.
    fn initialize(&self) -> Result<Box<dyn FingerprintDevice>, DeviceError>;
}

impl<F> DeviceProvider for F
where
    F: Fn() -> Result<Box<dyn FingerprintDevice>, DeviceError> + Send + Sync,
{
    fn initialize(&self) -> Result<Box<dyn FingerprintDevice>, DeviceError> {
        self()
    }
}
