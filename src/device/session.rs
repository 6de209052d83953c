//! Scoped ownership of one open reader.
//!
//! A [`DeviceSession`] is the only way the workflows touch an open reader.
//! Closing consumes the session, so use-after-close does not compile, and
//! the `Drop` impl releases the reader on every early return or unwind.

use super::{DeviceError, FingerprintDevice, RawSample};
use thiserror::Error;

/// Errors surfaced by a device session.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("No fingerprint devices found")]
    NoDeviceFound,
    #[error("Cannot open device: {0}")]
    DeviceOpenFailed(DeviceError),
    #[error("Capture failed: {0}")]
    AcquisitionFailed(DeviceError),
}

/// Description of an opened reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceHandle {
    /// Reader index the session was opened on.
    pub index: usize,
    /// Raw sample width in pixels.
    pub width: u32,
    /// Raw sample height in pixels.
    pub height: u32,
}

/// Exclusive, scoped use of one reader.
pub struct DeviceSession<'a, D: FingerprintDevice + ?Sized> {
    device: &'a mut D,
    handle: DeviceHandle,
    closed: bool,
}

impl<'a, D: FingerprintDevice + ?Sized> DeviceSession<'a, D> {
    /// Enumerates readers and opens the one at `index`.
    ///
    /// Fails with [`SessionError::NoDeviceFound`] without calling `open` when
    /// no reader is attached.
    pub fn open(device: &'a mut D, index: usize) -> Result<Self, SessionError> {
        let count = device.device_count();
        if count == 0 {
            return Err(SessionError::NoDeviceFound);
        }
        if index >= count {
            return Err(SessionError::DeviceOpenFailed(DeviceError::Driver(format!(
                "index {} out of range ({} attached)",
                index, count
            ))));
        }

        device.open(index).map_err(SessionError::DeviceOpenFailed)?;

        let handle = DeviceHandle {
            index,
            width: device.image_width(),
            height: device.image_height(),
        };
        tracing::debug!(
            index,
            width = handle.width,
            height = handle.height,
            "Reader opened"
        );

        Ok(Self {
            device,
            handle,
            closed: false,
        })
    }

    /// Returns the handle description.
    pub fn handle(&self) -> DeviceHandle {
        self.handle
    }

    /// Probes the sensor once.
    pub fn poll(&mut self) -> Result<Option<RawSample>, SessionError> {
        let acquisition = self
            .device
            .acquire()
            .map_err(SessionError::AcquisitionFailed)?;

        Ok(acquisition.map(|acq| RawSample::new(acq, self.handle.width, self.handle.height)))
    }

    /// Closes the reader.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.device.close();
        tracing::debug!(index = self.handle.index, "Reader closed");
    }
}

impl<D: FingerprintDevice + ?Sized> Drop for DeviceSession<'_, D> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MockDevice;

    #[test]
    fn test_no_device_skips_open() {
        let mut device = MockDevice::new(4, 4).with_device_count(0);

        assert!(matches!(
            DeviceSession::open(&mut device, 0),
            Err(SessionError::NoDeviceFound)
        ));

        assert_eq!(device.stats().opens, 0);
        assert_eq!(device.stats().closes, 0);
    }

    #[test]
    fn test_open_failure_reports_cause() {
        let mut device = MockDevice::new(4, 4).fail_open("permission denied");

        let err = DeviceSession::open(&mut device, 0).err().unwrap();
        assert_eq!(err.to_string(), "Cannot open device: permission denied");
        assert_eq!(device.stats().closes, 0);
    }

    #[test]
    fn test_index_out_of_range() {
        let mut device = MockDevice::new(4, 4);

        assert!(matches!(
            DeviceSession::open(&mut device, 3),
            Err(SessionError::DeviceOpenFailed(_))
        ));
        assert_eq!(device.stats().opens, 0);
    }

    #[test]
    fn test_close_runs_once() {
        let mut device = MockDevice::new(4, 4);

        let session = DeviceSession::open(&mut device, 0).unwrap();
        assert_eq!(session.handle().width, 4);
        session.close();

        assert_eq!(device.stats().opens, 1);
        assert_eq!(device.stats().closes, 1);
    }

    #[test]
    fn test_drop_closes_reader() {
        let mut device = MockDevice::new(4, 4).then_fail("sensor fault");

        {
            let mut session = DeviceSession::open(&mut device, 0).unwrap();
            assert!(session.poll().is_err());
        }

        assert_eq!(device.stats().closes, 1);
    }

    #[test]
    fn test_poll_tags_dimensions() {
        let mut device = MockDevice::new(3, 2)
            .then_empty(1)
            .then_sample(vec![7, 7], vec![10u8; 6]);

        let mut session = DeviceSession::open(&mut device, 0).unwrap();
        assert!(session.poll().unwrap().is_none());

        let sample = session.poll().unwrap().unwrap();
        assert_eq!((sample.width(), sample.height()), (3, 2));
        assert!(sample.is_valid());
    }
}
