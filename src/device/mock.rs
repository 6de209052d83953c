//! Mock fingerprint reader.
//!
//! Scripted probes and match scores for tests, plus a simulated reader that
//! presents a synthetic finger after a few empty probes for demos.

use super::{Acquisition, DeviceError, DeviceProvider, FingerprintDevice, Template};
use crate::matching::TemplateMatcher;
use std::cell::Cell;
use std::collections::{HashMap, VecDeque};

/// Score the mock matcher reports for byte-identical templates.
pub const IDENTICAL_SCORE: i32 = 100;

/// One scripted sensor probe.
#[derive(Debug, Clone)]
pub enum Probe {
    /// No finger presented.
    Empty,
    /// A finger is presented.
    Sample(Acquisition),
    /// The driver raises an error.
    Fail(String),
}

/// Call counters observed by the mock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockStats {
    pub opens: u32,
    pub closes: u32,
    pub probes: u32,
    pub comparisons: u32,
}

/// Scripted reader for tests and simulation.
///
/// Once the probe script is exhausted every probe reports no finger.
/// Matching uses scripted per-candidate scores; unscripted candidates score
/// [`IDENTICAL_SCORE`] when byte-identical to the captured template and 0
/// otherwise.
#[derive(Debug, Clone)]
pub struct MockDevice {
    device_count: usize,
    width: u32,
    height: u32,
    open_error: Option<String>,
    probes: VecDeque<Probe>,
    scores: HashMap<Vec<u8>, Result<i32, String>>,
    is_open: bool,
    stats: MockStats,
    comparisons: Cell<u32>,
}

impl MockDevice {
    /// Creates a single-reader mock with the given raw image dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            device_count: 1,
            width,
            height,
            open_error: None,
            probes: VecDeque::new(),
            scores: HashMap::new(),
            is_open: false,
            stats: MockStats::default(),
            comparisons: Cell::new(0),
        }
    }

    /// Creates a reader that presents a synthetic finger after
    /// `empty_probes` empty probes.
    pub fn simulated(empty_probes: usize) -> Self {
        let (width, height) = (SIM_WIDTH, SIM_HEIGHT);
        Self::new(width, height)
            .then_empty(empty_probes)
            .then_sample(simulated_template(), synthetic_ridges(width, height))
    }

    /// Sets the number of attached readers.
    pub fn with_device_count(mut self, count: usize) -> Self {
        self.device_count = count;
        self
    }

    /// Makes `open` fail with the given cause.
    pub fn fail_open(mut self, cause: &str) -> Self {
        self.open_error = Some(cause.to_string());
        self
    }

    /// Appends `count` empty probes to the script.
    pub fn then_empty(mut self, count: usize) -> Self {
        self.probes.extend(std::iter::repeat(Probe::Empty).take(count));
        self
    }

    /// Appends a presented finger to the script.
    pub fn then_sample(mut self, template: Vec<u8>, image: Vec<u8>) -> Self {
        self.probes.push_back(Probe::Sample(Acquisition::new(
            Template::from_bytes(template),
            image,
        )));
        self
    }

    /// Appends a driver failure to the script.
    pub fn then_fail(mut self, cause: &str) -> Self {
        self.probes.push_back(Probe::Fail(cause.to_string()));
        self
    }

    /// Scripts the score reported against a candidate template.
    pub fn with_score(mut self, candidate: &[u8], score: i32) -> Self {
        self.scores.insert(candidate.to_vec(), Ok(score));
        self
    }

    /// Scripts a matcher failure against a candidate template.
    pub fn with_match_failure(mut self, candidate: &[u8], cause: &str) -> Self {
        self.scores.insert(candidate.to_vec(), Err(cause.to_string()));
        self
    }

    /// Returns call counters.
    pub fn stats(&self) -> MockStats {
        MockStats {
            comparisons: self.comparisons.get(),
            ..self.stats
        }
    }

    /// Returns true while the reader is open.
    pub fn is_open(&self) -> bool {
        self.is_open
    }
}

impl TemplateMatcher for MockDevice {
    fn match_templates(
        &self,
        captured: &Template,
        candidate: &Template,
    ) -> Result<i32, DeviceError> {
        self.comparisons.set(self.comparisons.get() + 1);
        match self.scores.get(candidate.as_bytes()) {
            Some(Ok(score)) => Ok(*score),
            Some(Err(cause)) => Err(DeviceError::Driver(cause.clone())),
            None if captured.as_bytes() == candidate.as_bytes() => Ok(IDENTICAL_SCORE),
            None => Ok(0),
        }
    }
}

impl FingerprintDevice for MockDevice {
    fn device_count(&mut self) -> usize {
        self.device_count
    }

    fn open(&mut self, index: usize) -> Result<(), DeviceError> {
        if let Some(cause) = &self.open_error {
            return Err(DeviceError::Driver(cause.clone()));
        }
        if self.is_open {
            return Err(DeviceError::Busy);
        }
        self.is_open = true;
        self.stats.opens += 1;
        tracing::debug!(index, "MockDevice opened");
        Ok(())
    }

    fn acquire(&mut self) -> Result<Option<Acquisition>, DeviceError> {
        if !self.is_open {
            return Err(DeviceError::NotOpen);
        }
        self.stats.probes += 1;

        match self.probes.pop_front() {
            None | Some(Probe::Empty) => Ok(None),
            Some(Probe::Sample(acq)) => Ok(Some(acq)),
            Some(Probe::Fail(cause)) => Err(DeviceError::Driver(cause)),
        }
    }

    fn image_width(&self) -> u32 {
        self.width
    }

    fn image_height(&self) -> u32 {
        self.height
    }

    fn close(&mut self) {
        self.is_open = false;
        self.stats.closes += 1;
        tracing::debug!("MockDevice closed");
    }
}

const SIM_WIDTH: u32 = 256;
const SIM_HEIGHT: u32 = 288;

/// Template the simulated reader produces.
pub fn simulated_template() -> Vec<u8> {
    b"SIMULATED-FINGER-TEMPLATE-v1".to_vec()
}

/// Concentric ridge pattern on a mid-gray background.
fn synthetic_ridges(width: u32, height: u32) -> Vec<u8> {
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let radius = cx.min(cy) * 0.9;

    (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| {
            let dx = x as f32 - cx;
            let dy = (y as f32 - cy) * 0.85;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist > radius {
                200
            } else {
                let ridge = (dist / 3.5).sin();
                (110.0 + ridge * 60.0) as u8
            }
        })
        .collect()
}

/// Provider handing out simulated readers.
#[derive(Debug, Clone)]
pub struct SimulatedProvider {
    empty_probes: usize,
}

impl SimulatedProvider {
    /// Creates a provider whose readers present a finger after
    /// `empty_probes` empty probes.
    pub fn new(empty_probes: usize) -> Self {
        Self { empty_probes }
    }
}

impl DeviceProvider for SimulatedProvider {
    fn initialize(&self) -> Result<Box<dyn FingerprintDevice>, DeviceError> {
        Ok(Box::new(MockDevice::simulated(self.empty_probes)))
    }
}
