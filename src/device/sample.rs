//! Sample types produced by a fingerprint reader.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Opaque biometric descriptor produced by the reader.
///
/// Templates are vendor-defined blobs. They are only meaningful to the
/// matching primitive of the same device family, so this type exposes no
/// equality: compare templates through a
/// [`TemplateMatcher`](crate::matching::TemplateMatcher).
#[derive(Clone)]
pub struct Template {
    bytes: Vec<u8>,
}

impl Template {
    /// Wraps raw template bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Decodes a template from its base64 transport encoding.
    pub fn from_base64(encoded: &str) -> Result<Self, base64::DecodeError> {
        STANDARD.decode(encoded.trim()).map(Self::from_bytes)
    }

    /// Returns the base64 transport encoding.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Returns the raw template bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the template size in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the template carries no data.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Short SHA-256 digest, safe to put in logs.
    pub fn digest(&self) -> String {
        let hash = Sha256::digest(&self.bytes);
        hash.iter().take(6).map(|b| format!("{:02x}", b)).collect()
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("bytes", &self.bytes.len())
            .field("digest", &self.digest())
            .finish()
    }
}

/// What the driver hands back for one finger presentation.
#[derive(Debug, Clone)]
pub struct Acquisition {
    /// Template extracted by the reader.
    pub template: Template,
    /// Raw grayscale image bytes, row-major.
    pub image: Vec<u8>,
}

impl Acquisition {
    /// Creates an acquisition from a template and raw image bytes.
    pub fn new(template: Template, image: Vec<u8>) -> Self {
        Self { template, image }
    }
}

/// Sensor output for one presentation, tagged with the session's
/// reported dimensions.
#[derive(Clone)]
pub struct RawSample {
    template: Template,
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    captured_at: DateTime<Utc>,
}

impl RawSample {
    /// Creates a raw sample from an acquisition and the reader dimensions.
    pub fn new(acquisition: Acquisition, width: u32, height: u32) -> Self {
        Self {
            template: acquisition.template,
            pixels: acquisition.image,
            width,
            height,
            captured_at: Utc::now(),
        }
    }

    /// Returns the raw pixel buffer.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the reported image width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the reported image height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns when the sample was taken off the sensor.
    #[inline]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Returns width * height.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Validates that the pixel buffer size matches the dimensions.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.pixel_count()
    }

    /// Splits the sample into its template and pixel buffer.
    pub fn into_parts(self) -> (Template, Vec<u8>) {
        (self.template, self.pixels)
    }
}

impl std::fmt::Debug for RawSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawSample")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixel_bytes", &self.pixels.len())
            .field("template", &self.template)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_creation() {
        let acq = Acquisition::new(Template::from_bytes(vec![1, 2, 3]), vec![0u8; 12]);
        let sample = RawSample::new(acq, 4, 3);

        assert_eq!(sample.width(), 4);
        assert_eq!(sample.height(), 3);
        assert!(sample.is_valid());
    }

    #[test]
    fn test_sample_invalid_size() {
        let acq = Acquisition::new(Template::from_bytes(vec![1]), vec![0u8; 10]);
        let sample = RawSample::new(acq, 4, 3);

        assert!(!sample.is_valid());
    }

    #[test]
    fn test_template_base64() {
        let template = Template::from_bytes(b"opaque".to_vec());
        assert_eq!(template.to_base64(), "b3BhcXVl");

        let decoded = Template::from_base64("b3BhcXVl").unwrap();
        assert_eq!(decoded.as_bytes(), b"opaque");
        assert!(Template::from_base64("not base64!").is_err());
    }

    #[test]
    fn test_debug_hides_template_bytes() {
        let template = Template::from_bytes(vec![0xAB; 4]);
        let rendered = format!("{:?}", template);

        assert!(rendered.contains("bytes: 4"));
        assert!(!rendered.contains("["));
    }
}
