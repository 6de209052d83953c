//! Raw sample to template + preview image.
//!
//! The template passes through untouched. The pixel buffer goes through a
//! percentile stretch, a cosmetic contrast and sharpness boost, a
//! nearest-neighbour upscale, and is finally encoded as PNG.

mod enhance;
mod normalize;

pub use enhance::{adjust_contrast, adjust_sharpness, upscale_nearest};
pub use normalize::PercentileStretch;

use crate::device::{RawSample, Template};
use chrono::{DateTime, Utc};
use image::{GrayImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;

/// Errors that can occur while extracting a sample.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("malformed sample: expected {expected} pixel bytes, got {actual}")]
    MalformedSample { expected: usize, actual: usize },
    #[error("preview of {width}x{height} cannot be upscaled by {scale}")]
    PreviewTooLarge { width: u32, height: u32, scale: u32 },
    #[error("failed to encode preview image: {0}")]
    Encode(#[from] image::ImageError),
}

/// Preview enhancement settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    /// Percentile mapped to black.
    pub low_percentile: f64,
    /// Percentile mapped to white.
    pub high_percentile: f64,
    /// Contrast factor (1.0 = unchanged).
    pub contrast: f32,
    /// Sharpness factor (1.0 = unchanged).
    pub sharpness: f32,
    /// Integer upscale factor for the preview.
    pub upscale: u32,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            low_percentile: 5.0,
            high_percentile: 95.0,
            contrast: 1.3,
            sharpness: 1.5,
            upscale: 2,
        }
    }
}

/// Template and PNG preview derived from one raw sample.
#[derive(Debug, Clone)]
pub struct ExtractedSample {
    /// Template exactly as the reader produced it.
    pub template: Template,
    /// Enhanced preview, PNG encoded.
    pub image_png: Vec<u8>,
    /// Preview width in pixels.
    pub width: u32,
    /// Preview height in pixels.
    pub height: u32,
    /// When the sample came off the sensor.
    pub captured_at: DateTime<Utc>,
}

/// Turns raw samples into templates and presentable previews.
#[derive(Debug, Clone, Default)]
pub struct SampleExtractor {
    config: EnhanceConfig,
}

impl SampleExtractor {
    pub fn new(config: EnhanceConfig) -> Self {
        Self { config }
    }

    /// Returns the enhancement settings.
    pub fn config(&self) -> &EnhanceConfig {
        &self.config
    }

    /// Extracts the template and builds the preview.
    pub fn extract(&self, sample: RawSample) -> Result<ExtractedSample, ExtractionError> {
        if !sample.is_valid() {
            return Err(ExtractionError::MalformedSample {
                expected: sample.pixel_count(),
                actual: sample.pixels().len(),
            });
        }

        let (width, height) = (sample.width(), sample.height());
        let captured_at = sample.captured_at();
        let (template, pixels) = sample.into_parts();

        let preview = self.enhance(pixels, width, height)?;
        let image_png = encode_png(&preview)?;

        tracing::debug!(
            template = %template.digest(),
            width = preview.width(),
            height = preview.height(),
            png_bytes = image_png.len(),
            "Sample extracted"
        );

        Ok(ExtractedSample {
            template,
            image_png,
            width: preview.width(),
            height: preview.height(),
            captured_at,
        })
    }

    /// Runs the enhancement chain on a raw grayscale buffer.
    pub fn enhance(
        &self,
        pixels: Vec<u8>,
        width: u32,
        height: u32,
    ) -> Result<GrayImage, ExtractionError> {
        let expected = (width as usize) * (height as usize);
        let actual = pixels.len();

        let stretch =
            PercentileStretch::new(self.config.low_percentile, self.config.high_percentile);
        let normalized = GrayImage::from_raw(width, height, stretch.apply(&pixels))
            .ok_or(ExtractionError::MalformedSample { expected, actual })?;

        let contrasted = adjust_contrast(&normalized, self.config.contrast);
        let sharpened = adjust_sharpness(&contrasted, self.config.sharpness);
        let scale = self.config.upscale;
        upscale_nearest(&sharpened, scale).ok_or(ExtractionError::PreviewTooLarge {
            width,
            height,
            scale,
        })
    }
}

fn encode_png(img: &GrayImage) -> Result<Vec<u8>, ExtractionError> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}
