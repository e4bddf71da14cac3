// SPDX-License-Identifier: GPL-3.0-only

//! Photo encoding
//!
//! This module handles encoding captured frames to:
//! - JPEG (with quality control)
//! - PNG (lossless)

use super::processing::to_rgb_image;
use crate::backends::camera::types::{CameraFrame, PhotoCodec};
use image::RgbImage;
use tracing::debug;

/// Encoded image data ready for saving
#[derive(Debug)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub codec: PhotoCodec,
    pub width: u32,
    pub height: u32,
}

/// Photo encoder
#[derive(Debug, Clone, Copy)]
pub struct PhotoEncoder {
    jpeg_quality: u8,
}

impl PhotoEncoder {
    /// Create a new encoder; `jpeg_quality` is clamped to 1-100
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Encode a camera frame with the given codec
    pub fn encode(&self, frame: &CameraFrame, codec: PhotoCodec) -> Result<EncodedImage, String> {
        let image = to_rgb_image(frame).ok_or_else(|| {
            format!(
                "Frame buffer too small for {}x{} (stride {})",
                frame.width, frame.height, frame.stride
            )
        })?;

        let data = match codec {
            PhotoCodec::Jpeg => Self::encode_jpeg(&image, self.jpeg_quality)?,
            PhotoCodec::Png => Self::encode_png(&image)?,
        };

        debug!(size = data.len(), codec = ?codec, "Encoding complete");

        Ok(EncodedImage {
            data,
            codec,
            width: image.width(),
            height: image.height(),
        })
    }

    /// Encode image as JPEG
    fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, String> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);

        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);

        encoder
            .encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| format!("JPEG encoding failed: {}", e))?;

        Ok(buffer)
    }

    /// Encode image as PNG
    fn encode_png(image: &RgbImage) -> Result<Vec<u8>, String> {
        let mut buffer = Vec::new();

        image
            .write_to(
                &mut std::io::Cursor::new(&mut buffer),
                image::ImageFormat::Png,
            )
            .map_err(|e| format!("PNG encoding failed: {}", e))?;

        Ok(buffer)
    }
}
