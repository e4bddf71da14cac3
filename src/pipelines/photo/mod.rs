// SPDX-License-Identifier: GPL-3.0-only

//! Photo capture pipeline
//!
//! ```text
//! Fresh frames → Frame choice → RGBA→RGB → Encoding → CapturedPhoto
//!       ↓
//! Preview continues uninterrupted
//! ```
//!
//! Runs synchronously on the photo output's worker thread; the caller is
//! responsible for keeping it off the foreground thread.

pub mod encoding;
pub mod processing;

pub use encoding::{EncodedImage, PhotoEncoder};
pub use processing::{estimate_luminance, select_sharpest, sharpness};

use crate::backends::camera::types::{CameraFrame, CaptureError, CaptureSettings, CapturedPhoto};
use tracing::{debug, info};

/// Frame selection and encoding for one capture request
pub struct PhotoPipeline {
    encoder: PhotoEncoder,
}

impl PhotoPipeline {
    /// Create a pipeline encoding JPEG at `jpeg_quality`
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            encoder: PhotoEncoder::new(jpeg_quality),
        }
    }

    /// Pick the frame to keep out of the fresh frames collected for a request
    ///
    /// With stabilization the sharpest frame wins, otherwise the first one.
    pub fn choose_frame(frames: Vec<CameraFrame>, stabilization: bool) -> Option<CameraFrame> {
        if stabilization {
            select_sharpest(frames)
        } else {
            frames.into_iter().next()
        }
    }

    /// Run the pipeline for one request
    pub fn process(
        &self,
        frames: Vec<CameraFrame>,
        settings: &CaptureSettings,
    ) -> Result<CapturedPhoto, CaptureError> {
        debug!(
            candidates = frames.len(),
            stabilization = settings.stabilization,
            "Choosing capture frame"
        );

        let frame = Self::choose_frame(frames, settings.stabilization)
            .ok_or(CaptureError::NoFrameAvailable)?;

        let encoded = self
            .encoder
            .encode(&frame, settings.codec)
            .map_err(CaptureError::EncodingFailed)?;

        info!(
            request = %settings.id,
            width = encoded.width,
            height = encoded.height,
            size = encoded.data.len(),
            "Photo encoded"
        );

        Ok(CapturedPhoto {
            request_id: settings.id,
            data: encoded.data,
            codec: encoded.codec,
            width: encoded.width,
            height: encoded.height,
        })
    }
}
