// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer camera platform
//!
//! - [`GstDeviceRegistry`]: device discovery via `gstreamer::DeviceMonitor`
//! - [`GstSession`]: one input, one photo output, one capture pipeline
//! - [`GstPhotoOutput`]: still capture from the running pipeline's frames

pub mod enumeration;
pub mod photo_output;
pub mod pipeline;

pub use enumeration::GstDeviceRegistry;
pub use photo_output::GstPhotoOutput;
pub use pipeline::{CapturePipeline, FrameSlot};

use super::types::*;
use super::{CaptureSession, PhotoOutput, PreviewLayer};
use crate::constants::pipeline::PREVIEW_CHANNEL_CAPACITY;
use crate::flash::FlashDevice;
use gstreamer::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Capture session driving a GStreamer pipeline
pub struct GstSession {
    preset: Option<SessionPreset>,
    input: Option<DeviceInput>,
    output: Option<Arc<dyn PhotoOutput>>,
    preview: Option<FrameSender>,
    frames: Arc<FrameSlot>,
    pipeline: Option<CapturePipeline>,
    flash_devices: Vec<FlashDevice>,
    jpeg_quality: u8,
}

impl GstSession {
    /// Create an idle session; photo outputs it creates encode JPEG at `jpeg_quality`
    pub fn new(jpeg_quality: u8) -> Self {
        let flash_devices = FlashDevice::discover();
        if flash_devices.is_empty() {
            debug!("No flash LEDs found");
        }

        Self {
            preset: None,
            input: None,
            output: None,
            preview: None,
            frames: FrameSlot::new(),
            pipeline: None,
            flash_devices,
            jpeg_quality,
        }
    }

    /// Latest-frame slot shared with the photo outputs of this session
    pub fn frames(&self) -> Arc<FrameSlot> {
        Arc::clone(&self.frames)
    }
}

impl CaptureSession for GstSession {
    fn set_preset(&mut self, preset: SessionPreset) {
        info!(preset = %preset, "Session preset configured");
        self.preset = Some(preset);
    }

    fn preset(&self) -> Option<SessionPreset> {
        self.preset
    }

    fn open_input(&self, device: &CameraDevice) -> BackendResult<DeviceInput> {
        gstreamer::init().map_err(|e| BackendError::NotAvailable(e.to_string()))?;

        let source = pipeline::make_source(device)?;

        // READY opens the device, so busy and permission errors surface here
        let opened = source.set_state(gstreamer::State::Ready);
        let _ = source.set_state(gstreamer::State::Null);

        match opened {
            Ok(_) => {
                debug!(device = %device.name, "Device input opened");
                Ok(DeviceInput::new(device.clone()))
            }
            Err(e) => Err(BackendError::InitializationFailed(format!(
                "{} could not be opened: {}",
                device.name, e
            ))),
        }
    }

    fn add_input(&mut self, input: DeviceInput) -> BackendResult<()> {
        if self.input.is_some() {
            return Err(BackendError::AlreadyAttached("input"));
        }
        info!(device = %input.device().name, "Input attached");
        self.input = Some(input);
        Ok(())
    }

    fn remove_input(&mut self) -> Option<DeviceInput> {
        let removed = self.input.take();
        if let Some(input) = &removed {
            info!(device = %input.device().name, "Input detached");
        }
        removed
    }

    fn input(&self) -> Option<&DeviceInput> {
        self.input.as_ref()
    }

    fn new_photo_output(&self) -> Arc<dyn PhotoOutput> {
        Arc::new(GstPhotoOutput::new(
            self.frames(),
            self.flash_devices.clone(),
            self.jpeg_quality,
        ))
    }

    fn add_output(&mut self, output: Arc<dyn PhotoOutput>) -> BackendResult<()> {
        if self.output.is_some() {
            return Err(BackendError::AlreadyAttached("output"));
        }
        debug!("Photo output attached");
        self.output = Some(output);
        Ok(())
    }

    fn output(&self) -> Option<Arc<dyn PhotoOutput>> {
        self.output.clone()
    }

    fn attach_preview(&mut self, layer: &PreviewLayer) -> BackendResult<FrameReceiver> {
        if self.preview.is_some() {
            return Err(BackendError::AlreadyAttached("preview layer"));
        }
        let (sender, receiver) = futures::channel::mpsc::channel(PREVIEW_CHANNEL_CAPACITY);
        debug!(
            gravity = ?layer.gravity,
            orientation = ?layer.orientation,
            z_index = layer.z_index,
            "Preview layer bound to session"
        );
        self.preview = Some(sender);
        Ok(receiver)
    }

    fn start_running(&mut self) -> BackendResult<()> {
        if self.pipeline.is_some() {
            debug!("Session already running");
            return Ok(());
        }
        let input = self
            .input
            .as_ref()
            .ok_or_else(|| BackendError::InvalidState("no input attached".to_string()))?;

        let preset = self.preset.unwrap_or_default();
        let pipeline = CapturePipeline::new(
            input.device(),
            preset,
            self.preview.clone(),
            Arc::clone(&self.frames),
        )?;
        self.pipeline = Some(pipeline);
        info!(device = %input.device().name, "Session running");
        Ok(())
    }

    fn stop_running(&mut self) -> BackendResult<()> {
        let Some(pipeline) = self.pipeline.take() else {
            return Ok(());
        };
        self.frames.clear();
        pipeline.stop().inspect_err(|e| warn!(error = %e, "Pipeline did not stop cleanly"))
    }

    fn is_running(&self) -> bool {
        self.pipeline.is_some()
    }
}
