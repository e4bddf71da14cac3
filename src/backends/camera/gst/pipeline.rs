// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer pipeline for camera capture
//!
//! ```text
//! source → videoconvert → videoscale → capsfilter(RGBA) → appsink
//!                                                           │
//!                                      ┌────────────────────┴───────────┐
//!                                      ▼                                ▼
//!                               preview channel                    FrameSlot
//!                           (try_send, drops when full)      (latest frame for capture)
//! ```

use super::super::types::*;
use crate::constants::{pipeline, timing};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::{VideoCapsBuilder, VideoFormat, VideoInfo};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Default)]
struct SlotState {
    sequence: u64,
    frame: Option<CameraFrame>,
}

/// Most recent frame delivered by the pipeline
///
/// Shared between the appsink callback (writer) and photo outputs (readers).
/// Every published frame bumps a sequence number so readers can wait for
/// frames newer than the moment they asked.
#[derive(Default)]
pub struct FrameSlot {
    state: Mutex<SlotState>,
    fresh: Condvar,
}

impl FrameSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Replace the latest frame and wake waiting readers
    pub fn publish(&self, frame: CameraFrame) {
        if let Ok(mut state) = self.state.lock() {
            state.sequence += 1;
            state.frame = Some(frame);
        }
        self.fresh.notify_all();
    }

    /// Latest frame, if any has arrived since the last [`clear`](Self::clear)
    pub fn latest(&self) -> Option<CameraFrame> {
        self.state.lock().ok()?.frame.clone()
    }

    /// Sequence number of the latest frame (0 before the first frame)
    pub fn sequence(&self) -> u64 {
        self.state.lock().map(|s| s.sequence).unwrap_or(0)
    }

    /// Block until a frame newer than `after` arrives or `timeout` elapses
    pub fn wait_newer(&self, after: u64, timeout: Duration) -> Option<(u64, CameraFrame)> {
        let guard = self.state.lock().ok()?;
        let (state, _) = self
            .fresh
            .wait_timeout_while(guard, timeout, |s| s.sequence <= after || s.frame.is_none())
            .ok()?;

        if state.sequence <= after {
            return None;
        }
        state.frame.clone().map(|frame| (state.sequence, frame))
    }

    /// Forget the latest frame (camera stopped or switched)
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.frame = None;
        }
    }
}

/// Camera capture pipeline
///
/// Opens the device through its source element and delivers RGBA frames to
/// the preview channel and the shared [`FrameSlot`].
pub struct CapturePipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
}

impl CapturePipeline {
    /// Create the pipeline and set it to PLAYING
    pub fn new(
        device: &CameraDevice,
        preset: SessionPreset,
        mut preview: Option<FrameSender>,
        slot: Arc<FrameSlot>,
    ) -> BackendResult<Self> {
        info!(
            device = %device.name,
            source = %device.source_element,
            preset = %preset,
            "Creating capture pipeline"
        );

        gstreamer::init().map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        let source = make_source(device)?;
        let convert = make_element("videoconvert")?;
        let scale = make_element("videoscale")?;

        let mut caps = VideoCapsBuilder::new().format(VideoFormat::Rgba);
        if let Some((width, height)) = preset.resolution() {
            caps = caps.width(width as i32).height(height as i32);
        }
        let caps = caps.build();
        debug!(caps = %caps, "Capture caps");

        let capsfilter = gstreamer::ElementFactory::make("capsfilter")
            .property("caps", &caps)
            .build()
            .map_err(|e| BackendError::InitializationFailed(format!("capsfilter: {}", e)))?;

        let appsink = AppSink::builder()
            .caps(&caps)
            .max_buffers(pipeline::MAX_BUFFERS)
            .drop(true)
            .sync(false)
            .build();

        let gst_pipeline = gstreamer::Pipeline::new();
        gst_pipeline
            .add_many([&source, &convert, &scale, &capsfilter, appsink.upcast_ref()])
            .map_err(|e| BackendError::InitializationFailed(format!("Failed to add elements: {}", e)))?;
        gstreamer::Element::link_many([&source, &convert, &scale, &capsfilter, appsink.upcast_ref()])
            .map_err(|e| {
                BackendError::InitializationFailed(format!("Failed to link elements: {}", e))
            })?;

        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let frame_start = Instant::now();
                    let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);

                    let sample = appsink.pull_sample().map_err(|e| {
                        if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                            error!(frame = frame_num, error = ?e, "Failed to pull sample");
                        }
                        gstreamer::FlowError::Eos
                    })?;

                    let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
                    if buffer.flags().contains(gstreamer::BufferFlags::CORRUPTED) {
                        if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                            warn!(frame = frame_num, "Buffer marked as corrupted, skipping frame");
                        }
                        return Ok(gstreamer::FlowSuccess::Ok);
                    }

                    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
                    let video_info =
                        VideoInfo::from_caps(caps).map_err(|_| gstreamer::FlowError::Error)?;
                    let map = buffer
                        .map_readable()
                        .map_err(|_| gstreamer::FlowError::Error)?;

                    let frame = CameraFrame {
                        width: video_info.width(),
                        height: video_info.height(),
                        data: Arc::from(map.as_slice()),
                        format: PixelFormat::RGBA,
                        stride: video_info.stride()[0] as u32,
                        captured_at: frame_start,
                    };

                    slot.publish(frame.clone());

                    // One sender for the pipeline's lifetime keeps the channel bounded
                    if let Some(sender) = preview.as_mut() {
                        offer_preview(sender, frame, frame_num);
                    }

                    if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                        debug!(
                            frame = frame_num,
                            width = video_info.width(),
                            height = video_info.height(),
                            total_us = frame_start.elapsed().as_micros(),
                            "Frame delivered"
                        );
                    }

                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        debug!("Setting pipeline to PLAYING state");
        if let Err(e) = gst_pipeline.set_state(gstreamer::State::Playing) {
            let _ = gst_pipeline.set_state(gstreamer::State::Null);
            return Err(BackendError::InitializationFailed(format!(
                "Failed to start pipeline: {}",
                e
            )));
        }

        let (result, state, pending) = gst_pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::START_TIMEOUT_SECS,
        ));
        debug!(result = ?result, state = ?state, pending = ?pending, "Pipeline state");
        if result.is_err() {
            let _ = gst_pipeline.set_state(gstreamer::State::Null);
            return Err(BackendError::InitializationFailed(
                "Pipeline failed to reach PLAYING".to_string(),
            ));
        }
        if state != gstreamer::State::Playing {
            warn!("Pipeline is not in PLAYING state yet");
        }

        info!(device = %device.name, "Capture pipeline running");

        Ok(Self {
            pipeline: gst_pipeline,
            appsink,
        })
    }

    /// Stop the pipeline and release the camera
    pub fn stop(self) -> BackendResult<()> {
        info!("Stopping capture pipeline");

        // Clear appsink callbacks to release the preview sender and frame slot
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());

        self.pipeline
            .set_state(gstreamer::State::Null)
            .map_err(|e| BackendError::Other(format!("Failed to stop pipeline: {}", e)))?;

        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
        match result {
            Ok(_) => info!(state = ?state, "Capture pipeline stopped"),
            Err(e) => debug!(error = ?e, state = ?state, "Pipeline state change had issues"),
        }

        Ok(())
    }
}

impl Drop for CapturePipeline {
    fn drop(&mut self) {
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
        let _ = self.pipeline.set_state(gstreamer::State::Null);
    }
}

/// Queue a frame for the preview, dropping it when the consumer is behind
///
/// Returns whether the frame was queued.
fn offer_preview(sender: &mut FrameSender, frame: CameraFrame, frame_num: u64) -> bool {
    match sender.try_send(frame) {
        Ok(()) => true,
        Err(e) => {
            if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                debug!(frame = frame_num, full = e.is_full(), "Preview frame dropped");
            }
            false
        }
    }
}

fn make_element(factory: &str) -> BackendResult<gstreamer::Element> {
    gstreamer::ElementFactory::make(factory)
        .build()
        .map_err(|e| BackendError::InitializationFailed(format!("{}: {}", factory, e)))
}

/// Build the source element for a device
///
/// The address property depends on the element: PipeWire targets an object
/// serial, V4L2 a device node, libcamera a camera name.
pub(super) fn make_source(device: &CameraDevice) -> BackendResult<gstreamer::Element> {
    let factory = if device.source_element.is_empty() {
        "autovideosrc"
    } else {
        device.source_element.as_str()
    };

    let builder = gstreamer::ElementFactory::make(factory);
    let builder = match (factory, device.path.is_empty()) {
        (_, true) | ("autovideosrc", _) => builder,
        ("pipewiresrc", false) => builder.property("target-object", device.path.as_str()),
        ("v4l2src", false) => builder.property("device", device.path.as_str()),
        ("libcamerasrc", false) => builder.property("camera-name", device.path.as_str()),
        (other, false) => {
            warn!(element = other, "Unknown source element, device address ignored");
            builder
        }
    };

    builder.build().map_err(|e| {
        BackendError::DeviceNotFound(format!("{} ({}): {}", device.name, factory, e))
    })
}
