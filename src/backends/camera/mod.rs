// SPDX-License-Identifier: GPL-3.0-only

//! Camera platform abstraction
//!
//! The capture controller never talks to a camera stack directly. It consumes
//! four collaborators, each behind a trait:
//!
//! ```text
//! ┌──────────────────────┐
//! │  CaptureController   │
//! └───┬──────┬──────┬────┘
//!     │      │      │
//!     ▼      ▼      ▼
//! Registry Session PhotoLibrary
//!            │
//!            ▼
//!       PhotoOutput
//! ```
//!
//! [`gst`] provides the GStreamer implementation of the registry, session and
//! photo output; the photo library lives in [`crate::storage`].

pub mod gst;
pub mod preview;
pub mod types;

pub use preview::{Bounds, PreviewLayer, SourceRegion, VideoGravity, VideoOrientation};
pub use types::*;

use crate::errors::PhotoError;
use std::path::PathBuf;
use std::sync::Arc;

/// Camera device registry
pub trait DeviceRegistry {
    /// Enumerate the devices that satisfy `criteria`, in platform order
    fn discover(&self, criteria: &DiscoveryCriteria) -> Vec<CameraDevice>;
}

/// Aggregate binding one camera input to one photo output
///
/// Invariant: at most one input and one output are attached at any time.
pub trait CaptureSession: Send {
    // ===== Configuration =====

    /// Set the capture quality preset
    fn set_preset(&mut self, preset: SessionPreset);

    /// Currently configured preset, `None` until [`set_preset`](Self::set_preset)
    fn preset(&self) -> Option<SessionPreset>;

    // ===== Input =====

    /// Wrap a device as a capture input
    ///
    /// Fails when the device is busy, access is denied, or the hardware does
    /// not respond.
    fn open_input(&self, device: &CameraDevice) -> BackendResult<DeviceInput>;

    /// Attach an input. Fails with [`BackendError::AlreadyAttached`] if one is present.
    fn add_input(&mut self, input: DeviceInput) -> BackendResult<()>;

    /// Detach and return the current input
    fn remove_input(&mut self) -> Option<DeviceInput>;

    /// Currently attached input
    fn input(&self) -> Option<&DeviceInput>;

    // ===== Output =====

    /// Create a photo output able to serve this session
    fn new_photo_output(&self) -> Arc<dyn PhotoOutput>;

    /// Attach an output. Fails with [`BackendError::AlreadyAttached`] if one is present.
    fn add_output(&mut self, output: Arc<dyn PhotoOutput>) -> BackendResult<()>;

    /// Currently attached output
    fn output(&self) -> Option<Arc<dyn PhotoOutput>>;

    // ===== Preview =====

    /// Bind a preview layer and get the stream of frames it should display
    fn attach_preview(&mut self, layer: &PreviewLayer) -> BackendResult<FrameReceiver>;

    // ===== Lifecycle =====

    /// Start delivering frames
    fn start_running(&mut self) -> BackendResult<()>;

    /// Stop delivering frames and release the device
    fn stop_running(&mut self) -> BackendResult<()>;

    fn is_running(&self) -> bool;
}

/// Photo sink: turns a capture request into finished image bytes
pub trait PhotoOutput: Send + Sync {
    /// Register settings profiles the output should be ready to serve
    fn set_prepared_settings(&self, settings: Vec<CaptureSettings>);

    /// Profiles registered with [`set_prepared_settings`](Self::set_prepared_settings)
    fn prepared_settings(&self) -> Vec<CaptureSettings>;

    /// Request one photo
    ///
    /// Returns immediately. `completion` is invoked exactly once, possibly on
    /// another thread, with the encoded photo or the reason it failed.
    fn capture_photo(&self, settings: CaptureSettings, completion: CaptureCompletion);
}

/// Destination for finished photos
pub trait PhotoLibrary: Send + Sync {
    /// Persist an encoded photo and return where it went
    fn save(&self, photo: &CapturedPhoto) -> Result<PathBuf, PhotoError>;
}
