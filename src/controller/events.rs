// SPDX-License-Identifier: GPL-3.0-only

//! Events published by the capture controller

use crate::backends::camera::CameraDevice;
use crate::errors::{CameraError, PhotoError};
use std::path::PathBuf;
use uuid::Uuid;

/// Something the front-end may want to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// Device selection finished; `None` when no usable camera exists
    DeviceSelected(Option<CameraDevice>),
    /// The selected device could not be wired; the app runs degraded
    WiringFailed(CameraError),
    /// Frames are flowing
    SessionStarted,
    /// The session could not be started
    SessionFailed(CameraError),
    /// The user switched cameras
    CameraSwitched(CameraDevice),
    /// A capture request was submitted
    CaptureStarted(Uuid),
    /// A photo was written to the library
    PhotoSaved { request_id: Uuid, path: PathBuf },
    /// A capture ended without a saved photo
    CaptureFailed { request_id: Uuid, error: PhotoError },
}
