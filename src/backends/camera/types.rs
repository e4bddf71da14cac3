// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Physical placement of a camera relative to the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DevicePosition {
    /// Facing the user (selfie camera)
    Front,
    /// Facing away from the user (main camera)
    Back,
    /// Position not reported by the platform (USB webcams, virtual sources)
    #[default]
    Unspecified,
}

impl DevicePosition {
    /// Parse a location string as reported by libcamera / device tree
    /// (`"front"`, `"back"`, `"external"`).
    pub fn from_location(location: &str) -> Self {
        match location.trim().to_ascii_lowercase().as_str() {
            "front" => DevicePosition::Front,
            "back" | "rear" => DevicePosition::Back,
            _ => DevicePosition::Unspecified,
        }
    }
}

impl std::fmt::Display for DevicePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DevicePosition::Front => write!(f, "front"),
            DevicePosition::Back => write!(f, "back"),
            DevicePosition::Unspecified => write!(f, "unspecified"),
        }
    }
}

/// Kind of camera module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceType {
    /// Built-in wide-angle color camera (the common case)
    #[default]
    WideAngle,
    /// Externally attached camera reported as such by the platform
    External,
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceType::WideAngle => write!(f, "wide-angle"),
            DeviceType::External => write!(f, "external"),
        }
    }
}

/// Media a device must be able to produce to be discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaType {
    #[default]
    Video,
}

/// Filter passed to [`DeviceRegistry::discover`](super::DeviceRegistry::discover)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryCriteria {
    /// Accepted device types (empty accepts everything)
    pub device_types: Vec<DeviceType>,
    /// Required media type
    pub media_type: MediaType,
    /// Required position; `Unspecified` accepts every position
    pub position: DevicePosition,
}

impl Default for DiscoveryCriteria {
    /// Wide-angle, video-capable, any position
    fn default() -> Self {
        Self {
            device_types: vec![DeviceType::WideAngle],
            media_type: MediaType::Video,
            position: DevicePosition::Unspecified,
        }
    }
}

impl DiscoveryCriteria {
    /// Check whether a device satisfies this filter
    pub fn matches(&self, device: &CameraDevice) -> bool {
        let type_ok =
            self.device_types.is_empty() || self.device_types.contains(&device.device_type);
        let position_ok =
            self.position == DevicePosition::Unspecified || self.position == device.position;
        type_ok && position_ok
    }
}

/// Represents a camera device
///
/// Handles are produced by a [`DeviceRegistry`](super::DeviceRegistry) and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Stable identifier within one enumeration
    pub id: String,
    /// Human readable name
    pub name: String,
    pub position: DevicePosition,
    pub device_type: DeviceType,
    /// Source element used to open the device (e.g. "v4l2src", "pipewiresrc")
    pub source_element: String,
    /// Device address understood by the source element (node path, serial, camera name)
    pub path: String,
}

impl CameraDevice {
    /// Create a wide-angle device with the given position and no backend source
    pub fn new(id: impl Into<String>, name: impl Into<String>, position: DevicePosition) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
            device_type: DeviceType::WideAngle,
            source_element: String::new(),
            path: String::new(),
        }
    }

    pub fn with_device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = device_type;
        self
    }

    pub fn with_source(mut self, element: impl Into<String>, path: impl Into<String>) -> Self {
        self.source_element = element.into();
        self.path = path.into();
        self
    }
}

impl std::fmt::Display for CameraDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.position, self.device_type)
    }
}

/// A camera device wrapped as a session input
///
/// Only obtainable through [`CaptureSession::open_input`](super::CaptureSession::open_input),
/// which is where busy / permission failures surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInput {
    device: CameraDevice,
}

impl DeviceInput {
    pub fn new(device: CameraDevice) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &CameraDevice {
        &self.device
    }
}

/// Capture quality preset applied to a session before wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionPreset {
    /// Full sensor resolution, suited for still photos
    #[default]
    Photo,
    /// 1920x1080
    High,
    /// 1280x720
    Medium,
    /// 640x480
    Low,
}

impl SessionPreset {
    /// Resolution cap for this preset, `None` keeps the camera's native size
    pub fn resolution(&self) -> Option<(u32, u32)> {
        match self {
            SessionPreset::Photo => None,
            SessionPreset::High => Some((1920, 1080)),
            SessionPreset::Medium => Some((1280, 720)),
            SessionPreset::Low => Some((640, 480)),
        }
    }
}

impl std::fmt::Display for SessionPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.resolution() {
            Some((w, h)) => write!(f, "{:?} ({}x{})", self, w, h),
            None => write!(f, "{:?} (native)", self),
        }
    }
}

/// Pixel format for camera frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            Self::RGBA => 4,
            Self::RGB24 => 3,
        }
    }
}

/// A single frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// Timestamp when frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed RGBA frame
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data),
            format: PixelFormat::RGBA,
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }

    /// Sample one pixel, clamping coordinates to the frame
    pub fn pixel_rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let idx = (y * self.stride + x * self.format.bytes_per_pixel()) as usize;
        if idx + 2 < self.data.len() {
            (self.data[idx], self.data[idx + 1], self.data[idx + 2])
        } else {
            (0, 0, 0)
        }
    }
}

/// Flash behaviour for a single capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlashMode {
    /// Never fire
    Off,
    /// Always fire
    On,
    /// Fire when the scene is dark
    #[default]
    Auto,
}

/// Output codec of a captured photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PhotoCodec {
    #[default]
    Jpeg,
    Png,
}

impl PhotoCodec {
    /// Get file extension for this codec
    pub fn extension(&self) -> &'static str {
        match self {
            PhotoCodec::Jpeg => "jpg",
            PhotoCodec::Png => "png",
        }
    }
}

/// Per-request capture configuration
///
/// Constructed fresh for every shutter press; the id ties the completion back
/// to the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSettings {
    pub id: Uuid,
    pub flash_mode: FlashMode,
    pub stabilization: bool,
    pub codec: PhotoCodec,
}

impl CaptureSettings {
    /// Settings for the given codec with flash off and no stabilization
    pub fn with_codec(codec: PhotoCodec) -> Self {
        Self {
            id: Uuid::new_v4(),
            flash_mode: FlashMode::Off,
            stabilization: false,
            codec,
        }
    }

    pub fn flash_mode(mut self, mode: FlashMode) -> Self {
        self.flash_mode = mode;
        self
    }

    pub fn stabilization(mut self, enabled: bool) -> Self {
        self.stabilization = enabled;
        self
    }
}

/// Encoded photo delivered by a photo output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPhoto {
    /// Id of the [`CaptureSettings`] that requested this photo
    pub request_id: Uuid,
    pub data: Vec<u8>,
    pub codec: PhotoCodec,
    pub width: u32,
    pub height: u32,
}

/// Failure reported through a capture completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The output is already serving a request
    Busy,
    /// The session is not delivering frames
    NoFrameAvailable,
    /// No fresh frame arrived in time
    Timeout,
    /// The frame could not be encoded
    EncodingFailed(String),
    /// Platform failure
    Backend(String),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::Busy => write!(f, "Photo output is busy"),
            CaptureError::NoFrameAvailable => write!(f, "No frame available"),
            CaptureError::Timeout => write!(f, "Timed out waiting for a frame"),
            CaptureError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            CaptureError::Backend(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Result delivered to a capture completion
pub type CaptureResult = Result<CapturedPhoto, CaptureError>;

/// Completion invoked exactly once per capture request, on a backend thread
pub type CaptureCompletion = Box<dyn FnOnce(CaptureResult) + Send + 'static>;

/// Frame receiver type for preview streams
pub type FrameReceiver = futures::channel::mpsc::Receiver<CameraFrame>;

/// Frame sender type for preview streams
pub type FrameSender = futures::channel::mpsc::Sender<CameraFrame>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Failed to open or start a device
    InitializationFailed(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// The session already has an input or output of this kind
    AlreadyAttached(&'static str),
    /// Operation requires a state the session is not in
    InvalidState(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::AlreadyAttached(what) => write!(f, "Session already has an {}", what),
            BackendError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}
