// SPDX-License-Identifier: MPL-2.0

//! In-memory camera platform for controller tests
#![allow(dead_code)]

use shutter::backends::camera::{
    BackendError, BackendResult, CameraDevice, CaptureCompletion, CaptureResult, CaptureSession,
    CaptureSettings, CapturedPhoto, DeviceInput, DevicePosition, DeviceRegistry, DiscoveryCriteria,
    FrameReceiver, PhotoCodec, PhotoLibrary, PhotoOutput, PreviewLayer, SessionPreset,
};
use shutter::errors::PhotoError;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub fn device(id: &str, position: DevicePosition) -> CameraDevice {
    CameraDevice::new(id, id, position)
}

/// Small valid JPEG
pub fn jpeg_bytes() -> Vec<u8> {
    let image = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 100, 50]));
    let mut buffer = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Jpeg)
        .unwrap();
    buffer
}

// ===== Registry =====

pub struct FakeRegistry {
    pub devices: Vec<CameraDevice>,
}

impl FakeRegistry {
    pub fn new(devices: Vec<CameraDevice>) -> Self {
        Self { devices }
    }
}

impl DeviceRegistry for FakeRegistry {
    fn discover(&self, criteria: &DiscoveryCriteria) -> Vec<CameraDevice> {
        self.devices
            .iter()
            .filter(|d| criteria.matches(d))
            .cloned()
            .collect()
    }
}

// ===== Photo output =====

/// What the fake output answers to a capture request
#[derive(Clone)]
pub enum Script {
    /// Complete synchronously with this result
    Complete(CaptureResult),
    /// Keep the completion until the test releases it
    Hold,
}

pub struct FakePhotoOutput {
    script: Mutex<Script>,
    prepared: Mutex<Vec<CaptureSettings>>,
    pub requests: Mutex<Vec<CaptureSettings>>,
    held: Mutex<Vec<(CaptureSettings, CaptureCompletion)>>,
}

impl FakePhotoOutput {
    pub fn new(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            prepared: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            held: Mutex::new(Vec::new()),
        }
    }

    pub fn set_script(&self, script: Script) {
        *self.script.lock().unwrap() = script;
    }

    /// Complete the oldest held request with `result`
    pub fn release(&self, result: CaptureResult) {
        let (_, completion) = self.held.lock().unwrap().remove(0);
        completion(result);
    }

    /// Complete the oldest held request with a valid photo
    pub fn release_ok(&self) {
        let (settings, completion) = self.held.lock().unwrap().remove(0);
        completion(Ok(photo_for(&settings)));
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

pub fn photo_for(settings: &CaptureSettings) -> CapturedPhoto {
    CapturedPhoto {
        request_id: settings.id,
        data: jpeg_bytes(),
        codec: PhotoCodec::Jpeg,
        width: 4,
        height: 4,
    }
}

impl PhotoOutput for FakePhotoOutput {
    fn set_prepared_settings(&self, settings: Vec<CaptureSettings>) {
        *self.prepared.lock().unwrap() = settings;
    }

    fn prepared_settings(&self) -> Vec<CaptureSettings> {
        self.prepared.lock().unwrap().clone()
    }

    fn capture_photo(&self, settings: CaptureSettings, completion: CaptureCompletion) {
        self.requests.lock().unwrap().push(settings.clone());
        let script = self.script.lock().unwrap().clone();
        match script {
            Script::Complete(result) => completion(result),
            Script::Hold => self.held.lock().unwrap().push((settings, completion)),
        }
    }
}

// ===== Session =====

#[derive(Default)]
pub struct SessionLog {
    pub preset: Option<SessionPreset>,
    pub inputs: Vec<CameraDevice>,
    pub outputs: usize,
    pub preview_layers: Vec<PreviewLayer>,
    pub running: bool,
    pub starts: usize,
}

/// Session recording every call into a shared log
pub struct FakeSession {
    pub log: Arc<Mutex<SessionLog>>,
    input: Option<DeviceInput>,
    output: Option<Arc<dyn PhotoOutput>>,
    photo_output: Arc<FakePhotoOutput>,
    /// Device ids whose input cannot be opened
    failing: Vec<String>,
}

impl FakeSession {
    pub fn new(photo_output: Arc<FakePhotoOutput>) -> Self {
        Self {
            log: Arc::new(Mutex::new(SessionLog::default())),
            input: None,
            output: None,
            photo_output,
            failing: Vec::new(),
        }
    }

    pub fn failing_on(mut self, device_id: &str) -> Self {
        self.failing.push(device_id.to_string());
        self
    }
}

impl CaptureSession for FakeSession {
    fn set_preset(&mut self, preset: SessionPreset) {
        self.log.lock().unwrap().preset = Some(preset);
    }

    fn preset(&self) -> Option<SessionPreset> {
        self.log.lock().unwrap().preset
    }

    fn open_input(&self, device: &CameraDevice) -> BackendResult<DeviceInput> {
        if self.failing.contains(&device.id) {
            return Err(BackendError::InitializationFailed(format!(
                "{} is busy",
                device.id
            )));
        }
        Ok(DeviceInput::new(device.clone()))
    }

    fn add_input(&mut self, input: DeviceInput) -> BackendResult<()> {
        if self.input.is_some() {
            return Err(BackendError::AlreadyAttached("input"));
        }
        self.log.lock().unwrap().inputs.push(input.device().clone());
        self.input = Some(input);
        Ok(())
    }

    fn remove_input(&mut self) -> Option<DeviceInput> {
        self.input.take()
    }

    fn input(&self) -> Option<&DeviceInput> {
        self.input.as_ref()
    }

    fn new_photo_output(&self) -> Arc<dyn PhotoOutput> {
        self.photo_output.clone()
    }

    fn add_output(&mut self, output: Arc<dyn PhotoOutput>) -> BackendResult<()> {
        if self.output.is_some() {
            return Err(BackendError::AlreadyAttached("output"));
        }
        self.log.lock().unwrap().outputs += 1;
        self.output = Some(output);
        Ok(())
    }

    fn output(&self) -> Option<Arc<dyn PhotoOutput>> {
        self.output.clone()
    }

    fn attach_preview(&mut self, layer: &PreviewLayer) -> BackendResult<FrameReceiver> {
        self.log.lock().unwrap().preview_layers.push(layer.clone());
        let (_sender, receiver) = futures::channel::mpsc::channel(1);
        Ok(receiver)
    }

    fn start_running(&mut self) -> BackendResult<()> {
        if self.input.is_none() {
            return Err(BackendError::InvalidState("no input".into()));
        }
        let mut log = self.log.lock().unwrap();
        log.running = true;
        log.starts += 1;
        Ok(())
    }

    fn stop_running(&mut self) -> BackendResult<()> {
        self.log.lock().unwrap().running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.log.lock().unwrap().running
    }
}

// ===== Library =====

/// Library that keeps saved photos in memory
#[derive(Default)]
pub struct RecordingLibrary {
    pub saved: Mutex<Vec<CapturedPhoto>>,
    pub fail: bool,
}

impl RecordingLibrary {
    pub fn failing() -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }
}

impl PhotoLibrary for RecordingLibrary {
    fn save(&self, photo: &CapturedPhoto) -> Result<PathBuf, PhotoError> {
        if self.fail {
            return Err(PhotoError::SaveFailed("disk full".into()));
        }
        let mut saved = self.saved.lock().unwrap();
        saved.push(photo.clone());
        Ok(PathBuf::from(format!("/photos/IMG_{}.jpg", saved.len())))
    }
}
