// SPDX-License-Identifier: GPL-3.0-only

//! Capture controller
//!
//! Thin orchestration over the camera platform. Startup is strictly linear:
//!
//! ```text
//! configure_session → select_device → wire_input_output → attach_preview → start_running
//! ```
//!
//! After that the controller is event driven: one shutter press, one capture
//! request, one save. Completions arrive on backend threads and are only
//! queued there; [`CaptureController::dispatch_pending`] performs the save and
//! the state transitions on the foreground thread.
//!
//! Platform failures never abort the app. Wiring and start failures are logged,
//! stored as the last error and published as [`ControllerEvent`]s; only setup
//! order violations and rejected shutter presses are returned as errors.

mod capture;
mod device_selector;
mod events;
mod session;

pub use capture::{CaptureFlow, CaptureState, build_settings};
pub use device_selector::DeviceSelection;
pub use events::ControllerEvent;
pub use session::{SessionState, SetupStage};

use crate::backends::camera::{
    Bounds, CameraDevice, CaptureResult, CaptureSession, CaptureSettings, DeviceRegistry, DiscoveryCriteria,
    FrameReceiver, PhotoLibrary, PreviewLayer, VideoGravity, VideoOrientation,
};
use crate::config::Config;
use crate::errors::{AppError, CameraError, PhotoError};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Completion posted from a backend thread
struct CaptureMessage {
    request_id: Uuid,
    result: CaptureResult,
}

pub struct CaptureController {
    state: SessionState,
    registry: Box<dyn DeviceRegistry>,
    library: Arc<dyn PhotoLibrary>,
    config: Config,
    flow: CaptureFlow,
    completion_tx: UnboundedSender<CaptureMessage>,
    completion_rx: UnboundedReceiver<CaptureMessage>,
    event_tx: UnboundedSender<ControllerEvent>,
    event_rx: Option<UnboundedReceiver<ControllerEvent>>,
}

impl CaptureController {
    pub fn new(
        session: Box<dyn CaptureSession>,
        registry: Box<dyn DeviceRegistry>,
        library: Arc<dyn PhotoLibrary>,
        config: Config,
    ) -> Self {
        let (completion_tx, completion_rx) = unbounded_channel();
        let (event_tx, event_rx) = unbounded_channel();

        Self {
            state: SessionState::new(session),
            registry,
            library,
            config,
            flow: CaptureFlow::default(),
            completion_tx,
            completion_rx,
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Take the event stream; only the first call gets it
    pub fn take_events(&mut self) -> Option<UnboundedReceiver<ControllerEvent>> {
        self.event_rx.take()
    }

    /// Run the whole startup sequence
    ///
    /// Returns the preview frame stream. Device and platform failures leave
    /// the controller degraded rather than failing here.
    pub fn launch(&mut self, parent: Bounds) -> Result<FrameReceiver, CameraError> {
        self.configure_session()?;
        self.select_device()?;
        self.wire_input_output()?;
        let frames = self.attach_preview(parent)?;
        self.start_running()?;
        Ok(frames)
    }

    // ===== Startup =====

    /// Apply the configured preset before anything is attached
    pub fn configure_session(&mut self) -> Result<(), CameraError> {
        self.state.advance(SetupStage::Configured)?;
        self.state.session.set_preset(self.config.session_preset);
        Ok(())
    }

    /// Discover cameras and choose the current one
    ///
    /// Finding no camera is not an error here; wiring reports it.
    pub fn select_device(&mut self) -> Result<Option<&CameraDevice>, CameraError> {
        self.state.advance(SetupStage::DeviceSelected)?;

        let devices = self.registry.discover(&DiscoveryCriteria::default());
        info!(count = devices.len(), "Discovered cameras");

        let mut selection = DeviceSelection::classify(devices);
        selection.choose_default(
            self.config.preferred_position,
            self.config.fallback_to_any_camera,
        );
        self.state.selection = selection;

        self.emit(ControllerEvent::DeviceSelected(
            self.state.selection.current().cloned(),
        ));
        Ok(self.state.selection.current())
    }

    /// Attach the selected device as input plus a new photo output
    ///
    /// Failures are recorded and published, never returned.
    pub fn wire_input_output(&mut self) -> Result<(), CameraError> {
        self.state.advance(SetupStage::Wired)?;

        let Some(device) = self.state.selection.current().cloned() else {
            self.record_wiring_failure(CameraError::NoDeviceSelected);
            return Ok(());
        };

        if let Err(e) = self.attach_device(&device) {
            self.record_wiring_failure(e);
        }
        Ok(())
    }

    /// Bind a crop-to-fill portrait preview layer filling `parent`
    pub fn attach_preview(&mut self, parent: Bounds) -> Result<FrameReceiver, CameraError> {
        self.state.advance(SetupStage::PreviewAttached)?;

        let mut layer =
            PreviewLayer::new(VideoGravity::ResizeAspectFill, VideoOrientation::Portrait);
        layer.set_frame(parent);
        layer.z_index = 0;

        let frames = self.state.session.attach_preview(&layer).map_err(|e| {
            error!(error = %e, "Failed to bind preview layer");
            CameraError::from(e)
        })?;
        self.state.preview_layer = Some(layer);
        Ok(frames)
    }

    /// Start frame delivery
    ///
    /// Without an input the controller still enters `Running`; the preview
    /// stays empty and the shutter reports the missing output.
    pub fn start_running(&mut self) -> Result<(), CameraError> {
        self.state.advance(SetupStage::Running)?;
        self.start_session();
        Ok(())
    }

    // ===== Capture =====

    /// Request one photo with settings built from configuration
    pub fn trigger_capture(&mut self) -> Result<Uuid, PhotoError> {
        let output = self.state.output.clone().ok_or_else(|| {
            warn!("Shutter pressed without a photo output");
            PhotoError::NoPhotoOutput
        })?;
        if self.state.stage != SetupStage::Running {
            warn!(stage = %self.state.stage, "Shutter pressed before the session started");
            return Err(PhotoError::NotRunning);
        }

        let settings = build_settings(&self.config);
        let request_id = settings.id;
        self.flow.begin(request_id).inspect_err(|_| {
            debug!("Shutter ignored, capture already in progress");
        })?;

        info!(
            request = %request_id,
            flash = ?settings.flash_mode,
            stabilization = settings.stabilization,
            "Capture requested"
        );
        self.emit(ControllerEvent::CaptureStarted(request_id));

        let tx = self.completion_tx.clone();
        output.capture_photo(
            settings,
            Box::new(move |result| {
                // The receiver lives as long as the controller
                let _ = tx.send(CaptureMessage { request_id, result });
            }),
        );

        Ok(request_id)
    }

    /// Handle queued capture completions on the calling thread
    ///
    /// Returns how many completions were handled.
    pub fn dispatch_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.completion_rx.try_recv() {
            self.on_capture_complete(message.request_id, message.result);
            handled += 1;
        }
        handled
    }

    /// Finish a capture request: validate and save, or record the failure
    pub fn on_capture_complete(&mut self, request_id: Uuid, result: CaptureResult) {
        if self.flow.pending() != Some(request_id) {
            warn!(request = %request_id, "Ignoring completion for unknown request");
            return;
        }

        let outcome = result
            .map_err(PhotoError::from)
            .and_then(|photo| {
                image::load_from_memory(&photo.data)
                    .map_err(|e| PhotoError::DecodeFailed(e.to_string()))?;
                self.library.save(&photo)
            });

        match &outcome {
            Ok(path) => {
                info!(request = %request_id, path = %path.display(), "Photo saved");
                self.emit(ControllerEvent::PhotoSaved {
                    request_id,
                    path: path.clone(),
                });
            }
            Err(e) => {
                warn!(request = %request_id, error = %e, "Capture failed, nothing saved");
                self.state.last_error = Some(AppError::Photo(e.clone()));
                self.emit(ControllerEvent::CaptureFailed {
                    request_id,
                    error: e.clone(),
                });
            }
        }

        self.flow.finish(request_id, outcome);
    }

    // ===== Camera switching =====

    /// Switch to the next camera and re-wire the session
    ///
    /// Returns the new device, or `None` when there is nothing to switch to.
    /// If the new device cannot be opened the previous one is restored.
    pub fn toggle_camera(&mut self) -> Result<Option<CameraDevice>, CameraError> {
        self.state.require(SetupStage::Wired)?;
        if self.flow.state().is_capturing() {
            return Err(CameraError::Busy);
        }

        let previous = self.state.selection.current().cloned();
        let Some(next) = self.state.selection.toggle().cloned() else {
            debug!("No other camera to switch to");
            return Ok(None);
        };

        let was_running = self.state.session.is_running();
        if was_running {
            if let Err(e) = self.state.session.stop_running() {
                warn!(error = %e, "Session did not stop cleanly before switching");
            }
        }

        let old_input = self.state.session.remove_input();
        let switched = match self.attach_device(&next) {
            Ok(()) => {
                self.emit(ControllerEvent::CameraSwitched(next.clone()));
                Some(next)
            }
            Err(e) => {
                self.record_wiring_failure(e);
                self.state.selection.set_current(previous);
                if let Some(input) = old_input {
                    if let Err(e) = self.state.session.add_input(input) {
                        warn!(error = %e, "Failed to restore previous input");
                    }
                }
                None
            }
        };

        // A switch out of a degraded start still brings the session up
        if self.state.stage == SetupStage::Running {
            self.start_session();
        }
        Ok(switched)
    }

    // ===== Queries =====

    pub fn stage(&self) -> SetupStage {
        self.state.stage
    }

    pub fn capture_state(&self) -> &CaptureState {
        self.flow.state()
    }

    /// Outcome of the most recent finished capture
    pub fn last_capture(&self) -> Option<&CaptureState> {
        self.flow.last_outcome()
    }

    pub fn last_error(&self) -> Option<&AppError> {
        self.state.last_error.as_ref()
    }

    pub fn selection(&self) -> &DeviceSelection {
        &self.state.selection
    }

    pub fn current_device(&self) -> Option<&CameraDevice> {
        self.state.selection.current()
    }

    pub fn session(&self) -> &dyn CaptureSession {
        self.state.session.as_ref()
    }

    pub fn preview_layer(&self) -> Option<&PreviewLayer> {
        self.state.preview_layer.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resize the preview layer to new parent bounds
    pub fn resize_preview(&mut self, parent: Bounds) {
        if let Some(layer) = self.state.preview_layer.as_mut() {
            layer.set_frame(parent);
        }
    }

    /// Stop the session and release the camera
    pub fn shutdown(&mut self) {
        if self.state.session.is_running() {
            if let Err(e) = self.state.session.stop_running() {
                warn!(error = %e, "Session did not stop cleanly");
            }
        }
        info!("Capture controller shut down");
    }

    // ===== Internals =====

    /// Open `device`, attach it, and attach a photo output if none exists
    fn attach_device(&mut self, device: &CameraDevice) -> Result<(), CameraError> {
        let input = self.state.session.open_input(device)?;
        self.state.session.add_input(input)?;

        if self.state.output.is_none() {
            let output = self.state.session.new_photo_output();
            output.set_prepared_settings(vec![CaptureSettings::with_codec(self.config.codec)]);
            self.state.session.add_output(Arc::clone(&output))?;
            self.state.output = Some(output);
        }

        info!(device = %device, "Input and output wired");
        Ok(())
    }

    fn start_session(&mut self) {
        if self.state.session.input().is_none() {
            warn!("Session has no input, preview stays empty");
            return;
        }
        match self.state.session.start_running() {
            Ok(()) => self.emit(ControllerEvent::SessionStarted),
            Err(e) => {
                let err = CameraError::from(e);
                error!(error = %err, "Failed to start capture session");
                self.state.last_error = Some(AppError::Camera(err.clone()));
                self.emit(ControllerEvent::SessionFailed(err));
            }
        }
    }

    fn record_wiring_failure(&mut self, err: CameraError) {
        error!(error = %err, "Failed to wire camera input");
        self.state.last_error = Some(AppError::Camera(err.clone()));
        self.emit(ControllerEvent::WiringFailed(err));
    }

    fn emit(&self, event: ControllerEvent) {
        debug!(event = ?event, "Controller event");
        // Nobody listening is fine
        let _ = self.event_tx.send(event);
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        if self.state.session.is_running() {
            let _ = self.state.session.stop_running();
        }
    }
}
