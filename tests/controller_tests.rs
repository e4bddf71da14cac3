// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the capture controller against an in-memory platform

mod common;

use common::*;
use shutter::backends::camera::{
    Bounds, CaptureError, CaptureSession, DevicePosition, FlashMode, PhotoCodec, PhotoOutput,
    SessionPreset, VideoGravity, VideoOrientation,
};
use shutter::config::Config;
use shutter::controller::{CaptureController, CaptureState, ControllerEvent, SetupStage};
use shutter::errors::{AppError, CameraError, PhotoError};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedReceiver;

struct Harness {
    controller: CaptureController,
    output: Arc<FakePhotoOutput>,
    library: Arc<RecordingLibrary>,
    log: Arc<Mutex<SessionLog>>,
    events: UnboundedReceiver<ControllerEvent>,
}

fn harness_with(
    devices: Vec<shutter::backends::camera::CameraDevice>,
    script: Script,
    configure: impl FnOnce(FakeSession) -> FakeSession,
    library: RecordingLibrary,
    config: Config,
) -> Harness {
    let output = Arc::new(FakePhotoOutput::new(script));
    let session = configure(FakeSession::new(Arc::clone(&output)));
    let log = Arc::clone(&session.log);
    let library = Arc::new(library);

    let mut controller = CaptureController::new(
        Box::new(session),
        Box::new(FakeRegistry::new(devices)),
        library.clone(),
        config,
    );
    let events = controller.take_events().unwrap();

    Harness {
        controller,
        output,
        library,
        log,
        events,
    }
}

fn harness(devices: Vec<shutter::backends::camera::CameraDevice>, script: Script) -> Harness {
    harness_with(
        devices,
        script,
        |s| s,
        RecordingLibrary::default(),
        Config::default(),
    )
}

fn back_and_front() -> Vec<shutter::backends::camera::CameraDevice> {
    vec![
        device("back", DevicePosition::Back),
        device("front", DevicePosition::Front),
    ]
}

fn drain(events: &mut UnboundedReceiver<ControllerEvent>) -> Vec<ControllerEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn screen() -> Bounds {
    Bounds::new(0, 0, 390, 844)
}

// ===== Device selection =====

#[test]
fn test_back_camera_is_selected_by_default() {
    let mut h = harness(back_and_front(), Script::Hold);
    h.controller.configure_session().unwrap();

    let current = h.controller.select_device().unwrap().cloned();
    assert_eq!(current.unwrap().id, "back");
    assert_eq!(h.controller.selection().front().unwrap().id, "front");
}

#[test]
fn test_no_devices_reports_no_device_selected_at_wiring() {
    let mut h = harness(Vec::new(), Script::Hold);
    h.controller.configure_session().unwrap();
    assert!(h.controller.select_device().unwrap().is_none());

    // Degraded, not an error
    h.controller.wire_input_output().unwrap();

    assert_eq!(
        h.controller.last_error(),
        Some(&AppError::Camera(CameraError::NoDeviceSelected))
    );
    assert!(h.controller.session().input().is_none());
    assert!(
        drain(&mut h.events).contains(&ControllerEvent::WiringFailed(
            CameraError::NoDeviceSelected
        ))
    );
}

#[test]
fn test_fallback_disabled_means_back_or_nothing() {
    let config = Config {
        fallback_to_any_camera: false,
        ..Config::default()
    };
    let mut h = harness_with(
        vec![device("front", DevicePosition::Front)],
        Script::Hold,
        |s| s,
        RecordingLibrary::default(),
        config,
    );
    h.controller.configure_session().unwrap();
    assert!(h.controller.select_device().unwrap().is_none());
}

#[test]
fn test_switching_does_not_change_the_default_camera() {
    let mut h = harness(back_and_front(), Script::Hold);
    h.controller.launch(screen()).unwrap();
    h.controller.toggle_camera().unwrap();
    assert_eq!(h.controller.current_device().unwrap().id, "front");
    assert!(h.controller.config().preferred_position.is_none());

    // Next start with the same configuration is back on the main camera
    let mut next = harness_with(
        back_and_front(),
        Script::Hold,
        |s| s,
        RecordingLibrary::default(),
        h.controller.config().clone(),
    );
    next.controller.launch(screen()).unwrap();
    assert_eq!(next.controller.current_device().unwrap().id, "back");
}

#[test]
fn test_preferred_position_starts_on_front() {
    let config = Config {
        preferred_position: Some(DevicePosition::Front),
        ..Config::default()
    };
    let mut h = harness_with(
        back_and_front(),
        Script::Hold,
        |s| s,
        RecordingLibrary::default(),
        config,
    );
    h.controller.launch(screen()).unwrap();
    assert_eq!(h.controller.current_device().unwrap().id, "front");
}

// ===== Wiring =====

#[test]
fn test_wiring_attaches_one_input_one_output_and_jpeg_profile() {
    let mut h = harness(back_and_front(), Script::Hold);
    h.controller.configure_session().unwrap();
    h.controller.select_device().unwrap();
    h.controller.wire_input_output().unwrap();

    let log = h.log.lock().unwrap();
    assert_eq!(log.preset, Some(SessionPreset::Photo));
    assert_eq!(log.inputs.len(), 1);
    assert_eq!(log.inputs[0].id, "back");
    assert_eq!(log.outputs, 1);
    drop(log);

    let prepared = h.output.prepared_settings();
    assert_eq!(prepared.len(), 1);
    assert_eq!(prepared[0].codec, PhotoCodec::Jpeg);
    assert!(h.controller.last_error().is_none());
}

#[test]
fn test_failing_input_is_logged_not_returned() {
    let mut h = harness_with(
        back_and_front(),
        Script::Hold,
        |s| s.failing_on("back"),
        RecordingLibrary::default(),
        Config::default(),
    );
    h.controller.configure_session().unwrap();
    h.controller.select_device().unwrap();

    assert!(h.controller.wire_input_output().is_ok());

    let log = h.log.lock().unwrap();
    assert!(log.inputs.is_empty());
    assert_eq!(log.outputs, 0);
    drop(log);

    assert!(matches!(
        h.controller.last_error(),
        Some(AppError::Camera(CameraError::InitializationFailed(_)))
    ));
    assert!(
        drain(&mut h.events)
            .iter()
            .any(|e| matches!(e, ControllerEvent::WiringFailed(_)))
    );

    // Degraded: the rest of setup still completes, the shutter has nothing to drive
    h.controller.attach_preview(screen()).unwrap();
    h.controller.start_running().unwrap();
    assert_eq!(h.controller.stage(), SetupStage::Running);
    assert_eq!(
        h.controller.trigger_capture(),
        Err(PhotoError::NoPhotoOutput)
    );
}

// ===== Preview =====

#[test]
fn test_preview_is_crop_to_fill_portrait_bottom_layer() {
    let mut h = harness(back_and_front(), Script::Hold);
    h.controller.launch(screen()).unwrap();

    let layer = h.controller.preview_layer().unwrap();
    assert_eq!(layer.gravity, VideoGravity::ResizeAspectFill);
    assert_eq!(layer.orientation, VideoOrientation::Portrait);
    assert_eq!(layer.frame, screen());
    assert_eq!(layer.z_index, 0);
    assert_eq!(h.log.lock().unwrap().preview_layers.len(), 1);

    h.controller.resize_preview(Bounds::new(0, 0, 844, 390));
    assert_eq!(
        h.controller.preview_layer().unwrap().frame,
        Bounds::new(0, 0, 844, 390)
    );
}

#[test]
fn test_preview_before_wiring_is_setup_order_error() {
    let mut h = harness(back_and_front(), Script::Hold);
    h.controller.configure_session().unwrap();
    h.controller.select_device().unwrap();

    assert!(matches!(
        h.controller.attach_preview(screen()),
        Err(CameraError::SetupOrder(_))
    ));
}

#[test]
fn test_preview_after_start_is_setup_order_error() {
    let mut h = harness(back_and_front(), Script::Hold);
    h.controller.launch(screen()).unwrap();

    assert!(matches!(
        h.controller.attach_preview(screen()),
        Err(CameraError::SetupOrder(_))
    ));
    assert!(matches!(
        h.controller.configure_session(),
        Err(CameraError::SetupOrder(_))
    ));
}

#[test]
fn test_launch_starts_session_once() {
    let mut h = harness(back_and_front(), Script::Hold);
    h.controller.launch(screen()).unwrap();

    let log = h.log.lock().unwrap();
    assert!(log.running);
    assert_eq!(log.starts, 1);
    drop(log);
    assert!(drain(&mut h.events).contains(&ControllerEvent::SessionStarted));
}

// ===== Capture =====

#[test]
fn test_capture_saves_delivered_bytes_once() {
    let mut h = harness(back_and_front(), Script::Hold);
    h.controller.launch(screen()).unwrap();

    let request_id = h.controller.trigger_capture().unwrap();
    assert!(h.controller.capture_state().is_capturing());

    let requests = h.output.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].flash_mode, FlashMode::Auto);
    assert!(requests[0].stabilization);

    h.output.release_ok();
    // Completion only queues; nothing is saved until dispatch
    assert_eq!(h.library.count(), 0);
    assert_eq!(h.controller.dispatch_pending(), 1);

    let saved = h.library.saved.lock().unwrap().clone();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].request_id, request_id);
    assert_eq!(saved[0].data, jpeg_bytes());

    assert_eq!(h.controller.capture_state(), &CaptureState::Idle);
    assert!(matches!(
        h.controller.last_capture(),
        Some(CaptureState::Saved { .. })
    ));
    assert!(drain(&mut h.events).iter().any(|e| matches!(
        e,
        ControllerEvent::PhotoSaved { request_id: id, .. } if *id == request_id
    )));
}

#[test]
fn test_capture_error_saves_nothing() {
    let mut h = harness(
        back_and_front(),
        Script::Complete(Err(CaptureError::Timeout)),
    );
    h.controller.launch(screen()).unwrap();

    let request_id = h.controller.trigger_capture().unwrap();
    h.controller.dispatch_pending();

    assert_eq!(h.library.count(), 0);
    assert_eq!(h.controller.capture_state(), &CaptureState::Idle);
    assert!(matches!(
        h.controller.last_error(),
        Some(AppError::Photo(PhotoError::CaptureFailed(_)))
    ));
    assert!(drain(&mut h.events).iter().any(|e| matches!(
        e,
        ControllerEvent::CaptureFailed { request_id: id, .. } if *id == request_id
    )));
}

#[test]
fn test_undecodable_bytes_are_not_saved() {
    let mut h = harness(back_and_front(), Script::Hold);
    h.controller.launch(screen()).unwrap();
    h.controller.trigger_capture().unwrap();

    let request = h.output.requests.lock().unwrap()[0].clone();
    let mut photo = photo_for(&request);
    photo.data = b"not an image".to_vec();
    h.output.release(Ok(photo));
    h.controller.dispatch_pending();

    assert_eq!(h.library.count(), 0);
    assert!(matches!(
        h.controller.last_capture(),
        Some(CaptureState::Failed {
            error: PhotoError::DecodeFailed(_),
            ..
        })
    ));
}

#[test]
fn test_library_failure_is_a_failed_capture() {
    let mut h = harness_with(
        back_and_front(),
        Script::Hold,
        |s| s,
        RecordingLibrary::failing(),
        Config::default(),
    );
    h.controller.launch(screen()).unwrap();
    h.controller.trigger_capture().unwrap();
    h.output.release_ok();
    h.controller.dispatch_pending();

    assert!(matches!(
        h.controller.last_capture(),
        Some(CaptureState::Failed {
            error: PhotoError::SaveFailed(_),
            ..
        })
    ));
}

#[test]
fn test_second_shutter_while_capturing_is_busy() {
    let mut h = harness(back_and_front(), Script::Hold);
    h.controller.launch(screen()).unwrap();

    h.controller.trigger_capture().unwrap();
    assert_eq!(h.controller.trigger_capture(), Err(PhotoError::Busy));
    assert_eq!(h.output.request_count(), 1);

    h.output.release_ok();
    h.controller.dispatch_pending();
    assert_eq!(h.controller.capture_state(), &CaptureState::Idle);

    // Ready again
    assert!(h.controller.trigger_capture().is_ok());
    assert_eq!(h.output.request_count(), 2);
}

#[test]
fn test_shutter_before_start_is_rejected() {
    let mut h = harness(back_and_front(), Script::Hold);
    h.controller.configure_session().unwrap();
    h.controller.select_device().unwrap();
    h.controller.wire_input_output().unwrap();

    assert_eq!(h.controller.trigger_capture(), Err(PhotoError::NotRunning));
    assert_eq!(h.output.request_count(), 0);
    assert_eq!(h.controller.capture_state(), &CaptureState::Idle);
}

#[test]
fn test_stale_completion_is_ignored() {
    let mut h = harness(back_and_front(), Script::Hold);
    h.controller.launch(screen()).unwrap();
    h.controller.trigger_capture().unwrap();

    h.controller
        .on_capture_complete(uuid::Uuid::new_v4(), Err(CaptureError::Timeout));

    assert!(h.controller.capture_state().is_capturing());
    assert!(h.controller.last_error().is_none());
}

#[test]
fn test_settings_follow_configuration() {
    let config = Config {
        flash_mode: FlashMode::Off,
        stabilization: false,
        codec: PhotoCodec::Png,
        ..Config::default()
    };
    let mut h = harness_with(
        back_and_front(),
        Script::Hold,
        |s| s,
        RecordingLibrary::default(),
        config,
    );
    h.controller.launch(screen()).unwrap();
    h.controller.trigger_capture().unwrap();

    let request = h.output.requests.lock().unwrap()[0].clone();
    assert_eq!(request.flash_mode, FlashMode::Off);
    assert!(!request.stabilization);
    assert_eq!(request.codec, PhotoCodec::Png);
}

// ===== Camera toggle =====

#[test]
fn test_toggle_switches_back_and_front_with_one_input() {
    let mut h = harness(back_and_front(), Script::Hold);
    h.controller.launch(screen()).unwrap();

    let switched = h.controller.toggle_camera().unwrap().unwrap();
    assert_eq!(switched.id, "front");
    assert_eq!(
        h.controller.session().input().unwrap().device().id,
        "front"
    );
    assert!(h.controller.session().is_running());

    let switched = h.controller.toggle_camera().unwrap().unwrap();
    assert_eq!(switched.id, "back");

    let log = h.log.lock().unwrap();
    // One output for the lifetime of the session
    assert_eq!(log.outputs, 1);
    assert_eq!(log.inputs.len(), 3);
    assert_eq!(log.starts, 3);
}

#[test]
fn test_toggle_failure_restores_previous_camera() {
    let mut h = harness_with(
        back_and_front(),
        Script::Hold,
        |s| s.failing_on("front"),
        RecordingLibrary::default(),
        Config::default(),
    );
    h.controller.launch(screen()).unwrap();

    assert_eq!(h.controller.toggle_camera().unwrap(), None);
    assert_eq!(h.controller.current_device().unwrap().id, "back");
    assert_eq!(h.controller.session().input().unwrap().device().id, "back");
    assert!(h.controller.session().is_running());
    assert!(
        drain(&mut h.events)
            .iter()
            .any(|e| matches!(e, ControllerEvent::WiringFailed(_)))
    );
}

#[test]
fn test_switch_out_of_failed_start_starts_session() {
    let mut h = harness_with(
        back_and_front(),
        Script::Hold,
        |s| s.failing_on("back"),
        RecordingLibrary::default(),
        Config::default(),
    );
    h.controller.launch(screen()).unwrap();
    assert!(!h.controller.session().is_running());

    let switched = h.controller.toggle_camera().unwrap().unwrap();
    assert_eq!(switched.id, "front");
    assert!(h.controller.session().is_running());
    assert_eq!(h.log.lock().unwrap().starts, 1);

    // Shutter works on the recovered session
    assert!(h.controller.trigger_capture().is_ok());
    h.output.release_ok();
    h.controller.dispatch_pending();
    assert_eq!(h.library.count(), 1);
}

#[test]
fn test_toggle_during_capture_is_busy() {
    let mut h = harness(back_and_front(), Script::Hold);
    h.controller.launch(screen()).unwrap();
    h.controller.trigger_capture().unwrap();

    assert_eq!(h.controller.toggle_camera(), Err(CameraError::Busy));
}

#[test]
fn test_toggle_with_single_camera_does_nothing() {
    let mut h = harness(vec![device("back", DevicePosition::Back)], Script::Hold);
    h.controller.launch(screen()).unwrap();

    assert_eq!(h.controller.toggle_camera(), Ok(None));
    assert_eq!(h.log.lock().unwrap().starts, 1);
}
