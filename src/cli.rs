// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking a photo without the terminal UI

use shutter::backends::camera::gst::{GstDeviceRegistry, GstSession};
use shutter::backends::camera::{Bounds, DevicePosition, DeviceRegistry, DiscoveryCriteria};
use shutter::config::Config;
use shutter::constants::timing;
use shutter::controller::{CaptureController, CaptureState};
use shutter::storage::DirectoryPhotoLibrary;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    gstreamer::init()?;

    // Everything the monitor sees, not only what the controller would pick from
    let criteria = DiscoveryCriteria {
        device_types: Vec::new(),
        ..DiscoveryCriteria::default()
    };
    let cameras = GstDeviceRegistry::new().discover(&criteria);

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!(
            "      Position: {} | Type: {}",
            camera.position, camera.device_type
        );
        println!("      Source: {} {}", camera.source_element, camera.path);
        println!();
    }

    Ok(())
}

/// Take a photo through the same controller flow as the terminal app
pub fn take_photo(front: bool, output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    gstreamer::init()?;

    let mut config = Config::load();
    if front {
        config.preferred_position = Some(DevicePosition::Front);
    }
    let output_dir = output.unwrap_or_else(|| config.photo_dir());
    let library = Arc::new(DirectoryPhotoLibrary::new(&output_dir));

    let session = GstSession::new(config.jpeg_quality.value());
    let mut controller = CaptureController::new(
        Box::new(session),
        Box::new(GstDeviceRegistry::new()),
        library,
        config,
    );

    let mut frames = controller.launch(Bounds::new(0, 0, 640, 480))?;
    if let Some(device) = controller.current_device() {
        println!("Using camera: {}", device);
    }
    if let Some(err) = controller.last_error() {
        return Err(err.to_string().into());
    }

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = Arc::clone(&stop_flag);
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    // Let exposure settle before capturing
    let warmup_start = Instant::now();
    while warmup_start.elapsed() < timing::WARMUP {
        while frames.try_recv().is_ok() {}
        std::thread::sleep(Duration::from_millis(10));
    }

    println!("Capturing...");
    controller.trigger_capture()?;

    let start = Instant::now();
    let result = loop {
        controller.dispatch_pending();

        if !controller.capture_state().is_capturing() {
            break controller.last_capture().cloned();
        }
        if stop_flag.load(Ordering::SeqCst) {
            println!("Cancelled.");
            break None;
        }
        if start.elapsed() > timing::CAPTURE_WAIT {
            break None;
        }

        while frames.try_recv().is_ok() {}
        std::thread::sleep(Duration::from_millis(10));
    };

    controller.shutdown();

    match result {
        Some(CaptureState::Saved { path, .. }) => {
            println!("Photo saved: {}", path.display());
            Ok(())
        }
        Some(CaptureState::Failed { error, .. }) => Err(error.to_string().into()),
        _ if stop_flag.load(Ordering::SeqCst) => Ok(()),
        _ => Err("Timed out waiting for the photo".into()),
    }
}
