// SPDX-License-Identifier: GPL-3.0-only

//! Photo output backed by the live pipeline
//!
//! A capture request is served on its own worker thread:
//!
//! 1. Decide on flash from the requested mode and the latest frame's luminance
//! 2. Collect fresh frames (one, or a short window when stabilizing)
//! 3. Keep the chosen frame and encode it
//! 4. Invoke the completion exactly once

use super::super::types::*;
use super::super::PhotoOutput;
use super::pipeline::FrameSlot;
use crate::constants::capture::{FLASH_PRE_FIRE, FRAME_TIMEOUT, STABILIZATION_FRAMES};
use crate::flash::{self, FlashDevice};
use crate::pipelines::photo::{PhotoPipeline, estimate_luminance};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Photo output reading frames from a [`FrameSlot`]
pub struct GstPhotoOutput {
    frames: Arc<FrameSlot>,
    prepared: Mutex<Vec<CaptureSettings>>,
    busy: Arc<AtomicBool>,
    flash_devices: Arc<Vec<FlashDevice>>,
    jpeg_quality: u8,
}

impl GstPhotoOutput {
    pub fn new(frames: Arc<FrameSlot>, flash_devices: Vec<FlashDevice>, jpeg_quality: u8) -> Self {
        Self {
            frames,
            prepared: Mutex::new(Vec::new()),
            busy: Arc::new(AtomicBool::new(false)),
            flash_devices: Arc::new(flash_devices),
            jpeg_quality,
        }
    }

    /// Whether a request is being served
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl PhotoOutput for GstPhotoOutput {
    fn set_prepared_settings(&self, settings: Vec<CaptureSettings>) {
        debug!(count = settings.len(), "Prepared capture settings");
        if let Ok(mut prepared) = self.prepared.lock() {
            *prepared = settings;
        }
    }

    fn prepared_settings(&self) -> Vec<CaptureSettings> {
        self.prepared
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn capture_photo(&self, settings: CaptureSettings, completion: CaptureCompletion) {
        if self.busy.swap(true, Ordering::AcqRel) {
            warn!(request = %settings.id, "Photo output busy, rejecting request");
            completion(Err(CaptureError::Busy));
            return;
        }

        let frames = Arc::clone(&self.frames);
        let busy = Arc::clone(&self.busy);
        let flash_devices = Arc::clone(&self.flash_devices);
        let pipeline = PhotoPipeline::new(self.jpeg_quality);

        // Shared so a failed spawn can still complete the request
        let completion = Arc::new(Mutex::new(Some(completion)));
        let worker_completion = Arc::clone(&completion);

        let spawned = std::thread::Builder::new()
            .name("photo-capture".to_string())
            .spawn(move || {
                let result = run_capture(&frames, &flash_devices, &pipeline, &settings);
                busy.store(false, Ordering::Release);
                if let Some(completion) = take_completion(&worker_completion) {
                    completion(result);
                }
            });

        if let Err(e) = spawned {
            self.busy.store(false, Ordering::Release);
            warn!(error = %e, "Failed to spawn capture thread");
            if let Some(completion) = take_completion(&completion) {
                completion(Err(CaptureError::Backend(e.to_string())));
            }
        }
    }
}

fn take_completion(slot: &Mutex<Option<CaptureCompletion>>) -> Option<CaptureCompletion> {
    slot.lock().ok()?.take()
}

fn run_capture(
    frames: &FrameSlot,
    flash_devices: &[FlashDevice],
    pipeline: &PhotoPipeline,
    settings: &CaptureSettings,
) -> CaptureResult {
    let start = Instant::now();
    info!(
        request = %settings.id,
        flash = ?settings.flash_mode,
        stabilization = settings.stabilization,
        "Capturing photo"
    );

    let luminance = frames.latest().map(|f| estimate_luminance(&f));
    let fire = flash::should_fire(settings.flash_mode, luminance);
    if fire && flash_devices.is_empty() {
        debug!("Flash requested but no flash LEDs available");
    }
    let fire = fire && !flash_devices.is_empty();

    if fire {
        flash::all_on(flash_devices);
        std::thread::sleep(FLASH_PRE_FIRE);
    }

    let wanted = if settings.stabilization {
        STABILIZATION_FRAMES
    } else {
        1
    };
    let collected = collect_fresh_frames(frames, wanted);

    if fire {
        flash::all_off(flash_devices);
    }

    let collected = collected?;
    let photo = pipeline.process(collected, settings)?;

    info!(
        request = %settings.id,
        elapsed_ms = start.elapsed().as_millis(),
        "Capture complete"
    );
    Ok(photo)
}

/// Wait for `count` frames newer than the moment of the call
fn collect_fresh_frames(frames: &FrameSlot, count: usize) -> Result<Vec<CameraFrame>, CaptureError> {
    let deadline = Instant::now() + FRAME_TIMEOUT;
    let mut seen = frames.sequence();
    let mut collected = Vec::with_capacity(count);

    while collected.len() < count {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match frames.wait_newer(seen, remaining) {
            Some((sequence, frame)) => {
                seen = sequence;
                collected.push(frame);
            }
            None => break,
        }
    }

    if collected.is_empty() {
        warn!(timeout = ?FRAME_TIMEOUT, "No fresh frame arrived for capture");
        return Err(CaptureError::Timeout);
    }
    if collected.len() < count {
        debug!(wanted = count, got = collected.len(), "Capturing with fewer frames than requested");
    }
    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn feed(slot: Arc<FrameSlot>, count: usize) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            for i in 0..count {
                thread::sleep(Duration::from_millis(15));
                slot.publish(CameraFrame::from_rgba(2, 2, vec![(i * 20) as u8; 16]));
            }
        })
    }

    #[test]
    fn test_capture_delivers_encoded_photo() {
        let slot = FrameSlot::new();
        let output = GstPhotoOutput::new(Arc::clone(&slot), Vec::new(), 90);
        let feeder = feed(Arc::clone(&slot), 10);

        let (tx, rx) = mpsc::channel();
        let settings = CaptureSettings::with_codec(PhotoCodec::Png).stabilization(true);
        let id = settings.id;
        output.capture_photo(settings, Box::new(move |result| tx.send(result).unwrap()));

        let photo = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        feeder.join().unwrap();
        assert_eq!(photo.request_id, id);
        assert!(image::load_from_memory(&photo.data).is_ok());
        assert!(!output.is_busy());
    }

    #[test]
    fn test_second_request_while_busy_is_rejected() {
        let slot = FrameSlot::new();
        let output = GstPhotoOutput::new(Arc::clone(&slot), Vec::new(), 90);

        let (tx, rx) = mpsc::channel();
        let tx2 = tx.clone();
        output.capture_photo(
            CaptureSettings::with_codec(PhotoCodec::Jpeg),
            Box::new(move |r| tx.send(r).unwrap()),
        );
        output.capture_photo(
            CaptureSettings::with_codec(PhotoCodec::Jpeg),
            Box::new(move |r| tx2.send(r).unwrap()),
        );

        // The rejection is delivered synchronously, before any frame arrives
        assert_eq!(rx.recv().unwrap(), Err(CaptureError::Busy));

        let feeder = feed(Arc::clone(&slot), 3);
        assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap().is_ok());
        feeder.join().unwrap();
    }

    #[test]
    fn test_prepared_settings_round_trip() {
        let output = GstPhotoOutput::new(FrameSlot::new(), Vec::new(), 90);
        let settings = CaptureSettings::with_codec(PhotoCodec::Jpeg);
        output.set_prepared_settings(vec![settings.clone()]);
        assert_eq!(output.prepared_settings(), vec![settings]);
    }
}
