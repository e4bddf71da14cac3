// SPDX-License-Identifier: GPL-3.0-only

//! Frame analysis for photo capture
//!
//! - Scene luminance, used to decide whether auto flash fires
//! - Sharpness, used to keep the steadiest frame when stabilizing
//! - RGBA to RGB conversion (drop alpha channel, honour stride)

use crate::backends::camera::types::{CameraFrame, PixelFormat};
use crate::constants::capture::LUMINANCE_SAMPLES;
use image::RgbImage;
use tracing::{debug, warn};

/// Estimate average scene luminance (0.0-1.0) from a frame
///
/// Samples at most [`LUMINANCE_SAMPLES`] pixels using BT.601 weights.
pub fn estimate_luminance(frame: &CameraFrame) -> f32 {
    let pixels = frame.width as usize * frame.height as usize;
    if pixels == 0 {
        warn!("Empty frame for luminance estimation");
        return 0.0;
    }

    let sample_stride = (pixels / LUMINANCE_SAMPLES).max(1);
    let mut total_luminance: f64 = 0.0;
    let mut samples = 0usize;

    for i in (0..pixels).step_by(sample_stride) {
        let x = (i % frame.width as usize) as u32;
        let y = (i / frame.width as usize) as u32;
        let (r, g, b) = frame.pixel_rgb(x, y);

        // BT.601 luminance
        total_luminance +=
            0.299 * (r as f64 / 255.0) + 0.587 * (g as f64 / 255.0) + 0.114 * (b as f64 / 255.0);
        samples += 1;
    }

    let avg_luminance = (total_luminance / samples as f64) as f32;
    debug!(avg_luminance, samples, "Scene luminance estimated");
    avg_luminance
}

/// Gradient energy of the green channel, higher is sharper
///
/// Motion blur smears edges, so of several frames of the same scene the one
/// with the most gradient energy has the least shake.
pub fn sharpness(frame: &CameraFrame) -> f64 {
    if frame.width < 2 || frame.height < 2 {
        return 0.0;
    }

    // Coarse grid keeps this cheap on full-resolution frames
    let step = ((frame.width.min(frame.height)) / 256).max(1);
    let mut energy = 0.0;
    let mut y = 0;
    while y + step < frame.height {
        let mut x = 0;
        while x + step < frame.width {
            let g = frame.pixel_rgb(x, y).1 as f64;
            let dx = frame.pixel_rgb(x + step, y).1 as f64 - g;
            let dy = frame.pixel_rgb(x, y + step).1 as f64 - g;
            energy += dx * dx + dy * dy;
            x += step;
        }
        y += step;
    }
    energy
}

/// Keep the sharpest frame; ties go to the earliest
pub fn select_sharpest(frames: Vec<CameraFrame>) -> Option<CameraFrame> {
    let mut best: Option<(f64, CameraFrame)> = None;
    for frame in frames {
        let score = sharpness(&frame);
        match &best {
            Some((best_score, _)) if *best_score >= score => {}
            _ => best = Some((score, frame)),
        }
    }
    best.map(|(score, frame)| {
        debug!(score, "Selected sharpest frame");
        frame
    })
}

/// Copy a frame into a packed RGB image
///
/// Returns `None` when the buffer is shorter than the frame geometry claims.
pub fn to_rgb_image(frame: &CameraFrame) -> Option<RgbImage> {
    let bpp = frame.format.bytes_per_pixel() as usize;
    let width = frame.width as usize;
    let height = frame.height as usize;
    let stride = frame.stride as usize;

    if width == 0 || height == 0 || stride < width * bpp {
        return None;
    }
    let needed = stride * (height - 1) + width * bpp;
    if frame.data.len() < needed {
        return None;
    }

    let mut rgb = Vec::with_capacity(width * height * 3);
    for row in frame.data.chunks(stride).take(height) {
        match frame.format {
            PixelFormat::RGBA => {
                for px in row[..width * bpp].chunks_exact(4) {
                    rgb.extend_from_slice(&px[..3]);
                }
            }
            PixelFormat::RGB24 => rgb.extend_from_slice(&row[..width * bpp]),
        }
    }

    RgbImage::from_raw(frame.width, frame.height, rgb)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(value: u8) -> CameraFrame {
        CameraFrame::from_rgba(8, 8, vec![value; 8 * 8 * 4])
    }

    fn checkerboard() -> CameraFrame {
        let mut data = Vec::new();
        for y in 0..8u32 {
            for x in 0..8u32 {
                let v = if (x + y) % 2 == 0 { 255 } else { 0 };
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        CameraFrame::from_rgba(8, 8, data)
    }

    #[test]
    fn test_luminance_bounds() {
        assert!(estimate_luminance(&flat(0)) < 0.01);
        assert!(estimate_luminance(&flat(255)) > 0.99);
    }

    #[test]
    fn test_sharpest_frame_is_selected() {
        let chosen = select_sharpest(vec![flat(128), checkerboard(), flat(30)]).unwrap();
        assert_eq!(chosen.data, checkerboard().data);
        assert!(select_sharpest(Vec::new()).is_none());
    }

    #[test]
    fn test_rgb_conversion_skips_row_padding() {
        // 1x2 RGBA frame with 4 bytes of padding per row
        let frame = CameraFrame {
            stride: 8,
            ..CameraFrame::from_rgba(1, 2, vec![1, 2, 3, 255, 9, 9, 9, 9, 4, 5, 6, 255])
        };
        let image = to_rgb_image(&frame).unwrap();
        assert_eq!(image.as_raw(), &vec![1, 2, 3, 4, 5, 6]);
    }
}
