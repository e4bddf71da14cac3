// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};

/// JPEG quality presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JpegQuality {
    /// Low quality (high compression)
    Low,
    /// Medium quality (balanced)
    Medium,
    /// High quality (low compression, default)
    #[default]
    High,
    /// Maximum quality (minimal compression)
    Maximum,
}

impl JpegQuality {
    /// Get all preset variants
    pub const ALL: [JpegQuality; 4] = [
        JpegQuality::Low,
        JpegQuality::Medium,
        JpegQuality::High,
        JpegQuality::Maximum,
    ];

    /// Get JPEG quality value (0-100)
    pub fn value(&self) -> u8 {
        match self {
            JpegQuality::Low => 60,
            JpegQuality::Medium => 80,
            JpegQuality::High => 92,
            JpegQuality::Maximum => 98,
        }
    }

    /// Get display name for the preset
    pub fn display_name(&self) -> &'static str {
        match self {
            JpegQuality::Low => "Low",
            JpegQuality::Medium => "Medium",
            JpegQuality::High => "High",
            JpegQuality::Maximum => "Maximum",
        }
    }
}

/// Default folder name for saving photos
pub const DEFAULT_SAVE_FOLDER: &str = "Camera";

/// Application directory name under the config/cache dirs
pub const APP_DIR_NAME: &str = "shutter";

/// GStreamer pipeline constants
pub mod pipeline {
    /// Maximum buffer queue size (keep small for low latency)
    pub const MAX_BUFFERS: u32 = 2;

    /// Preview channel capacity, frames beyond this are dropped
    pub const PREVIEW_CHANNEL_CAPACITY: usize = 4;

    /// Device class matched by the device monitor
    pub const VIDEO_SOURCE_CLASS: &str = "Video/Source";
}

/// Timing constants
pub mod timing {
    use std::time::Duration;

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Pipeline state change timeout on stop
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Pipeline playing state timeout on start
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Terminal input poll interval (~60 fps redraw)
    pub const UI_POLL_INTERVAL: Duration = Duration::from_millis(16);

    /// Camera warm-up before a headless capture
    pub const WARMUP: Duration = Duration::from_millis(500);

    /// Upper bound for a headless capture to complete
    pub const CAPTURE_WAIT: Duration = Duration::from_secs(10);
}

/// Photo capture constants
pub mod capture {
    use std::time::Duration;

    /// How long a capture waits for fresh frames
    pub const FRAME_TIMEOUT: Duration = Duration::from_secs(3);

    /// Frames compared when stabilization is enabled
    pub const STABILIZATION_FRAMES: usize = 3;

    /// How long the flash LED is lit before frames are taken
    pub const FLASH_PRE_FIRE: Duration = Duration::from_millis(200);

    /// Scene luminance (0.0-1.0) under which auto flash fires
    pub const AUTO_FLASH_LUMINANCE: f32 = 0.25;

    /// Maximum luminance samples per frame
    pub const LUMINANCE_SAMPLES: usize = 10_000;
}

/// UI Constants
pub mod ui {
    /// Shutter button border width
    pub const SHUTTER_BORDER_WIDTH: u16 = 5;

    /// Shutter button size in terminal cells (width, height)
    pub const SHUTTER_SIZE: (u16, u16) = (12, 5);

    /// Margin between the shutter and the bottom edge
    pub const SHUTTER_BOTTOM_MARGIN: u16 = 2;
}
