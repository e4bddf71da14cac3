// SPDX-License-Identifier: GPL-3.0-only

//! Preview layer geometry
//!
//! A [`PreviewLayer`] describes where and how live frames are drawn: the
//! destination bounds inside the parent view, how the frame is scaled into
//! them, the display orientation, and the stacking position among sibling
//! layers.

/// How frames are scaled into the layer bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoGravity {
    /// Preserve aspect ratio and fill the bounds, cropping the overflow
    #[default]
    ResizeAspectFill,
    /// Preserve aspect ratio and fit inside the bounds (letterbox)
    ResizeAspect,
}

/// Display orientation of the preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

/// Rectangle in parent coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Region of a source frame, in source pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Visual layer bound to a capture session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreviewLayer {
    pub gravity: VideoGravity,
    pub orientation: VideoOrientation,
    pub frame: Bounds,
    /// Stacking index among the parent's layers, 0 is bottom-most
    pub z_index: u32,
}

impl PreviewLayer {
    pub fn new(gravity: VideoGravity, orientation: VideoOrientation) -> Self {
        Self {
            gravity,
            orientation,
            frame: Bounds::default(),
            z_index: 0,
        }
    }

    /// Resize the layer
    pub fn set_frame(&mut self, frame: Bounds) {
        self.frame = frame;
    }

    /// Part of a `src_width` x `src_height` frame that is visible in the layer
    pub fn source_region(&self, src_width: u32, src_height: u32) -> SourceRegion {
        let full = SourceRegion {
            x: 0.0,
            y: 0.0,
            width: src_width as f64,
            height: src_height as f64,
        };

        if self.gravity != VideoGravity::ResizeAspectFill
            || self.frame.is_empty()
            || src_width == 0
            || src_height == 0
        {
            return full;
        }

        let dst_aspect = self.frame.width as f64 / self.frame.height as f64;
        let src_aspect = src_width as f64 / src_height as f64;

        if src_aspect > dst_aspect {
            // Source is wider - crop left and right
            let width = src_height as f64 * dst_aspect;
            SourceRegion {
                x: (src_width as f64 - width) / 2.0,
                width,
                ..full
            }
        } else {
            // Source is taller - crop top and bottom
            let height = src_width as f64 / dst_aspect;
            SourceRegion {
                y: (src_height as f64 - height) / 2.0,
                height,
                ..full
            }
        }
    }

    /// Where a `src_width` x `src_height` frame lands inside the layer
    pub fn destination(&self, src_width: u32, src_height: u32) -> Bounds {
        if self.gravity != VideoGravity::ResizeAspect
            || self.frame.is_empty()
            || src_width == 0
            || src_height == 0
        {
            return self.frame;
        }

        let scale = f64::min(
            self.frame.width as f64 / src_width as f64,
            self.frame.height as f64 / src_height as f64,
        );
        let width = (src_width as f64 * scale) as u32;
        let height = (src_height as f64 * scale) as u32;

        Bounds {
            x: self.frame.x + (self.frame.width - width) / 2,
            y: self.frame.y + (self.frame.height - height) / 2,
            width,
            height,
        }
    }
}
