// SPDX-License-Identifier: GPL-3.0-only

//! Live preview rendered with Unicode half-block characters
//!
//! Each terminal cell shows two vertical pixels: the upper half (`▀`) takes
//! the foreground color, the lower half the background color. A cell is
//! roughly twice as tall as it is wide, so half-block pixels are close to square.

use crate::backends::camera::{Bounds, CameraFrame, PreviewLayer};
use ratatui::{buffer::Buffer, layout::Rect, style::Color, style::Style, widgets::Widget};

/// Layer bounds for a terminal area, in half-block pixels
pub fn layer_bounds(area: Rect) -> Bounds {
    Bounds::new(
        area.x as u32,
        area.y as u32 * 2,
        area.width as u32,
        area.height as u32 * 2,
    )
}

/// Widget that renders the latest camera frame through a preview layer
pub struct PreviewWidget {
    frame: Option<CameraFrame>,
    layer: PreviewLayer,
}

impl PreviewWidget {
    pub fn new(layer: PreviewLayer) -> Self {
        Self { frame: None, layer }
    }

    pub fn update_frame(&mut self, frame: CameraFrame) {
        self.frame = Some(frame);
    }

    /// Drop the current frame (camera switched)
    pub fn clear(&mut self) {
        self.frame = None;
    }

    pub fn set_layer(&mut self, layer: PreviewLayer) {
        self.layer = layer;
    }

    pub fn frame(&self) -> Option<&CameraFrame> {
        self.frame.as_ref()
    }
}

impl Widget for &PreviewWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = &self.frame else {
            // No frame yet - show placeholder
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        if area.width == 0 || area.height == 0 || frame.width == 0 || frame.height == 0 {
            return;
        }

        // The layer fills the whole area; only the crop differs per frame size
        let mut layer = self.layer.clone();
        layer.set_frame(layer_bounds(area));
        let region = layer.source_region(frame.width, frame.height);

        let x_scale = region.width / area.width as f64;
        let y_scale = region.height / (area.height as f64 * 2.0);

        for ty in 0..area.height {
            let src_y_top = (region.y + (ty as f64 * 2.0 + 0.5) * y_scale) as u32;
            let src_y_bottom = (region.y + (ty as f64 * 2.0 + 1.5) * y_scale) as u32;

            for tx in 0..area.width {
                let src_x = (region.x + (tx as f64 + 0.5) * x_scale) as u32;

                let (r, g, b) = frame.pixel_rgb(src_x, src_y_top);
                let top = Color::Rgb(r, g, b);
                let (r, g, b) = frame.pixel_rgb(src_x, src_y_bottom);
                let bottom = Color::Rgb(r, g, b);

                if let Some(cell) = buf.cell_mut((area.x + tx, area.y + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}
