// SPDX-License-Identifier: GPL-3.0-only

//! Shutter control
//!
//! A white ring, fully rounded, drawn above the preview near the bottom edge.

use crate::constants::ui::{SHUTTER_BORDER_WIDTH, SHUTTER_BOTTOM_MARGIN, SHUTTER_SIZE};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, BorderType, Widget},
};

/// Visual style of the shutter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutterStyle {
    pub border_color: Color,
    pub border_width: u16,
    pub corner_radius: u16,
}

impl ShutterStyle {
    /// White border, fully rounded for a `width` x `height` control
    pub fn for_size(width: u16, height: u16) -> Self {
        Self {
            border_color: Color::White,
            border_width: SHUTTER_BORDER_WIDTH,
            corner_radius: width.min(height) / 2,
        }
    }
}

/// What the shutter currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutterVisual {
    #[default]
    Ready,
    Capturing,
    /// No photo output, pressing does nothing useful
    Disabled,
}

pub struct ShutterButton {
    pub style: ShutterStyle,
    pub visual: ShutterVisual,
}

impl ShutterButton {
    pub fn new(area: Rect, visual: ShutterVisual) -> Self {
        Self {
            style: ShutterStyle::for_size(area.width, area.height),
            visual,
        }
    }
}

/// Centered area for the shutter at the bottom of `parent`
pub fn shutter_area(parent: Rect) -> Rect {
    let (width, height) = SHUTTER_SIZE;
    let width = width.min(parent.width);
    let height = height.min(parent.height);
    let x = parent.x + (parent.width - width) / 2;
    let y = parent.y
        + parent
            .height
            .saturating_sub(height + SHUTTER_BOTTOM_MARGIN);
    Rect::new(x, y, width, height)
}

impl Widget for ShutterButton {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_type = if self.style.corner_radius > 0 {
            BorderType::Rounded
        } else if self.style.border_width > 1 {
            BorderType::Thick
        } else {
            BorderType::Plain
        };

        let border_color = match self.visual {
            ShutterVisual::Disabled => Color::DarkGray,
            _ => self.style.border_color,
        };

        let block = Block::bordered()
            .border_type(border_type)
            .border_style(Style::default().fg(border_color));
        let inner = block.inner(area);
        block.render(area, buf);

        let (symbol, color) = match self.visual {
            ShutterVisual::Ready => ("●", Color::White),
            ShutterVisual::Capturing => ("◉", Color::Yellow),
            ShutterVisual::Disabled => ("○", Color::DarkGray),
        };
        if inner.width > 0 && inner.height > 0 {
            let x = inner.x + inner.width / 2;
            let y = inner.y + inner.height / 2;
            buf.set_string(x, y, symbol, Style::default().fg(color));
        }
    }
}
