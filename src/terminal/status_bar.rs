// SPDX-License-Identifier: GPL-3.0-only

//! Status bar and key hints

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

pub fn build_status_message(multi_camera: bool) -> String {
    let mut msg = "'space' picture".to_string();
    if multi_camera {
        msg.push_str(" | 's' switch camera");
    }
    msg.push_str(" | 'h' help | 'q' quit");
    msg
}

pub fn build_help_message(multi_camera: bool) -> String {
    let mut msg = String::from("space/p: Take picture | ");
    if multi_camera {
        msg.push_str("s: Switch camera | ");
    }
    msg.push_str("h: Toggle help | q/Ctrl+C: Quit");
    msg
}

/// Status bar widget
pub struct StatusBar<'a> {
    pub message: &'a str,
    /// Shown right-aligned, e.g. the active camera
    pub detail: Option<&'a str>,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(Color::White).bg(Color::DarkGray);

        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let width = area.width as usize;
        let text: String = self.message.chars().take(width).collect();
        let used = text.chars().count();
        buf.set_string(area.x, area.y, &text, style);

        if let Some(detail) = self.detail {
            let detail_len = detail.chars().count();
            // Only when it fits after the message with a gap
            if used + detail_len + 2 <= width {
                let x = area.x + (width - detail_len) as u16;
                buf.set_string(x, area.y, detail, style.fg(Color::Gray));
            }
        }
    }
}
