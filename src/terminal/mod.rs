// SPDX-License-Identifier: GPL-3.0-only

//! Terminal single-screen camera
//!
//! Full-screen live preview with a shutter control and a status bar. Keys:
//! `space`/`p` take a picture, `s` switches camera, `h` toggles help,
//! `q`/Ctrl+C quits.

mod preview_widget;
mod shutter_button;
mod status_bar;

pub use preview_widget::{PreviewWidget, layer_bounds};
pub use shutter_button::{ShutterButton, ShutterStyle, ShutterVisual, shutter_area};
pub use status_bar::{StatusBar, build_help_message, build_status_message};

use crate::backends::camera::gst::{GstDeviceRegistry, GstSession};
use crate::config::Config;
use crate::controller::{CaptureController, ControllerEvent};
use crate::constants::timing;
use crate::storage::DirectoryPhotoLibrary;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use std::io::{self, stdout};
use std::sync::Arc;
use tracing::info;

/// Run the terminal camera
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    gstreamer::init()?;

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Split the screen into preview and status line
fn split(area: Rect) -> (Rect, Rect) {
    let preview = Rect {
        height: area.height.saturating_sub(1),
        ..area
    };
    let status = Rect {
        y: area.y + area.height.saturating_sub(1),
        height: area.height.min(1),
        ..area
    };
    (preview, status)
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let library = Arc::new(DirectoryPhotoLibrary::new(config.photo_dir()));
    info!(dir = %library.dir().display(), "Photo library");

    let session = GstSession::new(config.jpeg_quality.value());
    let mut controller = CaptureController::new(
        Box::new(session),
        Box::new(GstDeviceRegistry::new()),
        library,
        config,
    );
    let mut events = controller.take_events();

    let size = terminal.size()?;
    let (preview_area, _) = split(Rect::new(0, 0, size.width, size.height));
    let mut frames = controller.launch(layer_bounds(preview_area))?;

    let multi_camera = controller.selection().all().len() > 1;
    let mut preview = PreviewWidget::new(controller.preview_layer().cloned().unwrap_or_default());
    let mut show_help = false;
    let mut status_message = build_status_message(multi_camera);
    let mut last_area = preview_area;

    loop {
        // Drain all available frames to get the latest
        while let Ok(frame) = frames.try_recv() {
            preview.update_frame(frame);
        }

        controller.dispatch_pending();

        if let Some(rx) = events.as_mut() {
            while let Ok(event) = rx.try_recv() {
                if let Some(message) = describe_event(&event) {
                    status_message = message;
                }
                if let ControllerEvent::CameraSwitched(_) = &event {
                    preview.clear();
                }
            }
        }

        let visual = if controller.capture_state().is_capturing() {
            ShutterVisual::Capturing
        } else if controller.session().output().is_none() {
            ShutterVisual::Disabled
        } else {
            ShutterVisual::Ready
        };
        let camera_name = controller.current_device().map(|d| d.name.clone());

        terminal.draw(|f| {
            let (preview_area, status_area) = split(f.area());
            f.render_widget(&preview, preview_area);

            let button_area = shutter_area(preview_area);
            f.render_widget(ShutterButton::new(button_area, visual), button_area);

            f.render_widget(
                StatusBar {
                    message: &status_message,
                    detail: camera_name.as_deref(),
                },
                status_area,
            );
        })?;

        let size = terminal.size()?;
        let (area, _) = split(Rect::new(0, 0, size.width, size.height));
        if area != last_area {
            controller.resize_preview(layer_bounds(area));
            if let Some(layer) = controller.preview_layer() {
                preview.set_layer(layer.clone());
            }
            last_area = area;
        }

        if event::poll(timing::UI_POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                KeyCode::Char('q') => break,
                KeyCode::Char(' ') | KeyCode::Char('p') => {
                    show_help = false;
                    match controller.trigger_capture() {
                        Ok(_) => status_message = "Capturing...".to_string(),
                        Err(e) => status_message = format!("Error: {}", e),
                    }
                }
                KeyCode::Char('s') if multi_camera => {
                    show_help = false;
                    match controller.toggle_camera() {
                        Ok(Some(_)) => {}
                        Ok(None) => status_message = build_status_message(multi_camera),
                        Err(e) => status_message = format!("Error: {}", e),
                    }
                }
                KeyCode::Char('h') => {
                    show_help = !show_help;
                    status_message = if show_help {
                        build_help_message(multi_camera)
                    } else {
                        build_status_message(multi_camera)
                    };
                }
                _ => {}
            }
        }
    }

    controller.shutdown();
    Ok(())
}

/// Status line text for a controller event
fn describe_event(event: &ControllerEvent) -> Option<String> {
    match event {
        ControllerEvent::WiringFailed(e) | ControllerEvent::SessionFailed(e) => {
            Some(format!("Error: {}", e))
        }
        ControllerEvent::CameraSwitched(device) => Some(format!("Switched to {}", device.name)),
        ControllerEvent::PhotoSaved { path, .. } => Some(format!("Saved: {}", path.display())),
        ControllerEvent::CaptureFailed { error, .. } => Some(format!("Error: {}", error)),
        ControllerEvent::DeviceSelected(None) => Some("No camera found".to_string()),
        ControllerEvent::DeviceSelected(Some(_))
        | ControllerEvent::SessionStarted
        | ControllerEvent::CaptureStarted(_) => None,
    }
}
