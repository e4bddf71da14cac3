// SPDX-License-Identifier: GPL-3.0-only

//! Shutter - a single-screen camera
//!
//! Live preview, one shutter, one camera toggle. A thin capture controller
//! orchestrates a platform camera stack and writes photos to the user's
//! photo library.
//!
//! # Architecture
//!
//! - [`controller`]: capture controller, device selection and capture state machine
//! - [`backends`]: platform traits plus the GStreamer implementation
//! - [`pipelines`]: frame analysis and photo encoding
//! - [`storage`]: directory-backed photo library
//! - [`flash`]: sysfs flash LED control
//! - [`terminal`]: full-screen terminal front-end
//! - [`config`]: user configuration handling

pub mod backends;
pub mod config;
pub mod constants;
pub mod controller;
pub mod errors;
pub mod flash;
pub mod pipelines;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use config::Config;
pub use controller::{CaptureController, CaptureState, ControllerEvent};
pub use errors::{AppError, AppResult, CameraError, PhotoError};
