// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera capture
//!
//! # Modules
//!
//! - [`camera`]: Platform traits (registry, session, photo output, photo
//!   library) and the GStreamer implementation

pub mod camera;
