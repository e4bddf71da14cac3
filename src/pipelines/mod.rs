// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines for photo capture
//!
//! Turns live camera frames into finished image bytes without touching the
//! preview stream:
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Camera Frame │ ──▶ │  Photo Pipeline   │ ──▶ │ JPEG / PNG   │
//! │   (RGBA)     │     │  - Frame choice   │     │    bytes     │
//! │              │     │  - RGBA→RGB       │     │              │
//! │              │     │  - Encoding       │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`photo`]: frame analysis (luminance, sharpness) and encoding

pub mod photo;
