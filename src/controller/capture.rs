// SPDX-License-Identifier: GPL-3.0-only

//! Capture trigger state machine
//!
//! ```text
//! Idle ──trigger──▶ Capturing ──completion──▶ Saved | Failed ──▶ Idle
//! ```
//!
//! Exactly one request may be outstanding. `Saved` and `Failed` are reported
//! as the last outcome once the flow is back to `Idle`.

use crate::backends::camera::CaptureSettings;
use crate::config::Config;
use crate::errors::PhotoError;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaptureState {
    /// Awaiting the shutter
    #[default]
    Idle,
    /// A request is outstanding
    Capturing { request_id: Uuid },
    /// The photo was written to the library
    Saved { request_id: Uuid, path: PathBuf },
    /// The request ended without a saved photo
    Failed { request_id: Uuid, error: PhotoError },
}

impl CaptureState {
    pub fn is_capturing(&self) -> bool {
        matches!(self, CaptureState::Capturing { .. })
    }
}

/// Settings for one shutter press, built fresh from configuration
pub fn build_settings(config: &Config) -> CaptureSettings {
    CaptureSettings::with_codec(config.codec)
        .flash_mode(config.flash_mode)
        .stabilization(config.stabilization)
}

#[derive(Debug, Default)]
pub struct CaptureFlow {
    state: CaptureState,
    last_outcome: Option<CaptureState>,
}

impl CaptureFlow {
    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    /// Outcome of the most recent finished request
    pub fn last_outcome(&self) -> Option<&CaptureState> {
        self.last_outcome.as_ref()
    }

    /// Id of the outstanding request
    pub fn pending(&self) -> Option<Uuid> {
        match self.state {
            CaptureState::Capturing { request_id } => Some(request_id),
            _ => None,
        }
    }

    /// Idle → Capturing
    pub fn begin(&mut self, request_id: Uuid) -> Result<(), PhotoError> {
        if self.state.is_capturing() {
            return Err(PhotoError::Busy);
        }
        self.state = CaptureState::Capturing { request_id };
        Ok(())
    }

    /// Capturing → Saved | Failed → Idle
    ///
    /// Returns false, leaving the flow untouched, when `request_id` is not the
    /// outstanding request.
    pub fn finish(&mut self, request_id: Uuid, outcome: Result<PathBuf, PhotoError>) -> bool {
        if self.pending() != Some(request_id) {
            return false;
        }
        self.state = match outcome {
            Ok(path) => CaptureState::Saved { request_id, path },
            Err(error) => CaptureState::Failed { request_id, error },
        };
        self.last_outcome = Some(std::mem::take(&mut self.state));
        true
    }
}
