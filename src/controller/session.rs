// SPDX-License-Identifier: GPL-3.0-only

//! Session state owned by the capture controller

use super::device_selector::DeviceSelection;
use crate::backends::camera::{CaptureSession, PhotoOutput, PreviewLayer};
use crate::errors::{AppError, CameraError};
use std::fmt;
use std::sync::Arc;

/// Startup progress
///
/// Setup is strictly linear; each step requires the previous one and runs once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SetupStage {
    Created,
    Configured,
    DeviceSelected,
    Wired,
    PreviewAttached,
    Running,
}

impl SetupStage {
    /// Stage that must be current before moving to `self`
    pub fn prerequisite(&self) -> Option<SetupStage> {
        match self {
            SetupStage::Created => None,
            SetupStage::Configured => Some(SetupStage::Created),
            SetupStage::DeviceSelected => Some(SetupStage::Configured),
            SetupStage::Wired => Some(SetupStage::DeviceSelected),
            SetupStage::PreviewAttached => Some(SetupStage::Wired),
            SetupStage::Running => Some(SetupStage::PreviewAttached),
        }
    }
}

impl fmt::Display for SetupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SetupStage::Created => "created",
            SetupStage::Configured => "session configured",
            SetupStage::DeviceSelected => "device selected",
            SetupStage::Wired => "input/output wired",
            SetupStage::PreviewAttached => "preview attached",
            SetupStage::Running => "running",
        };
        write!(f, "{}", name)
    }
}

/// Everything the controller mutates during setup and camera switches
pub struct SessionState {
    pub session: Box<dyn CaptureSession>,
    pub stage: SetupStage,
    pub selection: DeviceSelection,
    /// Shared handle to the output attached to `session`
    pub output: Option<Arc<dyn PhotoOutput>>,
    pub preview_layer: Option<PreviewLayer>,
    pub last_error: Option<AppError>,
}

impl SessionState {
    pub fn new(session: Box<dyn CaptureSession>) -> Self {
        Self {
            session,
            stage: SetupStage::Created,
            selection: DeviceSelection::default(),
            output: None,
            preview_layer: None,
            last_error: None,
        }
    }

    /// Move to `next` if the current stage is its prerequisite
    pub fn advance(&mut self, next: SetupStage) -> Result<(), CameraError> {
        if next.prerequisite() != Some(self.stage) {
            return Err(CameraError::SetupOrder(format!(
                "cannot move to '{}' while '{}'",
                next, self.stage
            )));
        }
        self.stage = next;
        Ok(())
    }

    /// Check that the session has reached at least `stage`
    pub fn require(&self, stage: SetupStage) -> Result<(), CameraError> {
        if self.stage < stage {
            return Err(CameraError::SetupOrder(format!(
                "requires '{}', session is '{}'",
                stage, self.stage
            )));
        }
        Ok(())
    }
}
