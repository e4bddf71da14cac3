// SPDX-License-Identifier: GPL-3.0-only

//! Device selection
//!
//! Discovered devices are partitioned by position. When several devices share
//! a position the last one reported wins. The back camera is the default.

use crate::backends::camera::{CameraDevice, DevicePosition};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSelection {
    back: Option<CameraDevice>,
    front: Option<CameraDevice>,
    /// Devices without a reported position, in discovery order
    others: Vec<CameraDevice>,
    current: Option<CameraDevice>,
}

impl DeviceSelection {
    /// Partition devices by position without choosing one
    pub fn classify(devices: Vec<CameraDevice>) -> Self {
        let mut selection = Self::default();
        for device in devices {
            debug!(device = %device, "Classifying camera");
            match device.position {
                DevicePosition::Back => selection.back = Some(device),
                DevicePosition::Front => selection.front = Some(device),
                DevicePosition::Unspecified => selection.others.push(device),
            }
        }
        selection
    }

    /// Pick the current device
    ///
    /// `preferred` wins when a device exists there. Otherwise the back camera;
    /// without one, and only when `fallback` is set, the front camera or the
    /// last position-less device.
    pub fn choose_default(
        &mut self,
        preferred: Option<DevicePosition>,
        fallback: bool,
    ) -> Option<&CameraDevice> {
        let preferred = match preferred {
            Some(DevicePosition::Front) => self.front.clone(),
            Some(DevicePosition::Back) => self.back.clone(),
            _ => None,
        };

        self.current = preferred.or_else(|| self.back.clone()).or_else(|| {
            if fallback {
                self.front.clone().or_else(|| self.others.last().cloned())
            } else {
                None
            }
        });

        match &self.current {
            Some(device) => info!(device = %device, "Selected camera"),
            None => info!("No camera selected"),
        }
        self.current.as_ref()
    }

    /// Switch to the next camera
    ///
    /// Swaps back and front when both exist, otherwise cycles through every
    /// discovered device. Returns the new current device, or `None` when there
    /// is nothing to switch to.
    pub fn toggle(&mut self) -> Option<&CameraDevice> {
        let next = match (&self.back, &self.front, &self.current) {
            (Some(back), Some(front), Some(current)) if current == back => Some(front.clone()),
            (Some(back), Some(front), Some(current)) if current == front => Some(back.clone()),
            _ => {
                let all = self.all();
                if all.len() < 2 {
                    None
                } else {
                    let index = self
                        .current
                        .as_ref()
                        .and_then(|c| all.iter().position(|d| *d == c))
                        .map(|i| (i + 1) % all.len())
                        .unwrap_or(0);
                    Some(all[index].clone())
                }
            }
        };

        let next = next?;
        info!(device = %next, "Switching camera");
        self.current = Some(next);
        self.current.as_ref()
    }

    /// Force the current device (used to roll back a failed switch)
    pub fn set_current(&mut self, device: Option<CameraDevice>) {
        self.current = device;
    }

    pub fn current(&self) -> Option<&CameraDevice> {
        self.current.as_ref()
    }

    pub fn back(&self) -> Option<&CameraDevice> {
        self.back.as_ref()
    }

    pub fn front(&self) -> Option<&CameraDevice> {
        self.front.as_ref()
    }

    /// Back, front, then position-less devices
    pub fn all(&self) -> Vec<&CameraDevice> {
        self.back
            .iter()
            .chain(self.front.iter())
            .chain(self.others.iter())
            .collect()
    }
}
