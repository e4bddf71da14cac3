// SPDX-License-Identifier: GPL-3.0-only

//! Camera enumeration through the GStreamer device monitor
//!
//! Every provider registered with GStreamer (PipeWire, V4L2, libcamera) reports
//! its video sources here. Each device is mapped to the source element and
//! address needed to open it later.

use super::super::types::{CameraDevice, DevicePosition, DeviceType};
use super::super::{DeviceRegistry, DiscoveryCriteria};
use crate::constants::pipeline::VIDEO_SOURCE_CLASS;
use gstreamer::prelude::*;
use tracing::{debug, info, warn};

/// Device registry backed by `gstreamer::DeviceMonitor`
#[derive(Debug, Default, Clone, Copy)]
pub struct GstDeviceRegistry;

impl GstDeviceRegistry {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceRegistry for GstDeviceRegistry {
    fn discover(&self, criteria: &DiscoveryCriteria) -> Vec<CameraDevice> {
        let devices: Vec<CameraDevice> = enumerate_cameras()
            .into_iter()
            .filter(|device| criteria.matches(device))
            .collect();
        info!(count = devices.len(), "Cameras matching discovery criteria");
        devices
    }
}

/// Flattened view of the properties a provider attached to a device
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct DeviceProperties {
    pub api: Option<String>,
    pub device_path: Option<String>,
    pub object_serial: Option<String>,
    pub libcamera_location: Option<String>,
    pub libcamera_name: Option<String>,
}

/// Enumerate every video source the device monitor can see
pub fn enumerate_cameras() -> Vec<CameraDevice> {
    if let Err(e) = gstreamer::init() {
        warn!(error = %e, "GStreamer init failed, no cameras available");
        return Vec::new();
    }

    let monitor = gstreamer::DeviceMonitor::new();
    if monitor.add_filter(Some(VIDEO_SOURCE_CLASS), None).is_none() {
        warn!("Failed to add video source filter to device monitor");
        return Vec::new();
    }
    if let Err(e) = monitor.start() {
        warn!(error = %e, "Device monitor failed to start");
        return Vec::new();
    }

    let mut cameras = Vec::new();
    for (index, device) in monitor.devices().into_iter().enumerate() {
        let name = device.display_name().to_string();
        let props = device
            .properties()
            .map(|s| read_properties(&s))
            .unwrap_or_default();
        debug!(name = %name, props = ?props, "Device monitor entry");

        if let Some(camera) = to_camera_device(index, name, &props) {
            cameras.push(camera);
        }
    }

    monitor.stop();

    // PipeWire re-exports V4L2/libcamera nodes; keep the PipeWire entry when both exist
    let cameras = dedup_by_name(cameras);
    info!(count = cameras.len(), "Enumerated cameras");
    cameras
}

fn read_properties(s: &gstreamer::StructureRef) -> DeviceProperties {
    DeviceProperties {
        api: string_property(s, "device.api"),
        device_path: string_property(s, "api.v4l2.path")
            .or_else(|| string_property(s, "device.path")),
        object_serial: string_property(s, "object.serial"),
        libcamera_location: string_property(s, "api.libcamera.location"),
        libcamera_name: string_property(s, "api.libcamera.name")
            .or_else(|| string_property(s, "object.path")),
    }
}

/// Read a property as a string regardless of its GType
fn string_property(s: &gstreamer::StructureRef, field: &str) -> Option<String> {
    if let Ok(value) = s.get::<String>(field) {
        return Some(value);
    }
    let value = s.value(field).ok()?;
    value.serialize().ok().map(|v| v.to_string())
}

/// Map a monitor entry to a camera device
pub(crate) fn to_camera_device(
    index: usize,
    name: String,
    props: &DeviceProperties,
) -> Option<CameraDevice> {
    let position = props
        .libcamera_location
        .as_deref()
        .map(DevicePosition::from_location)
        .unwrap_or_default();

    // Position-less USB webcams are still ordinary wide-angle cameras
    let device_type = if props.libcamera_location.as_deref() == Some("external") {
        DeviceType::External
    } else {
        DeviceType::WideAngle
    };

    let (element, path) = match props.api.as_deref() {
        Some("pipewire") | None if props.object_serial.is_some() => {
            ("pipewiresrc", props.object_serial.clone()?)
        }
        Some("v4l2") => ("v4l2src", props.device_path.clone()?),
        Some("libcamera") => ("libcamerasrc", props.libcamera_name.clone().unwrap_or_default()),
        _ => match &props.device_path {
            Some(path) => ("v4l2src", path.clone()),
            None => ("autovideosrc", String::new()),
        },
    };

    let id = if path.is_empty() {
        format!("{}:{}", element, index)
    } else {
        format!("{}:{}", element, path)
    };

    Some(
        CameraDevice::new(id, name, position)
            .with_device_type(device_type)
            .with_source(element, path),
    )
}

/// Drop duplicate entries for the same camera, preferring PipeWire
fn dedup_by_name(cameras: Vec<CameraDevice>) -> Vec<CameraDevice> {
    let pipewire_names: Vec<String> = cameras
        .iter()
        .filter(|c| c.source_element == "pipewiresrc")
        .map(|c| c.name.clone())
        .collect();

    cameras
        .into_iter()
        .filter(|c| c.source_element == "pipewiresrc" || !pipewire_names.contains(&c.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipewire_device_targets_object_serial() {
        let props = DeviceProperties {
            api: Some("pipewire".into()),
            object_serial: Some("57".into()),
            libcamera_location: Some("back".into()),
            ..Default::default()
        };
        let device = to_camera_device(0, "Main".into(), &props).unwrap();

        assert_eq!(device.source_element, "pipewiresrc");
        assert_eq!(device.path, "57");
        assert_eq!(device.position, DevicePosition::Back);
        assert_eq!(device.device_type, DeviceType::WideAngle);
    }

    #[test]
    fn test_v4l2_device_without_location_is_unspecified() {
        let props = DeviceProperties {
            api: Some("v4l2".into()),
            device_path: Some("/dev/video0".into()),
            ..Default::default()
        };
        let device = to_camera_device(3, "Webcam".into(), &props).unwrap();

        assert_eq!(device.source_element, "v4l2src");
        assert_eq!(device.id, "v4l2src:/dev/video0");
        assert_eq!(device.position, DevicePosition::Unspecified);
    }

    #[test]
    fn test_external_location_is_external_type() {
        let props = DeviceProperties {
            api: Some("libcamera".into()),
            libcamera_location: Some("external".into()),
            libcamera_name: Some("\\_SB_.usb".into()),
            ..Default::default()
        };
        let device = to_camera_device(1, "USB".into(), &props).unwrap();
        assert_eq!(device.device_type, DeviceType::External);
        assert_eq!(device.source_element, "libcamerasrc");
    }

    #[test]
    fn test_dedup_prefers_pipewire() {
        let v4l2 = CameraDevice::new("a", "Cam", DevicePosition::Front)
            .with_source("v4l2src", "/dev/video0");
        let pw = CameraDevice::new("b", "Cam", DevicePosition::Front)
            .with_source("pipewiresrc", "42");
        let other = CameraDevice::new("c", "Other", DevicePosition::Back)
            .with_source("v4l2src", "/dev/video2");

        let kept = dedup_by_name(vec![v4l2, pw.clone(), other.clone()]);
        assert_eq!(kept, vec![pw, other]);
    }
}
