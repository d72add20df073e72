//! POSIX discovery (Linux, macOS, BSD)
//!
//! USB-serial drivers create device files with a fixed naming convention
//! (`/dev/ttyUSB0`, `/dev/cu.usbserial-1420`, ...). Each matching entry is a
//! candidate scale. When the native port enumerator knows the USB strings for
//! the same path they are used as model and vendor hints.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use scale_protocol::{SystemScaleDevice, VendorTable};
use serialport::{available_ports, SerialPortType};
use tracing::{debug, warn};

use super::{log_devices, DeviceDiscovery};
use crate::error::DetectError;
use crate::platform::Platform;
use crate::usb_ids;

/// USB descriptor strings reported for a serial port
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsbMetadata {
    pub vid: u16,
    pub pid: u16,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

impl UsbMetadata {
    /// Create from serialport crate's port type (USB ports only)
    fn from_serialport(port_type: &SerialPortType) -> Option<Self> {
        match port_type {
            SerialPortType::UsbPort(usb) => Some(Self {
                vid: usb.vid,
                pid: usb.pid,
                serial_number: usb.serial_number.clone(),
                manufacturer: usb.manufacturer.clone(),
                product: usb.product.clone(),
            }),
            _ => None,
        }
    }

    /// Product string, falling back to the bridge chip name
    fn model(&self) -> Option<String> {
        self.product
            .clone()
            .or_else(|| usb_ids::adapter_name(self.vid).map(str::to_string))
    }
}

/// Device-file discovery for Unix-like hosts
#[derive(Debug, Clone)]
pub struct PosixDiscovery {
    dev_dir: PathBuf,
    prefixes: Vec<String>,
    usb_metadata: bool,
    vendors: VendorTable,
}

impl PosixDiscovery {
    /// Scan `/dev` with the platform's naming convention
    pub fn new(platform: Platform, vendors: VendorTable) -> Self {
        Self {
            dev_dir: PathBuf::from("/dev"),
            prefixes: platform
                .serial_device_prefixes()
                .iter()
                .map(|p| p.to_string())
                .collect(),
            usb_metadata: true,
            vendors,
        }
    }

    /// Scan a different directory instead of `/dev`
    pub fn with_dev_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dev_dir = dir.into();
        self
    }

    /// Skip the native USB enumerator (paths only)
    pub fn without_usb_metadata(mut self) -> Self {
        self.usb_metadata = false;
        self
    }

    pub fn dev_dir(&self) -> &Path {
        &self.dev_dir
    }

    fn matches(&self, file_name: &str) -> bool {
        self.prefixes.iter().any(|p| file_name.starts_with(p.as_str()))
    }

    fn scan(&self) -> Result<Vec<SystemScaleDevice>, DetectError> {
        let metadata = if self.usb_metadata {
            usb_metadata_by_port()
        } else {
            HashMap::new()
        };

        let mut paths: Vec<String> = std::fs::read_dir(&self.dev_dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| self.matches(name))
            .map(|name| self.dev_dir.join(name).to_string_lossy().into_owned())
            .collect();
        paths.sort();

        Ok(paths
            .into_iter()
            .map(|path| {
                let usb = metadata.get(&path);
                self.describe(path, usb)
            })
            .collect())
    }

    fn describe(&self, address: String, usb: Option<&UsbMetadata>) -> SystemScaleDevice {
        let mut device = SystemScaleDevice::serial(address);
        if let Some(usb) = usb {
            if !usb_ids::is_known_serial_adapter(usb.vid, usb.pid) {
                debug!(
                    "{} uses an uncommon USB bridge {:04x}:{:04x}",
                    device.address, usb.vid, usb.pid
                );
            }
            device.model_hint = usb.model();
            device.vendor_hint = self
                .vendors
                .match_any(
                    [usb.product.as_deref(), usb.manufacturer.as_deref()]
                        .into_iter()
                        .flatten(),
                )
                .map(str::to_string);
        }
        device
    }
}

#[async_trait]
impl DeviceDiscovery for PosixDiscovery {
    async fn discover(&self) -> Vec<SystemScaleDevice> {
        debug!(
            "Scanning {} for {:?}",
            self.dev_dir.display(),
            self.prefixes
        );
        let this = self.clone();
        let devices = match tokio::task::spawn_blocking(move || this.scan()).await {
            Ok(Ok(devices)) => devices,
            Ok(Err(e)) => {
                warn!("Device scan unavailable: {}", e);
                Vec::new()
            }
            Err(e) => {
                warn!("Device scan task failed: {}", e);
                Vec::new()
            }
        };
        log_devices(&devices);
        devices
    }
}

/// USB strings keyed by port path, empty when enumeration fails
fn usb_metadata_by_port() -> HashMap<String, UsbMetadata> {
    match available_ports() {
        Ok(ports) => ports
            .into_iter()
            .filter_map(|p| UsbMetadata::from_serialport(&p.port_type).map(|m| (p.port_name, m)))
            .collect(),
        Err(e) => {
            debug!("USB metadata unavailable: {}", e);
            HashMap::new()
        }
    }
}
