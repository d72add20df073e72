//! Windows discovery
//!
//! Windows exposes devices through its management interface. Three tables
//! are queried through PowerShell with JSON output: serial ports
//! (`Win32_SerialPort`), Bluetooth devices and HID devices (PnP classes).
//! Each table is best effort on its own; a table whose query fails
//! contributes nothing.

use std::sync::Arc;

use async_trait::async_trait;
use scale_protocol::{ConnectionKind, SystemScaleDevice, VendorTable};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{log_devices, DeviceDiscovery};
use crate::error::DetectError;
use crate::runner::CommandRunner;

const POWERSHELL: &str = "powershell";

const SERIAL_QUERY: &str = "Get-CimInstance -ClassName Win32_SerialPort | \
     Select-Object DeviceID,Name,Description,PNPDeviceID | ConvertTo-Json -Compress";
const BLUETOOTH_QUERY: &str = "Get-PnpDevice -Class Bluetooth -PresentOnly | \
     Select-Object FriendlyName,InstanceId,Manufacturer | ConvertTo-Json -Compress";
const HID_QUERY: &str = "Get-PnpDevice -Class HIDClass -PresentOnly | \
     Select-Object FriendlyName,InstanceId,Manufacturer | ConvertTo-Json -Compress";

/// `ConvertTo-Json` emits a bare object for one row and an array for many
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::Many(v) => v,
            OneOrMany::One(t) => vec![t],
        }
    }
}

/// Row of `Win32_SerialPort`
#[derive(Debug, Deserialize)]
struct SerialPortRow {
    #[serde(rename = "DeviceID")]
    device_id: Option<String>,
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Description")]
    description: Option<String>,
    #[serde(rename = "PNPDeviceID")]
    pnp_device_id: Option<String>,
}

/// Row of `Get-PnpDevice`
#[derive(Debug, Deserialize)]
struct PnpDeviceRow {
    #[serde(rename = "FriendlyName")]
    friendly_name: Option<String>,
    #[serde(rename = "InstanceId")]
    instance_id: Option<String>,
    #[serde(rename = "Manufacturer")]
    manufacturer: Option<String>,
}

/// Management-interface discovery for Windows hosts
pub struct WindowsDiscovery {
    runner: Arc<dyn CommandRunner>,
    vendors: VendorTable,
}

impl WindowsDiscovery {
    pub fn new(runner: Arc<dyn CommandRunner>, vendors: VendorTable) -> Self {
        Self { runner, vendors }
    }

    async fn query<T: DeserializeOwned>(&self, script: &str) -> Result<Vec<T>, DetectError> {
        let output = self
            .runner
            .run(
                POWERSHELL,
                &["-NoProfile", "-NonInteractive", "-Command", script],
            )
            .await?
            .into_result(POWERSHELL)?;

        let text = output.stdout.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let rows: OneOrMany<T> = serde_json::from_str(text)?;
        Ok(rows.into())
    }

    /// Run one table query, logging and swallowing its failure
    async fn table<T: DeserializeOwned>(&self, label: &str, script: &str) -> Vec<T> {
        match self.query(script).await {
            Ok(rows) => {
                debug!("{} table: {} row(s)", label, rows.len());
                rows
            }
            Err(e) => {
                warn!("{} table unavailable: {}", label, e);
                Vec::new()
            }
        }
    }

    fn serial_device(&self, row: SerialPortRow) -> Option<SystemScaleDevice> {
        let address = row.device_id.unwrap_or_default();
        let name = row
            .name
            .clone()
            .or_else(|| row.description.clone())
            .unwrap_or_else(|| address.clone());
        if name.is_empty() && address.is_empty() {
            return None;
        }

        let pnp = row.pnp_device_id.unwrap_or_default().to_uppercase();
        let connection_kind = if pnp.starts_with("USB\\") || pnp.starts_with("FTDIBUS\\") {
            ConnectionKind::Usb
        } else {
            ConnectionKind::Serial
        };

        let vendor_hint = self
            .vendors
            .match_any(
                [Some(name.as_str()), row.description.as_deref()]
                    .into_iter()
                    .flatten(),
            )
            .map(str::to_string);

        Some(SystemScaleDevice {
            name,
            address,
            vendor_hint,
            model_hint: row.description,
            connection_kind,
        })
    }

    fn pnp_device(&self, row: PnpDeviceRow, kind: ConnectionKind) -> Option<SystemScaleDevice> {
        let address = row.instance_id.unwrap_or_default();
        let name = row.friendly_name.unwrap_or_else(|| address.clone());
        if name.is_empty() {
            return None;
        }

        let vendor_hint = self
            .vendors
            .match_any(
                [Some(name.as_str()), row.manufacturer.as_deref()]
                    .into_iter()
                    .flatten(),
            )
            .map(str::to_string);

        Some(SystemScaleDevice {
            model_hint: Some(name.clone()),
            name,
            address,
            vendor_hint,
            connection_kind: kind,
        })
    }
}

#[async_trait]
impl DeviceDiscovery for WindowsDiscovery {
    async fn discover(&self) -> Vec<SystemScaleDevice> {
        let serial: Vec<SerialPortRow> = self.table("Serial port", SERIAL_QUERY).await;
        let bluetooth: Vec<PnpDeviceRow> = self.table("Bluetooth", BLUETOOTH_QUERY).await;
        let hid: Vec<PnpDeviceRow> = self.table("HID", HID_QUERY).await;

        let mut devices: Vec<SystemScaleDevice> = serial
            .into_iter()
            .filter_map(|row| self.serial_device(row))
            .collect();
        devices.extend(
            bluetooth
                .into_iter()
                .filter_map(|row| self.pnp_device(row, ConnectionKind::Bluetooth)),
        );
        devices.extend(
            hid.into_iter()
                .filter_map(|row| self.pnp_device(row, ConnectionKind::Hid)),
        );

        log_devices(&devices);
        devices
    }
}
