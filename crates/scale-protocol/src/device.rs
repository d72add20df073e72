//! Discovered device descriptors

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a discovered device is attached to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    Usb,
    Serial,
    Bluetooth,
    Hid,
}

impl ConnectionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionKind::Usb => "usb",
            ConnectionKind::Serial => "serial",
            ConnectionKind::Bluetooth => "bluetooth",
            ConnectionKind::Hid => "hid",
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A candidate scale visible to the host OS
///
/// Built fresh on every discovery call and never persisted. The address is
/// the only reliable discriminator: several ports may share a friendly name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemScaleDevice {
    /// Free-text descriptor (friendly name, or the path on POSIX)
    pub name: String,
    /// Port or bus path, empty when the OS exposes none
    pub address: String,
    /// Brand guessed from the description
    pub vendor_hint: Option<String>,
    /// Raw model/product descriptor
    pub model_hint: Option<String>,
    pub connection_kind: ConnectionKind,
}

impl SystemScaleDevice {
    /// A serial device with no metadata beyond its path
    pub fn serial(address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            name: address.clone(),
            address,
            vendor_hint: None,
            model_hint: None,
            connection_kind: ConnectionKind::Serial,
        }
    }

    /// Label for listings: "COM3 - USB-SERIAL CH340 [Toledo]"
    pub fn display_label(&self) -> String {
        let mut label = if self.address.is_empty() || self.address == self.name {
            self.name.clone()
        } else {
            format!("{} - {}", self.address, self.name)
        };
        if let Some(vendor) = &self.vendor_hint {
            label.push_str(&format!(" [{}]", vendor));
        }
        label
    }
}
