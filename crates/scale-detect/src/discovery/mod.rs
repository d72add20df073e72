//! Scale device discovery
//!
//! Discovery is best effort: each platform strategy returns whatever it could
//! see, and an enumeration failure yields an empty list instead of an error.
//! The strategy is picked once from the host [`Platform`].

mod posix;
mod windows;

use std::sync::Arc;

use async_trait::async_trait;
use scale_protocol::{SystemScaleDevice, VendorTable};
use tracing::info;

use crate::platform::Platform;
use crate::runner::{CommandRunner, SystemCommandRunner};

pub use posix::{PosixDiscovery, UsbMetadata};
pub use windows::WindowsDiscovery;

/// One platform family's way of listing candidate scales
#[async_trait]
pub trait DeviceDiscovery: Send + Sync {
    /// Devices currently visible; empty when the OS could not be queried
    async fn discover(&self) -> Vec<SystemScaleDevice>;
}

/// Build the discovery strategy for a platform
pub fn for_platform(
    platform: Platform,
    runner: Arc<dyn CommandRunner>,
    vendors: VendorTable,
) -> Box<dyn DeviceDiscovery> {
    match platform {
        Platform::Windows => Box::new(WindowsDiscovery::new(runner, vendors)),
        Platform::Linux | Platform::MacOs | Platform::Other => {
            Box::new(PosixDiscovery::new(platform, vendors))
        }
    }
}

/// Discover devices on the current host with the built-in vendor table
pub async fn discover() -> Vec<SystemScaleDevice> {
    for_platform(
        Platform::current(),
        Arc::new(SystemCommandRunner::new()),
        VendorTable::default(),
    )
    .discover()
    .await
}

pub(crate) fn log_devices(devices: &[SystemScaleDevice]) {
    if devices.is_empty() {
        info!("No scale candidates found");
    } else {
        info!("Found {} scale candidate(s)", devices.len());
        for device in devices {
            info!("  {} ({})", device.display_label(), device.connection_kind);
        }
    }
}
