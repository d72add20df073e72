//! macOS facilities
//!
//! CDC-ACM serial and HID drivers ship with the OS, so there is nothing to
//! enable. Bridge chips with vendor drivers (CH340 on older releases) still
//! show up as ports once the vendor package is installed by hand.

use async_trait::async_trait;

use super::{DriverFacilityStatus, FacilityChecker, InstallReport};

pub struct MacFacilities;

#[async_trait]
impl FacilityChecker for MacFacilities {
    async fn check(&self) -> Vec<DriverFacilityStatus> {
        vec![
            DriverFacilityStatus::new("serial (AppleUSBCDC)", true, true)
                .with_notes("built into macOS"),
            DriverFacilityStatus::new("hid (IOHIDFamily)", true, true)
                .with_notes("built into macOS"),
        ]
    }

    async fn install(&self) -> InstallReport {
        InstallReport::ok("Serial and HID drivers are built into macOS")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builtin_drivers() {
        let statuses = MacFacilities.check().await;
        assert!(statuses.iter().all(|s| s.is_ready()));
        assert!(MacFacilities.install().await.success);
    }
}
