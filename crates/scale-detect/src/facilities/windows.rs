//! Windows facilities: PnP device classes
//!
//! Serial and HID support are PnP classes (`Ports`, `HIDClass`). A class is
//! considered installed when PowerShell can query it, and compatible when at
//! least one present device uses it. Rescanning drivers needs an elevated
//! session.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{DriverFacilityStatus, FacilityChecker, InstallReport};
use crate::runner::CommandRunner;

const POWERSHELL: &str = "powershell";

/// Facility name and PnP class
const CLASSES: &[(&str, &str)] = &[("serial (Ports)", "Ports"), ("hid (HIDClass)", "HIDClass")];

pub struct WindowsFacilities {
    runner: Arc<dyn CommandRunner>,
}

impl WindowsFacilities {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    async fn present_devices(&self, class: &str) -> Result<usize, String> {
        let script = format!(
            "(Get-PnpDevice -Class {} -PresentOnly -ErrorAction SilentlyContinue | Measure-Object).Count",
            class
        );
        let output = self
            .runner
            .run(POWERSHELL, &["-NoProfile", "-NonInteractive", "-Command", &script])
            .await
            .and_then(|out| out.into_result(POWERSHELL))
            .map_err(|e| e.to_string())?;

        output
            .stdout
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("unexpected device count {:?}", output.stdout.trim()))
    }

    /// `net session` only succeeds in an elevated session
    async fn is_elevated(&self) -> bool {
        match self.runner.run("net", &["session"]).await {
            Ok(out) => out.success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl FacilityChecker for WindowsFacilities {
    async fn check(&self) -> Vec<DriverFacilityStatus> {
        let mut statuses = Vec::with_capacity(CLASSES.len());
        for (name, class) in CLASSES {
            let status = match self.present_devices(class).await {
                Ok(0) => DriverFacilityStatus::new(*name, true, false)
                    .with_notes(format!("no present {} devices", class)),
                Ok(n) => DriverFacilityStatus::new(*name, true, true)
                    .with_notes(format!("{} present device(s)", n)),
                Err(e) => {
                    warn!("Could not query {} class: {}", class, e);
                    DriverFacilityStatus::new(*name, false, false).with_notes(e)
                }
            };
            statuses.push(status);
        }
        statuses
    }

    async fn install(&self) -> InstallReport {
        if !self.is_elevated().await {
            return InstallReport::requires_privilege(
                "Rescanning device drivers requires an Administrator session",
            );
        }

        let result = self
            .runner
            .run("pnputil", &["/scan-devices"])
            .await
            .and_then(|out| out.into_result("pnputil"));
        match result {
            Ok(_) => {
                info!("Device driver rescan completed");
                InstallReport::ok("Device drivers rescanned")
            }
            Err(e) => InstallReport::failed("Device driver rescan failed", vec![e.to_string()]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::FakeRunner;

    #[tokio::test]
    async fn test_check_counts_devices() {
        let runner = FakeRunner::new()
            .ok(POWERSHELL, "-Class Ports", "2\r\n")
            .ok(POWERSHELL, "-Class HIDClass", "0\r\n");
        let statuses = WindowsFacilities::new(Arc::new(runner)).check().await;

        assert!(statuses[0].is_ready());
        assert!(statuses[1].installed);
        assert!(!statuses[1].compatible);
    }

    #[tokio::test]
    async fn test_check_without_powershell() {
        let runner = FakeRunner::new().missing(POWERSHELL);
        let statuses = WindowsFacilities::new(Arc::new(runner)).check().await;

        assert_eq!(statuses.len(), 2);
        assert!(statuses.iter().all(|s| !s.installed));
    }

    #[tokio::test]
    async fn test_install_needs_elevation() {
        let runner = Arc::new(FakeRunner::new().exit("net", "session", 2, "Access is denied."));
        let report = WindowsFacilities::new(runner.clone()).install().await;

        assert!(!report.success);
        assert!(report.message.contains("Administrator"));
        assert_eq!(runner.call_count("pnputil"), 0);
    }

    #[tokio::test]
    async fn test_install_elevated_rescans() {
        let runner = Arc::new(
            FakeRunner::new()
                .ok("net", "session", "There are no entries in the list.")
                .ok("pnputil", "/scan-devices", "Scanning for device hardware changes..."),
        );
        let report = WindowsFacilities::new(runner.clone()).install().await;

        assert!(report.success);
        assert_eq!(runner.call_count("pnputil"), 1);
    }
}
