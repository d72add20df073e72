//! OS driver facility checks
//!
//! A scale needs the host's serial and HID driver stacks before any port can
//! be opened. These checks describe the platform, not a particular scale.
//! Installing a facility that needs elevated privileges without having them
//! is reported as a failure with an explanation, never silently skipped.

mod linux;
mod macos;
mod windows;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::platform::Platform;
use crate::runner::{CommandRunner, SystemCommandRunner};

pub use linux::LinuxFacilities;
pub use macos::MacFacilities;
pub use windows::WindowsFacilities;

/// State of one OS facility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverFacilityStatus {
    pub name: String,
    pub installed: bool,
    pub compatible: bool,
    pub notes: Option<String>,
}

impl DriverFacilityStatus {
    pub fn new(name: impl Into<String>, installed: bool, compatible: bool) -> Self {
        Self {
            name: name.into(),
            installed,
            compatible,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Installed and usable
    pub fn is_ready(&self) -> bool {
        self.installed && self.compatible
    }
}

/// Outcome of an install attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReport {
    pub success: bool,
    pub message: String,
    pub errors: Vec<String>,
}

impl InstallReport {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn failed(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors,
        }
    }

    /// The caller must rerun with administrator/root rights
    pub fn requires_privilege(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::failed(
            message.clone(),
            vec![format!("FacilityInstallRequiresPrivilege: {}", message)],
        )
    }
}

/// One platform family's facility checks
#[async_trait]
pub trait FacilityChecker: Send + Sync {
    /// Report each relevant facility
    async fn check(&self) -> Vec<DriverFacilityStatus>;

    /// Try to enable missing facilities
    async fn install(&self) -> InstallReport;
}

/// Facility checker for platforms with no known strategy
pub struct UnsupportedFacilities {
    platform: Platform,
}

#[async_trait]
impl FacilityChecker for UnsupportedFacilities {
    async fn check(&self) -> Vec<DriverFacilityStatus> {
        ["serial", "hid"]
            .into_iter()
            .map(|name| {
                DriverFacilityStatus::new(name, false, false)
                    .with_notes(format!("no driver checks for {}", self.platform))
            })
            .collect()
    }

    async fn install(&self) -> InstallReport {
        InstallReport::failed(
            format!("Driver installation is not supported on {}", self.platform),
            Vec::new(),
        )
    }
}

/// Build the facility checker for a platform
pub fn for_platform(platform: Platform, runner: Arc<dyn CommandRunner>) -> Box<dyn FacilityChecker> {
    match platform {
        Platform::Linux => Box::new(LinuxFacilities::new(runner)),
        Platform::MacOs => Box::new(MacFacilities),
        Platform::Windows => Box::new(WindowsFacilities::new(runner)),
        Platform::Other => Box::new(UnsupportedFacilities { platform }),
    }
}

/// Check facilities on the current host
pub async fn check_facilities() -> Vec<DriverFacilityStatus> {
    for_platform(Platform::current(), Arc::new(SystemCommandRunner::new()))
        .check()
        .await
}

/// Try to enable missing facilities on the current host
pub async fn install_facilities() -> InstallReport {
    for_platform(Platform::current(), Arc::new(SystemCommandRunner::new()))
        .install()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::FakeRunner;

    #[test]
    fn test_requires_privilege_report() {
        let report = InstallReport::requires_privilege("run as root");
        assert!(!report.success);
        assert_eq!(report.message, "run as root");
        assert!(report.errors[0].starts_with("FacilityInstallRequiresPrivilege"));
    }

    #[tokio::test]
    async fn test_unsupported_platform() {
        let checker = for_platform(Platform::Other, Arc::new(FakeRunner::new()));
        let statuses = checker.check().await;
        assert_eq!(statuses.len(), 2);
        assert!(statuses.iter().all(|s| !s.is_ready()));
        assert!(!checker.install().await.success);
    }

    #[test]
    fn test_status_json_shape() {
        let status = DriverFacilityStatus::new("serial", true, false).with_notes("no devices");
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["installed"], true);
        assert_eq!(json["compatible"], false);
        assert_eq!(json["notes"], "no devices");
    }
}
