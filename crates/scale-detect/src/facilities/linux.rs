//! Linux facilities: kernel driver modules under `/sys`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{DriverFacilityStatus, FacilityChecker, InstallReport};
use crate::runner::CommandRunner;

/// Facility name, kernel module, device class it provides
const MODULES: &[(&str, &str, &str)] = &[
    ("serial (usbserial)", "usbserial", "tty"),
    ("serial (cdc_acm)", "cdc_acm", "tty"),
    ("hid (usbhid)", "usbhid", "hidraw"),
];

pub struct LinuxFacilities {
    runner: Arc<dyn CommandRunner>,
    sys_root: PathBuf,
}

impl LinuxFacilities {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            sys_root: PathBuf::from("/sys"),
        }
    }

    /// Read module/class state from another sysfs root
    pub fn with_sys_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sys_root = root.into();
        self
    }

    async fn exists(path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn module_loaded(&self, module: &str) -> bool {
        Self::exists(&self.sys_root.join("module").join(module)).await
    }

    async fn is_root(&self) -> Result<bool, String> {
        let output = self
            .runner
            .run("id", &["-u"])
            .await
            .and_then(|out| out.into_result("id"))
            .map_err(|e| e.to_string())?;
        Ok(output.stdout.trim() == "0")
    }

    async fn missing_modules(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        for (_, module, _) in MODULES {
            if !self.module_loaded(module).await {
                missing.push(*module);
            }
        }
        missing
    }
}

#[async_trait]
impl FacilityChecker for LinuxFacilities {
    async fn check(&self) -> Vec<DriverFacilityStatus> {
        let mut statuses = Vec::with_capacity(MODULES.len());
        for (name, module, class) in MODULES {
            let installed = self.module_loaded(module).await;
            let compatible = Self::exists(&self.sys_root.join("class").join(class)).await;

            let mut status = DriverFacilityStatus::new(*name, installed, compatible);
            if !installed {
                status = status.with_notes(format!("kernel module {} is not loaded", module));
            } else if !compatible {
                status = status.with_notes(format!("no /sys/class/{} devices registered", class));
            }
            statuses.push(status);
        }
        statuses
    }

    async fn install(&self) -> InstallReport {
        let missing = self.missing_modules().await;
        if missing.is_empty() {
            return InstallReport::ok("All driver facilities are already available");
        }

        match self.is_root().await {
            Ok(true) => {}
            Ok(false) => {
                return InstallReport::requires_privilege(format!(
                    "Loading kernel modules ({}) requires root privileges",
                    missing.join(", ")
                ));
            }
            Err(e) => {
                return InstallReport::failed("Could not determine current privileges", vec![e]);
            }
        }

        let mut errors = Vec::new();
        for module in missing.iter().copied() {
            let result = self
                .runner
                .run("modprobe", &[module])
                .await
                .and_then(|out| out.into_result("modprobe"));
            match result {
                Ok(_) => info!("Loaded kernel module {}", module),
                Err(e) => {
                    warn!("Failed to load {}: {}", module, e);
                    errors.push(format!("{}: {}", module, e));
                }
            }
        }

        if errors.is_empty() {
            InstallReport::ok(format!("Loaded {}", missing.join(", ")))
        } else {
            InstallReport::failed("Some kernel modules could not be loaded", errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::FakeRunner;

    fn fake_sys(modules: &[&str], classes: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for m in modules {
            std::fs::create_dir_all(dir.path().join("module").join(m)).unwrap();
        }
        for c in classes {
            std::fs::create_dir_all(dir.path().join("class").join(c)).unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_check_reports_each_module() {
        let sys = fake_sys(&["usbserial", "usbhid"], &["tty"]);
        let checker = LinuxFacilities::new(Arc::new(FakeRunner::new())).with_sys_root(sys.path());

        let statuses = checker.check().await;
        assert_eq!(statuses.len(), 3);

        assert!(statuses[0].is_ready());
        assert!(!statuses[1].installed);
        assert!(statuses[1].notes.as_deref().unwrap().contains("cdc_acm"));
        assert!(statuses[2].installed);
        assert!(!statuses[2].compatible);
    }

    #[tokio::test]
    async fn test_install_noop_when_everything_loaded() {
        let sys = fake_sys(&["usbserial", "cdc_acm", "usbhid"], &["tty", "hidraw"]);
        let runner = Arc::new(FakeRunner::new());
        let checker = LinuxFacilities::new(runner.clone()).with_sys_root(sys.path());

        let report = checker.install().await;
        assert!(report.success);
        assert_eq!(runner.call_count("id"), 0);
    }

    #[tokio::test]
    async fn test_install_without_root_requires_privilege() {
        let sys = fake_sys(&["usbserial"], &["tty"]);
        let runner = Arc::new(FakeRunner::new().ok("id", "-u", "1000\n"));
        let checker = LinuxFacilities::new(runner.clone()).with_sys_root(sys.path());

        let report = checker.install().await;
        assert!(!report.success);
        assert!(report.message.contains("root"));
        assert!(report.message.contains("cdc_acm"));
        assert_eq!(runner.call_count("modprobe"), 0);
    }

    #[tokio::test]
    async fn test_install_as_root_runs_modprobe() {
        let sys = fake_sys(&["usbserial"], &["tty"]);
        let runner = Arc::new(
            FakeRunner::new()
                .ok("id", "-u", "0\n")
                .ok("modprobe", "cdc_acm", "")
                .exit("modprobe", "usbhid", 1, "modprobe: FATAL: Module usbhid not found"),
        );
        let checker = LinuxFacilities::new(runner.clone()).with_sys_root(sys.path());

        let report = checker.install().await;
        assert!(!report.success);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("usbhid"));
        assert_eq!(runner.call_count("modprobe"), 2);
    }
}
