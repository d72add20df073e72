//! Host platform family

use std::fmt;

use serde::{Deserialize, Serialize};

/// Platform family, decides which discovery and facility strategy is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
    /// Other Unix-like systems (BSDs)
    Other,
}

impl Platform {
    /// Platform this binary was built for
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "linux") || cfg!(target_os = "android") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Other
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::Other => "other",
        }
    }

    /// Device-file prefixes used by USB-serial drivers on this platform
    pub fn serial_device_prefixes(&self) -> &'static [&'static str] {
        match self {
            Platform::Linux => &["ttyUSB", "ttyACM"],
            Platform::MacOs => &["tty.usbserial", "tty.usbmodem", "cu.usbserial", "cu.usbmodem"],
            Platform::Other => &["ttyU", "cuaU"],
            Platform::Windows => &[],
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_platform_has_strategy() {
        let platform = Platform::current();
        if platform != Platform::Windows {
            assert!(!platform.serial_device_prefixes().is_empty());
        }
    }
}
