//! Persisted CLI settings

use std::path::{Path, PathBuf};

use scale_detect::ReadConfig;
use scale_protocol::{VendorEntry, VendorTable};
use scale_station::ScaleRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine settings path")]
    NoConfigDir,

    #[error("failed to access settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// CLI settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Baud rate for reads that do not name one
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Read deadline in milliseconds for reads that do not name one
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Brand fragments checked before the built-in table
    #[serde(default)]
    pub extra_vendors: Vec<VendorEntry>,
    /// Registered scales
    #[serde(default)]
    pub scales: Vec<ScaleRecord>,
}

fn default_baud_rate() -> u32 {
    scale_detect::serial::DEFAULT_BAUD_RATE
}

fn default_timeout_ms() -> u64 {
    scale_detect::serial::DEFAULT_TIMEOUT.as_millis() as u64
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
            extra_vendors: Vec::new(),
            scales: Vec::new(),
        }
    }
}

impl Settings {
    /// Uses $XDG_CONFIG_HOME/scalehub, falls back to ~/.config/scalehub
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("scalehub"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("scalehub"))
    }

    /// Default settings file location
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        Self::config_dir()
            .map(|p| p.join("settings.json"))
            .ok_or(SettingsError::NoConfigDir)
    }

    /// Load settings, falling back to defaults when the file is missing or
    /// unreadable
    pub fn load_from(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&text) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring malformed settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Add a scale, replacing any registered under the same id
    pub fn register(&mut self, record: ScaleRecord) {
        match self.scales.iter_mut().find(|s| s.id == record.id) {
            Some(existing) => *existing = record,
            None => self.scales.push(record),
        }
    }

    pub fn scale(&self, scale_id: &str) -> Option<&ScaleRecord> {
        self.scales.iter().find(|s| s.id == scale_id)
    }

    pub fn scale_mut(&mut self, scale_id: &str) -> Option<&mut ScaleRecord> {
        self.scales.iter_mut().find(|s| s.id == scale_id)
    }

    pub fn vendor_table(&self) -> VendorTable {
        VendorTable::with_extra(self.extra_vendors.iter().cloned())
    }

    pub fn read_config(&self) -> ReadConfig {
        ReadConfig::with(Some(self.baud_rate), Some(self.timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.json"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.baud_rate, 9600);
        assert_eq!(settings.timeout_ms, 1200);
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"baudRate": 4800}"#).unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.baud_rate, 4800);
        assert_eq!(settings.timeout_ms, 1200);
        assert!(settings.scales.is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::default();
        settings.extra_vendors.push(VendorEntry::new("Acme", "Acme Balanças"));
        settings.register(ScaleRecord::new("s1", "Balcão", "/dev/ttyUSB0"));
        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut settings = Settings::default();
        settings.register(ScaleRecord::new("s1", "Balcão", "COM3"));
        settings.register(ScaleRecord::new("s1", "Balcão", "COM4"));

        assert_eq!(settings.scales.len(), 1);
        assert_eq!(settings.scale("s1").unwrap().connection_info, "COM4");
    }

    #[test]
    fn test_extra_vendors_take_precedence() {
        let mut settings = Settings::default();
        settings.extra_vendors.push(VendorEntry::new("toledo", "Toledo do Brasil"));

        let table = settings.vendor_table();
        assert_eq!(table.match_description("Toledo Prix 4"), Some("Toledo do Brasil"));
        assert_eq!(table.match_description("Filizola BP-15"), Some("Filizola"));
    }

    #[test]
    fn test_read_config_from_settings() {
        let settings = Settings {
            baud_rate: 2400,
            timeout_ms: 500,
            ..Settings::default()
        };
        let config = settings.read_config();
        assert_eq!(config.baud_rate, 2400);
        assert_eq!(config.timeout, Duration::from_millis(500));
    }
}
