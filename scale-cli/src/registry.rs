//! Scale registry kept in the settings file

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scale_station::{ScaleRecord, ScaleRegistry, StationError};
use tokio::sync::Mutex;

use crate::settings::Settings;

/// Registered scales read from and written back to `settings.json`
pub struct FileRegistry {
    path: PathBuf,
    settings: Mutex<Settings>,
}

impl FileRegistry {
    pub fn new(path: PathBuf, settings: Settings) -> Self {
        Self {
            path,
            settings: Mutex::new(settings),
        }
    }
}

#[async_trait]
impl ScaleRegistry for FileRegistry {
    async fn lookup(&self, scale_id: &str) -> Result<Option<ScaleRecord>, StationError> {
        Ok(self.settings.lock().await.scale(scale_id).cloned())
    }

    async fn record_status(
        &self,
        scale_id: &str,
        is_connected: bool,
        last_status_check: DateTime<Utc>,
    ) -> Result<(), StationError> {
        let mut settings = self.settings.lock().await;
        let record = settings
            .scale_mut(scale_id)
            .ok_or_else(|| StationError::ScaleNotFound(scale_id.to_string()))?;
        record.is_connected = is_connected;
        record.last_status_check = Some(last_status_check);

        settings
            .save_to(&self.path)
            .map_err(|e| StationError::Registry(e.to_string()))
    }
}
