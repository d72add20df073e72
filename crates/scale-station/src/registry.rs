//! Registered scales and where their status is kept
//!
//! The station never creates or deletes scales. It looks a record up by id
//! and hands back the new connection state for the registry to persist.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StationError;

/// A scale as known to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleRecord {
    pub id: String,
    pub name: String,
    /// Serial address of the scale; one physical endpoint per record
    pub connection_info: String,
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub is_connected: bool,
    #[serde(default)]
    pub last_status_check: Option<DateTime<Utc>>,
}

impl ScaleRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, connection_info: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            connection_info: connection_info.into(),
            tenant_id: None,
            is_connected: false,
            last_status_check: None,
        }
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }
}

/// Store of registered scales
#[async_trait]
pub trait ScaleRegistry: Send + Sync {
    /// Find a scale by id
    async fn lookup(&self, scale_id: &str) -> Result<Option<ScaleRecord>, StationError>;

    /// Persist the outcome of a status test
    async fn record_status(
        &self,
        scale_id: &str,
        is_connected: bool,
        last_status_check: DateTime<Utc>,
    ) -> Result<(), StationError>;
}

/// Registry held in memory
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    records: Mutex<HashMap<String, ScaleRecord>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = ScaleRecord>) -> Self {
        let registry = Self::new();
        for record in records {
            registry.insert(record);
        }
        registry
    }

    /// Add or replace a record
    pub fn insert(&self, record: ScaleRecord) {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.insert(record.id.clone(), record);
    }

    /// Snapshot of every record, sorted by id
    pub fn records(&self) -> Vec<ScaleRecord> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<_> = records.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}

#[async_trait]
impl ScaleRegistry for InMemoryRegistry {
    async fn lookup(&self, scale_id: &str) -> Result<Option<ScaleRecord>, StationError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(scale_id).cloned())
    }

    async fn record_status(
        &self,
        scale_id: &str,
        is_connected: bool,
        last_status_check: DateTime<Utc>,
    ) -> Result<(), StationError> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let record = records
            .get_mut(scale_id)
            .ok_or_else(|| StationError::ScaleNotFound(scale_id.to_string()))?;
        record.is_connected = is_connected;
        record.last_status_check = Some(last_status_check);
        Ok(())
    }
}
