//! The station: what the request layer calls
//!
//! Wires discovery, facility checks, the serial reader and the registry
//! together. Every operation returns a typed result; a scale that is
//! unplugged, silent or talking nonsense never turns into an error here.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use scale_detect::facilities::{self, DriverFacilityStatus, FacilityChecker, InstallReport};
use scale_detect::{
    discovery, CommandRunner, DeviceDiscovery, EndpointReader, Platform, ReadConfig, SerialReader,
    SystemCommandRunner,
};
use scale_protocol::{parse_weight, ErrorCode, SystemScaleDevice, VendorTable, WeightReadResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::StationError;
use crate::locks::EndpointLocks;
use crate::registry::ScaleRegistry;

/// Result of testing a registered scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleStatus {
    pub scale_id: String,
    pub is_connected: bool,
    pub last_status_check: DateTime<Utc>,
    pub reading: WeightReadResult,
}

/// Scale operations over one host
pub struct ScaleStation<R: ScaleRegistry> {
    registry: R,
    reader: Arc<dyn EndpointReader>,
    discovery: Box<dyn DeviceDiscovery>,
    facilities: Box<dyn FacilityChecker>,
    locks: EndpointLocks,
    read_defaults: ReadConfig,
}

impl<R: ScaleRegistry> ScaleStation<R> {
    /// Station for the current host with the built-in vendor table
    pub fn new(registry: R) -> Self {
        Self::for_host(registry, VendorTable::default())
    }

    /// Station for the current host with a custom vendor table
    pub fn for_host(registry: R, vendors: VendorTable) -> Self {
        let platform = Platform::current();
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner::new());
        Self {
            registry,
            reader: Arc::new(SerialReader),
            discovery: discovery::for_platform(platform, runner.clone(), vendors),
            facilities: facilities::for_platform(platform, runner),
            locks: EndpointLocks::new(),
            read_defaults: ReadConfig::default(),
        }
    }

    pub fn with_reader(mut self, reader: Arc<dyn EndpointReader>) -> Self {
        self.reader = reader;
        self
    }

    pub fn with_discovery(mut self, discovery: Box<dyn DeviceDiscovery>) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_facilities(mut self, facilities: Box<dyn FacilityChecker>) -> Self {
        self.facilities = facilities;
        self
    }

    /// Settings used when a read does not name its own baud rate or timeout
    pub fn with_read_defaults(mut self, config: ReadConfig) -> Self {
        self.read_defaults = config;
        self
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub async fn discover(&self) -> Vec<SystemScaleDevice> {
        self.discovery.discover().await
    }

    pub async fn check_facilities(&self) -> Vec<DriverFacilityStatus> {
        self.facilities.check().await
    }

    pub async fn install_facilities(&self) -> InstallReport {
        let report = self.facilities.install().await;
        if report.success {
            info!("Facility install: {}", report.message);
        } else {
            warn!("Facility install failed: {}", report.message);
        }
        report
    }

    /// Read and interpret one weight from `address`
    ///
    /// Fails fast with `busy` if another read on the same address is in
    /// flight.
    pub async fn read_weight(
        &self,
        address: &str,
        baud_rate: Option<u32>,
        timeout_ms: Option<u64>,
    ) -> WeightReadResult {
        let Some(_guard) = self.locks.try_acquire(address) else {
            warn!("Read on {} rejected: endpoint busy", address);
            return WeightReadResult::failed(
                ErrorCode::Busy,
                format!("a read on {} is already in progress", address),
            );
        };

        let config = self.read_defaults.clone().overridden(baud_rate, timeout_ms);
        match self.reader.read_raw(address, &config).await {
            Ok(raw) => match parse_weight(&raw) {
                Ok(frame) => {
                    debug!("{} weighed {}", address, frame);
                    WeightReadResult::weighed(raw, frame)
                }
                Err(e) => {
                    debug!("{}: {}", address, e);
                    WeightReadResult::unrecognized(raw)
                }
            },
            Err(e) => {
                warn!("Read on {} failed: {}", address, e);
                WeightReadResult::failed(e.code(), e.to_string())
            }
        }
    }

    /// Read a registered scale and record whether it answered
    ///
    /// The scale counts as connected when its endpoint delivered data, even
    /// data the parser could not interpret. A `busy` endpoint keeps the
    /// previous connection state. `lastStatusCheck` never moves backwards.
    pub async fn test_scale(&self, scale_id: &str) -> Result<ScaleStatus, StationError> {
        let record = self
            .registry
            .lookup(scale_id)
            .await?
            .ok_or_else(|| StationError::ScaleNotFound(scale_id.to_string()))?;

        let reading = self.read_weight(&record.connection_info, None, None).await;

        let is_connected = match reading.error {
            Some(ErrorCode::Busy) => record.is_connected,
            _ => reading.raw.is_some(),
        };
        let now = Utc::now();
        let last_status_check = match record.last_status_check {
            Some(previous) if previous > now => previous,
            _ => now,
        };

        self.registry
            .record_status(scale_id, is_connected, last_status_check)
            .await?;
        info!(
            "Scale {} ({}) tested: {}",
            record.name,
            record.connection_info,
            if is_connected { "connected" } else { "disconnected" }
        );

        Ok(ScaleStatus {
            scale_id: record.id,
            is_connected,
            last_status_check,
            reading,
        })
    }
}
