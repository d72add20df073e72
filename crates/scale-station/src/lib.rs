//! Scale Station
//!
//! The entry points a request layer calls to work with weighing scales:
//!
//! - discover candidate devices and check the host's driver facilities
//! - read one weight from an endpoint, with at most one read in flight per
//!   endpoint
//! - test a registered scale and hand its new connection state back to the
//!   [`ScaleRegistry`]
//!
//! # Example
//!
//! ```rust,no_run
//! use scale_station::{InMemoryRegistry, ScaleRecord, ScaleStation};
//!
//! # async fn demo() -> Result<(), scale_station::StationError> {
//! let registry = InMemoryRegistry::with_records([ScaleRecord::new("s1", "Balcão", "/dev/ttyUSB0")]);
//! let station = ScaleStation::new(registry);
//!
//! let status = station.test_scale("s1").await?;
//! println!("connected: {}", status.is_connected);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod locks;
pub mod registry;
pub mod station;

pub use error::StationError;
pub use locks::{EndpointGuard, EndpointLocks};
pub use registry::{InMemoryRegistry, ScaleRecord, ScaleRegistry};
pub use station::{ScaleStation, ScaleStatus};
