//! Scale Detection Library
//!
//! This crate talks to the host OS on behalf of the scale integration:
//!
//! - **Discovery**: enumerate candidate scale devices, one strategy per
//!   platform family (Windows management queries, POSIX device files)
//! - **Serial**: one bounded-time read against a serial endpoint, with the
//!   port released on every exit path
//! - **Facilities**: report whether the serial/HID driver stack is usable and
//!   try to enable it
//!
//! External programs (PowerShell, `modprobe`, ...) are run through the
//! [`CommandRunner`] capability so every platform variant can be tested with
//! canned output.
//!
//! # Example
//!
//! ```rust,no_run
//! use scale_detect::{discovery, ReadConfig, SerialReader, EndpointReader};
//!
//! # async fn demo() {
//! for device in discovery::discover().await {
//!     println!("Found {}", device.display_label());
//! }
//!
//! let raw = SerialReader.read_raw("/dev/ttyUSB0", &ReadConfig::default()).await;
//! println!("{:?}", raw);
//! # }
//! ```

pub mod discovery;
pub mod error;
pub mod facilities;
pub mod platform;
pub mod runner;
pub mod serial;
pub mod usb_ids;

pub use discovery::{DeviceDiscovery, PosixDiscovery, WindowsDiscovery};
pub use error::{DetectError, ReadError};
pub use facilities::{DriverFacilityStatus, FacilityChecker, InstallReport};
pub use platform::Platform;
pub use runner::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use serial::{read_frame, EndpointReader, ReadConfig, SerialReader};
