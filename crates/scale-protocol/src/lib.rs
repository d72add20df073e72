//! Scale Protocol Library
//!
//! This crate turns raw telemetry emitted by retail weighing scales into a
//! normalized numeric reading, and holds the data model shared by the rest
//! of the workspace:
//!
//! - **Weight frames**: layered heuristic parser for undocumented vendor
//!   formats (`0.530 kg`, `ST,GS,  0.530 kg`, `P 001,250 ...`)
//! - **Vendors**: ordered, case-insensitive brand table used to guess the
//!   manufacturer from free-text device descriptions
//! - **Devices and readings**: discovery descriptors and read results as they
//!   are handed to callers
//!
//! # Example
//!
//! ```rust
//! use scale_protocol::{parse_weight, FrameFormat};
//!
//! let frame = parse_weight("ST,GS,  0.530 kg").unwrap();
//! assert_eq!(frame.value, 0.53);
//! assert_eq!(frame.format, FrameFormat::StatusPrefixed);
//!
//! assert!(parse_weight("garbage-no-numbers").is_err());
//! ```

pub mod device;
pub mod error;
pub mod reading;
pub mod vendors;
pub mod weight;

pub use device::{ConnectionKind, SystemScaleDevice};
pub use error::ParseError;
pub use reading::{ErrorCode, WeightReadResult};
pub use vendors::{VendorEntry, VendorTable};
pub use weight::{parse_weight, FrameFormat, WeightFrame, WeightUnit};
