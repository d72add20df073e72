//! Scale Simulation Library
//!
//! Virtual scales that speak the frame layouts seen on real retail scales,
//! for exercising serial reads and weight parsing without hardware:
//!
//! - **VirtualScale**: holds a weight and encodes it as a vendor-style frame
//! - **run_virtual_scale_task**: serves frames over any async byte stream,
//!   either continuously or only when polled
//!
//! # Example
//!
//! ```rust
//! use scale_sim::{SimFormat, VirtualScale};
//!
//! let mut scale = VirtualScale::new("Balcão", SimFormat::StatusPrefixed);
//! scale.set_weight(0.53);
//!
//! let frame = scale.encode_frame().unwrap();
//! assert_eq!(frame, b"ST,GS,   0.530 kg\r\n");
//! ```

pub mod scale;
pub mod task;

pub use scale::{SimFormat, VirtualScale, VirtualScaleConfig};
pub use task::{run_virtual_scale_task, EmitMode, ScaleCommand, ENQ};
