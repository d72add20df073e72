//! USB Vendor/Product ID database for common USB-serial bridges
//!
//! Retail scales rarely carry their own USB identity: the port almost always
//! belongs to a generic bridge chip inside the scale or its cable. Knowing
//! the chip still helps the operator tell ports apart when no brand name is
//! reported.

/// USB Vendor ID / Product ID pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbId {
    pub vid: u16,
    pub pid: u16,
}

impl UsbId {
    pub const fn new(vid: u16, pid: u16) -> Self {
        Self { vid, pid }
    }
}

/// FTDI (Future Technology Devices International)
pub mod ftdi {
    use super::UsbId;

    pub const VID: u16 = 0x0403;

    pub const FT232R: UsbId = UsbId::new(VID, 0x6001);
    pub const FT231X: UsbId = UsbId::new(VID, 0x6015);

    pub const ALL_PIDS: &[u16] = &[0x6001, 0x6010, 0x6011, 0x6014, 0x6015];
}

/// Silicon Labs CP210x
pub mod cp210x {
    use super::UsbId;

    pub const VID: u16 = 0x10C4;

    pub const CP2102: UsbId = UsbId::new(VID, 0xEA60);

    pub const ALL_PIDS: &[u16] = &[0xEA60, 0xEA70, 0xEA71];
}

/// WCH CH340/CH341
pub mod ch340 {
    use super::UsbId;

    pub const VID: u16 = 0x1A86;

    pub const CH340: UsbId = UsbId::new(VID, 0x7523);
    pub const CH341: UsbId = UsbId::new(VID, 0x5523);

    pub const ALL_PIDS: &[u16] = &[0x7523, 0x5523];
}

/// Prolific PL2303
pub mod prolific {
    use super::UsbId;

    pub const VID: u16 = 0x067B;

    pub const PL2303: UsbId = UsbId::new(VID, 0x2303);

    pub const ALL_PIDS: &[u16] = &[0x2303];
}

/// Check if a VID/PID is a known serial adapter
pub fn is_known_serial_adapter(vid: u16, pid: u16) -> bool {
    match vid {
        ftdi::VID => ftdi::ALL_PIDS.contains(&pid),
        cp210x::VID => cp210x::ALL_PIDS.contains(&pid),
        ch340::VID => ch340::ALL_PIDS.contains(&pid),
        prolific::VID => prolific::ALL_PIDS.contains(&pid),
        _ => false,
    }
}

/// Get adapter chip name from VID
pub fn adapter_name(vid: u16) -> Option<&'static str> {
    match vid {
        ftdi::VID => Some("FTDI"),
        cp210x::VID => Some("CP210x"),
        ch340::VID => Some("CH340"),
        prolific::VID => Some("PL2303"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_adapters() {
        assert!(is_known_serial_adapter(ch340::CH340.vid, ch340::CH340.pid));
        assert!(is_known_serial_adapter(ftdi::FT232R.vid, ftdi::FT232R.pid));
        assert!(!is_known_serial_adapter(0x1234, 0x5678));
    }

    #[test]
    fn test_adapter_name() {
        assert_eq!(adapter_name(prolific::PL2303.vid), Some("PL2303"));
        assert_eq!(adapter_name(cp210x::CP2102.vid), Some("CP210x"));
        assert_eq!(adapter_name(0x0C26), None);
    }
}
