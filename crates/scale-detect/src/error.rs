//! Error types for scale detection and serial reads

use scale_protocol::ErrorCode;
use thiserror::Error;

/// Errors from OS queries (discovery, facility checks, external commands)
#[derive(Debug, Error)]
pub enum DetectError {
    /// Failed to enumerate devices
    #[error("failed to enumerate devices: {0}")]
    EnumerationFailed(String),

    /// External program is not installed or not on PATH
    #[error("{0} is not available on this host")]
    ToolUnavailable(String),

    /// External program ran but reported failure
    #[error("{program} failed: {reason}")]
    CommandFailed { program: String, reason: String },

    /// External program did not finish in time
    #[error("{program} did not finish within {timeout_ms}ms")]
    CommandTimeout { program: String, timeout_ms: u64 },

    /// Management query output could not be decoded
    #[error("unparsable output: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port error
    #[error("serial port error: {0}")]
    SerialPort(#[from] serialport::Error),
}

/// Failures of a single endpoint read
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// The address does not exist on this host
    #[error("port {port} not found")]
    NotFound { port: String },

    /// The OS rejected the open
    #[error("permission denied opening {port}")]
    PermissionDenied { port: String },

    /// No data before the deadline
    #[error("no data from {port} within {timeout_ms}ms")]
    Timeout { port: String, timeout_ms: u64 },

    /// Any other transport error
    #[error("I/O error on {port}: {reason}")]
    Io { port: String, reason: String },
}

impl ReadError {
    /// Stable code handed to callers
    pub fn code(&self) -> ErrorCode {
        match self {
            ReadError::NotFound { .. } => ErrorCode::NotFound,
            ReadError::PermissionDenied { .. } => ErrorCode::PermissionDenied,
            ReadError::Timeout { .. } => ErrorCode::Timeout,
            ReadError::Io { .. } => ErrorCode::IoError,
        }
    }

    /// Classify a failure to open a serial port
    pub fn from_open_error(port: &str, err: &serialport::Error) -> Self {
        use serialport::ErrorKind;
        use std::io::ErrorKind as IoKind;

        let port = port.to_string();
        match err.kind() {
            ErrorKind::Io(IoKind::NotFound) => ReadError::NotFound { port },
            ErrorKind::Io(IoKind::PermissionDenied) => ReadError::PermissionDenied { port },
            ErrorKind::NoDevice => {
                let desc = err.description.to_lowercase();
                if desc.contains("denied") || desc.contains("permission") {
                    ReadError::PermissionDenied { port }
                } else if desc.contains("busy") {
                    ReadError::Io {
                        port,
                        reason: err.description.clone(),
                    }
                } else {
                    ReadError::NotFound { port }
                }
            }
            _ => ReadError::Io {
                port,
                reason: err.description.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_error_classification() {
        let missing = serialport::Error::new(
            serialport::ErrorKind::Io(std::io::ErrorKind::NotFound),
            "No such file or directory",
        );
        assert_eq!(
            ReadError::from_open_error("/dev/ttyUSB9", &missing).code(),
            ErrorCode::NotFound
        );

        let denied = serialport::Error::new(
            serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied),
            "Permission denied",
        );
        assert_eq!(
            ReadError::from_open_error("/dev/ttyS0", &denied).code(),
            ErrorCode::PermissionDenied
        );

        let no_device = serialport::Error::new(serialport::ErrorKind::NoDevice, "Device not found");
        assert_eq!(
            ReadError::from_open_error("COM9", &no_device).code(),
            ErrorCode::NotFound
        );

        let busy = serialport::Error::new(serialport::ErrorKind::NoDevice, "Device or resource busy");
        assert_eq!(
            ReadError::from_open_error("COM3", &busy).code(),
            ErrorCode::IoError
        );
    }
}
