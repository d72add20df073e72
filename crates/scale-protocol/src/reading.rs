//! Weight read results as returned to callers

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::weight::WeightFrame;

/// Stable failure codes carried in [`WeightReadResult::error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The endpoint address does not exist on this host
    NotFound,
    /// The OS refused to open the endpoint
    PermissionDenied,
    /// No data arrived before the deadline
    Timeout,
    /// Any other transport failure
    IoError,
    /// Data arrived but no weight could be extracted
    Unrecognized,
    /// Another read on the same endpoint is in flight
    Busy,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "not_found",
            ErrorCode::PermissionDenied => "permission_denied",
            ErrorCode::Timeout => "timeout",
            ErrorCode::IoError => "io_error",
            ErrorCode::Unrecognized => "unrecognized",
            ErrorCode::Busy => "busy",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single weight read
///
/// Either `success` with a `weight`, or a failure with an `error` code and a
/// human-readable `message`. `raw` holds whatever the device sent, for
/// diagnostics, even when it could not be interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightReadResult {
    pub success: bool,
    pub weight: Option<f64>,
    pub raw: Option<String>,
    pub error: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<WeightFrame>,
}

impl WeightReadResult {
    /// Successful read
    pub fn weighed(raw: impl Into<String>, frame: WeightFrame) -> Self {
        Self {
            success: true,
            weight: Some(frame.value),
            raw: Some(raw.into()),
            error: None,
            message: None,
            frame: Some(frame),
        }
    }

    /// Bytes arrived but the parser could not interpret them
    pub fn unrecognized(raw: impl Into<String>) -> Self {
        Self {
            success: false,
            weight: None,
            raw: Some(raw.into()),
            error: Some(ErrorCode::Unrecognized),
            message: Some("could not interpret weight data".to_string()),
            frame: None,
        }
    }

    /// The read itself failed
    pub fn failed(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            weight: None,
            raw: None,
            error: Some(code),
            message: Some(message.into()),
            frame: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_weight;

    #[test]
    fn test_weighed_result() {
        let frame = parse_weight("0.530 kg").unwrap();
        let result = WeightReadResult::weighed("0.530 kg", frame);
        assert!(result.success);
        assert_eq!(result.weight, Some(0.53));
        assert_eq!(result.error, None);
    }

    #[test]
    fn test_failure_serializes_code() {
        let result = WeightReadResult::failed(ErrorCode::NotFound, "no such port");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "not_found");
        assert_eq!(json["message"], "no such port");
        assert!(json.get("frame").is_none());
    }

    #[test]
    fn test_code_strings_match_serde() {
        for code in [
            ErrorCode::NotFound,
            ErrorCode::PermissionDenied,
            ErrorCode::Timeout,
            ErrorCode::IoError,
            ErrorCode::Unrecognized,
            ErrorCode::Busy,
        ] {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, code.as_str());
        }
    }
}
