//! Weight frame parser
//!
//! Scales attached over serial emit short ASCII frames, and almost no vendor
//! documents the layout. Three patterns are tried in this order (first match
//! wins):
//!
//! 1. the first signed number with 2-3 decimals, optionally followed by a
//!    unit: `0.530 kg`, `0,250kg`, `W -0.530kg`, `ST,GS,  0.530 kg`
//! 2. 2-letter markers delimited by `,`/`;` followed by a number with any
//!    number of decimals: `US;NT; 1,2`
//! 3. the first `d.dd`/`ddd,ddd` style decimal anywhere in the text
//!
//! A read often captures several frames back to back; the first one is the
//! reading. Comma decimal separators are normalized to `.` before
//! conversion. When nothing matches the parser reports the frame as
//! unrecognized; it never guesses a value.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ParseError;

/// First number with 2-3 decimals, optionally followed by a unit.
static FRAMED_DECIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([+-]?\d+[.,]\d{2,3})\s*((?i:kg|g)\b)?").expect("Invalid framed decimal regex")
});

/// Two-letter status markers delimited by `,`/`;`, then the value.
static STATUS_FRAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\s\x02]*((?:[A-Z]{2}\s*[,;]\s*)+)([+-]?\d+[.,]\d+)\s*((?i:kg|g)\b)?")
        .expect("Invalid status frame regex")
});

/// Text before a value that consists only of status markers.
static STATUS_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\s\x02\x03]*((?:[A-Z]{2}\s*[,;]\s*)+)$").expect("Invalid status prefix regex")
});

/// Any 1-3 digit integer part with a 2-3 digit fraction.
static EMBEDDED_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,3}[.,]\d{2,3}").expect("Invalid embedded decimal regex"));

/// Layout around the value in the frame it was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameFormat {
    /// Value first in the frame, optionally with unit
    Plain,
    /// Status markers followed by the value
    StatusPrefixed,
    /// Value preceded by other text
    Embedded,
}

impl FrameFormat {
    /// Returns a human-readable name for the frame layout
    pub fn name(&self) -> &'static str {
        match self {
            FrameFormat::Plain => "plain",
            FrameFormat::StatusPrefixed => "status-prefixed",
            FrameFormat::Embedded => "embedded",
        }
    }
}

/// Unit token that followed the value, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Kilograms,
    Grams,
}

impl WeightUnit {
    fn from_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("kg") {
            Some(WeightUnit::Kilograms)
        } else if token.eq_ignore_ascii_case("g") {
            Some(WeightUnit::Grams)
        } else {
            None
        }
    }

    /// Unit symbol as printed by scales
    pub fn symbol(&self) -> &'static str {
        match self {
            WeightUnit::Kilograms => "kg",
            WeightUnit::Grams => "g",
        }
    }
}

/// A successfully interpreted weight frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightFrame {
    /// Numeric value exactly as transmitted (units are not converted)
    pub value: f64,
    /// Unit token following the value
    pub unit: Option<WeightUnit>,
    /// What preceded the value
    pub format: FrameFormat,
    /// Status markers from status-prefixed frames, in order (e.g. `["ST", "GS"]`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<String>,
}

impl fmt::Display for WeightFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            Some(unit) => write!(f, "{} {}", self.value, unit.symbol()),
            None => write!(f, "{}", self.value),
        }
    }
}

/// Extract a weight value from a raw scale payload
pub fn parse_weight(raw: &str) -> Result<WeightFrame, ParseError> {
    if let Some(caps) = FRAMED_DECIMAL.captures(raw) {
        trace!("Framed decimal match: {:?}", &caps[0]);
        let start = caps.get(0).map_or(0, |m| m.start());
        let (format, status) = classify_prefix(&raw[..start]);
        return Ok(WeightFrame {
            value: to_number(&caps[1])?,
            unit: caps.get(2).and_then(|m| WeightUnit::from_token(m.as_str())),
            format,
            status,
        });
    }

    if let Some(caps) = STATUS_FRAME.captures(raw) {
        trace!("Status frame match: {:?}", &caps[0]);
        return Ok(WeightFrame {
            value: to_number(&caps[2])?,
            unit: caps.get(3).and_then(|m| WeightUnit::from_token(m.as_str())),
            format: FrameFormat::StatusPrefixed,
            status: status_markers(&caps[1]),
        });
    }

    if let Some(m) = EMBEDDED_DECIMAL.find(raw) {
        trace!("Embedded decimal match: {:?}", m.as_str());
        return Ok(WeightFrame {
            value: to_number(m.as_str())?,
            unit: None,
            format: FrameFormat::Embedded,
            status: Vec::new(),
        });
    }

    Err(ParseError::Unrecognized(raw.to_string()))
}

/// Describe the text that came before a matched value
fn classify_prefix(prefix: &str) -> (FrameFormat, Vec<String>) {
    if prefix
        .chars()
        .all(|c| c.is_whitespace() || c == '\x02' || c == '\x03')
    {
        return (FrameFormat::Plain, Vec::new());
    }
    match STATUS_PREFIX.captures(prefix) {
        Some(caps) => (FrameFormat::StatusPrefixed, status_markers(&caps[1])),
        None => (FrameFormat::Embedded, Vec::new()),
    }
}

fn status_markers(text: &str) -> Vec<String> {
    text.split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Convert a matched decimal, accepting `,` as the decimal separator
fn to_number(text: &str) -> Result<f64, ParseError> {
    let normalized = text.replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParseError::InvalidNumber(text.to_string())),
    }
}
