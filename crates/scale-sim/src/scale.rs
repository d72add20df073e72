//! Virtual scale simulation
//!
//! Provides a simulated scale that encodes its current weight in one of the
//! frame layouts commonly emitted by retail scales.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Frame layout a virtual scale emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimFormat {
    /// `0.530 kg\r\n`
    Plain,
    /// `ST,GS,   0.530 kg\r\n` (`US` while unstable)
    StatusPrefixed,
    /// `ST;NT; 0,530\r\n`
    Semicolon,
    /// `\x02P 000,530 T 000,000\x03\r\n`
    Embedded,
    /// Status text with no weight in it
    Garbage,
    /// Never transmits
    Silent,
}

/// Configuration for creating a virtual scale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualScaleConfig {
    pub id: String,
    pub format: SimFormat,
    /// Initial weight in kilograms
    pub initial_weight_kg: f64,
}

impl Default for VirtualScaleConfig {
    fn default() -> Self {
        Self {
            id: "Virtual Scale".to_string(),
            format: SimFormat::StatusPrefixed,
            initial_weight_kg: 0.0,
        }
    }
}

/// A simulated scale
#[derive(Debug, Clone)]
pub struct VirtualScale {
    id: String,
    format: SimFormat,
    weight_kg: f64,
    stable: bool,
    last_change: Instant,
}

impl VirtualScale {
    pub fn new(id: impl Into<String>, format: SimFormat) -> Self {
        Self {
            id: id.into(),
            format,
            weight_kg: 0.0,
            stable: true,
            last_change: Instant::now(),
        }
    }

    pub fn from_config(config: VirtualScaleConfig) -> Self {
        let mut scale = Self::new(config.id, config.format);
        scale.weight_kg = config.initial_weight_kg;
        scale
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn format(&self) -> SimFormat {
        self.format
    }

    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    pub fn is_stable(&self) -> bool {
        self.stable
    }

    pub fn set_format(&mut self, format: SimFormat) {
        self.format = format;
    }

    /// Place a new load; reported unstable until [`settle`](Self::settle)
    pub fn set_weight(&mut self, kg: f64) {
        if kg != self.weight_kg {
            self.weight_kg = kg;
            self.stable = false;
            self.last_change = Instant::now();
        }
        self.settle();
    }

    /// Put an unsettled load without settling it
    pub fn load(&mut self, kg: f64) {
        self.weight_kg = kg;
        self.stable = false;
        self.last_change = Instant::now();
    }

    pub fn settle(&mut self) {
        self.stable = true;
    }

    /// Time since the load last changed
    pub fn time_since_change(&self) -> std::time::Duration {
        self.last_change.elapsed()
    }

    /// Encode the current reading, `None` for a silent scale
    pub fn encode_frame(&self) -> Option<Vec<u8>> {
        let status = if self.stable { "ST" } else { "US" };
        let w = self.weight_kg;
        let frame = match self.format {
            SimFormat::Plain => format!("{:.3} kg\r\n", w),
            SimFormat::StatusPrefixed => format!("{},GS,{:>8.3} kg\r\n", status, w),
            SimFormat::Semicolon => format!("{};NT; {}\r\n", status, comma_decimal(w)),
            SimFormat::Embedded => {
                format!("\x02P {:0>7} T 000,000\x03\r\n", comma_decimal(w))
            }
            SimFormat::Garbage => "ERR OVERLOAD\r\n".to_string(),
            SimFormat::Silent => return None,
        };
        Some(frame.into_bytes())
    }
}

fn comma_decimal(kg: f64) -> String {
    format!("{:.3}", kg).replace('.', ",")
}
