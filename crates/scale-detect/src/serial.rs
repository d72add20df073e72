//! Bounded-time serial reads
//!
//! A scale read is a single request-response cycle: open the port, let the
//! device settle, drain whatever it has sent, close. The port is owned by the
//! reading function and dropped on every exit path, so a failed or timed-out
//! read never leaves the endpoint held open for the next caller.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{sleep, timeout, Instant};
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, trace};

use crate::error::ReadError;

/// Default line speed used by most retail scales
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default deadline for one read
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1200);

/// Configuration for a single read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadConfig {
    pub baud_rate: u32,
    /// Deadline for the whole read, settle delay included
    pub timeout: Duration,
    /// Pause after opening so the device can start transmitting
    pub settle_delay: Duration,
    /// Silence that ends the drain once bytes have arrived
    pub idle_gap: Duration,
    /// Stop collecting after this many bytes
    pub max_bytes: usize,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
            settle_delay: Duration::from_millis(150),
            idle_gap: Duration::from_millis(50),
            max_bytes: 1024,
        }
    }
}

impl ReadConfig {
    /// Override baud rate and deadline, keeping the other defaults
    pub fn with(baud_rate: Option<u32>, timeout_ms: Option<u64>) -> Self {
        Self::default().overridden(baud_rate, timeout_ms)
    }

    /// Apply per-request baud rate and deadline on top of this config
    pub fn overridden(mut self, baud_rate: Option<u32>, timeout_ms: Option<u64>) -> Self {
        if let Some(baud) = baud_rate {
            self.baud_rate = baud;
        }
        if let Some(ms) = timeout_ms {
            self.timeout = Duration::from_millis(ms);
        }
        self
    }
}

/// Something that can perform one raw read against an endpoint address
#[async_trait]
pub trait EndpointReader: Send + Sync {
    async fn read_raw(&self, address: &str, config: &ReadConfig) -> Result<String, ReadError>;
}

/// Native serial transport
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialReader;

#[async_trait]
impl EndpointReader for SerialReader {
    async fn read_raw(&self, address: &str, config: &ReadConfig) -> Result<String, ReadError> {
        debug!("Opening {} at {} baud", address, config.baud_rate);

        let mut stream = tokio_serial::new(address, config.baud_rate)
            .timeout(config.timeout)
            .open_native_async()
            .map_err(|e| ReadError::from_open_error(address, &e))?;

        let result = read_frame(&mut stream, address, config).await;

        drop(stream);
        debug!("Closed {}", address);
        result
    }
}

/// Read one frame from an already-open stream
///
/// After the settle delay, bytes that are already buffered are drained until
/// a complete `\n`-terminated frame has arrived or the line goes quiet for
/// `idle_gap`. If nothing was buffered, waits for a single line instead.
/// Both phases share one deadline.
/// A stream that closes without sending anything is an empty success.
pub async fn read_frame<S>(stream: &mut S, port: &str, config: &ReadConfig) -> Result<String, ReadError>
where
    S: AsyncRead + Unpin,
{
    let deadline = Instant::now() + config.timeout;
    sleep(config.settle_delay.min(config.timeout)).await;

    let mut data = Vec::new();
    let mut chunk = [0u8; 256];

    // Drain whatever the device has already sent
    let mut closed = false;
    while data.len() < config.max_bytes {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match timeout(config.idle_gap.min(remaining), stream.read(&mut chunk)).await {
            Ok(Ok(0)) => {
                closed = true;
                break;
            }
            Ok(Ok(n)) => {
                trace!("{} drained {} bytes", port, n);
                data.extend_from_slice(&chunk[..n]);
                // A streaming scale never goes quiet; one complete frame is enough
                if data.contains(&b'\n') {
                    break;
                }
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::TimedOut => break,
            Ok(Err(e)) => return Err(io_error(port, &e)),
            Err(_) => break,
        }
    }

    // Nothing buffered: fall back to waiting for one line
    if data.is_empty() && !closed {
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match timeout(remaining, stream.read(&mut chunk)).await {
                Ok(Ok(0)) => {
                    closed = true;
                    break;
                }
                Ok(Ok(n)) => {
                    trace!("{} line read {} bytes", port, n);
                    data.extend_from_slice(&chunk[..n]);
                    if data.contains(&b'\n') || data.len() >= config.max_bytes {
                        break;
                    }
                }
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Ok(Err(e)) => return Err(io_error(port, &e)),
                Err(_) => break,
            }
        }
    }

    if data.is_empty() && !closed {
        return Err(ReadError::Timeout {
            port: port.to_string(),
            timeout_ms: config.timeout.as_millis() as u64,
        });
    }

    let raw = String::from_utf8_lossy(&data).into_owned();
    trace!("{} raw frame: {:?}", port, raw);
    Ok(raw)
}

fn io_error(port: &str, err: &std::io::Error) -> ReadError {
    ReadError::Io {
        port: port.to_string(),
        reason: err.to_string(),
    }
}
