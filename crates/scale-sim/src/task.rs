//! Virtual scale task
//!
//! Owns a [`VirtualScale`] and serves its frames over an async stream (the
//! host end of a `tokio::io::duplex` pair stands in for the serial port). The
//! task runs until the peer closes the stream or a shutdown command arrives.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::scale::{SimFormat, VirtualScale};

/// Poll byte understood by request-driven scales
pub const ENQ: u8 = 0x05;

/// When the virtual scale transmits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitMode {
    /// Send a frame every `interval`, whether asked or not
    Continuous { interval: Duration },
    /// Send one frame for each received [`ENQ`]
    OnRequest,
}

/// Commands that can be sent to a running virtual scale
#[derive(Debug, Clone)]
pub enum ScaleCommand {
    /// Place a settled load
    SetWeight(f64),
    /// Place a load that is still swinging
    Load(f64),
    SetFormat(SimFormat),
    Shutdown,
}

/// Run the virtual scale until the stream closes or it is told to stop
pub async fn run_virtual_scale_task<S>(
    mut stream: S,
    mut scale: VirtualScale,
    mode: EmitMode,
    mut cmd_rx: mpsc::Receiver<ScaleCommand>,
) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    info!("Starting virtual scale {} ({:?})", scale.id(), mode);

    let (continuous, period) = match mode {
        EmitMode::Continuous { interval } => (true, interval),
        EmitMode::OnRequest => (false, Duration::from_secs(1)),
    };
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut commands_open = true;
    let mut buf = [0u8; 64];

    loop {
        tokio::select! {
            cmd = cmd_rx.recv(), if commands_open => match cmd {
                Some(ScaleCommand::SetWeight(kg)) => scale.set_weight(kg),
                Some(ScaleCommand::Load(kg)) => scale.load(kg),
                Some(ScaleCommand::SetFormat(format)) => scale.set_format(format),
                Some(ScaleCommand::Shutdown) => {
                    debug!("Virtual scale {} shutting down", scale.id());
                    break;
                }
                None => commands_open = false,
            },

            result = stream.read(&mut buf) => match result {
                Ok(0) => {
                    debug!("Virtual scale stream closed for {}", scale.id());
                    break;
                }
                Ok(n) => {
                    if !continuous && buf[..n].contains(&ENQ) && !send_frame(&mut stream, &scale).await? {
                        break;
                    }
                }
                Err(e) => return Err(e),
            },

            _ = ticker.tick(), if continuous => {
                if !send_frame(&mut stream, &scale).await? {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Write one frame; `false` once the peer has gone away
async fn send_frame<S>(stream: &mut S, scale: &VirtualScale) -> io::Result<bool>
where
    S: AsyncWrite + Unpin,
{
    let Some(frame) = scale.encode_frame() else {
        return Ok(true);
    };
    match stream.write_all(&frame).await {
        Ok(()) => {
            stream.flush().await?;
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    async fn read_some<S: AsyncRead + Unpin>(stream: &mut S) -> String {
        let mut buf = [0u8; 128];
        let n = timeout(Duration::from_millis(500), stream.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        String::from_utf8_lossy(&buf[..n]).into_owned()
    }

    #[tokio::test]
    async fn test_continuous_emission() {
        let (mut host, device) = tokio::io::duplex(1024);
        let mut scale = VirtualScale::new("test", SimFormat::Plain);
        scale.set_weight(0.53);
        let (_cmd_tx, cmd_rx) = mpsc::channel(8);

        let task = tokio::spawn(run_virtual_scale_task(
            device,
            scale,
            EmitMode::Continuous {
                interval: Duration::from_millis(10),
            },
            cmd_rx,
        ));

        assert!(read_some(&mut host).await.starts_with("0.530 kg\r\n"));

        drop(host);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_on_request_replies_to_enq() {
        let (mut host, device) = tokio::io::duplex(1024);
        let scale = VirtualScale::new("test", SimFormat::Semicolon);
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        let task = tokio::spawn(run_virtual_scale_task(device, scale, EmitMode::OnRequest, cmd_rx));

        cmd_tx.send(ScaleCommand::SetWeight(2.5)).await.unwrap();
        // Let the command land before polling
        tokio::time::sleep(Duration::from_millis(20)).await;
        host.write_all(&[ENQ]).await.unwrap();

        assert_eq!(read_some(&mut host).await, "ST;NT; 2,500\r\n");

        cmd_tx.send(ScaleCommand::Shutdown).await.unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_on_request_stays_quiet_unpolled() {
        let (mut host, device) = tokio::io::duplex(1024);
        let scale = VirtualScale::new("test", SimFormat::Plain);
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        let task = tokio::spawn(run_virtual_scale_task(device, scale, EmitMode::OnRequest, cmd_rx));

        let mut buf = [0u8; 16];
        let quiet = timeout(Duration::from_millis(100), host.read(&mut buf)).await;
        assert!(quiet.is_err());

        drop(cmd_tx);
        drop(host);
        task.await.unwrap().unwrap();
    }
}
