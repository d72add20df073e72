//! End-to-end reads against virtual scales
//!
//! A `tokio::io::duplex` pair stands in for the serial line: the virtual
//! scale owns one end, `read_frame` reads the other, and the parser turns
//! the captured bytes into a weight.

use std::time::{Duration, Instant};

use scale_detect::{read_frame, EndpointReader, ReadConfig, SerialReader};
use scale_protocol::{parse_weight, ErrorCode, FrameFormat};
use scale_sim::{run_virtual_scale_task, EmitMode, SimFormat, VirtualScale};
use tokio::io::DuplexStream;
use tokio::sync::mpsc;

fn fast_config(timeout_ms: u64) -> ReadConfig {
    ReadConfig {
        timeout: Duration::from_millis(timeout_ms),
        settle_delay: Duration::from_millis(20),
        idle_gap: Duration::from_millis(15),
        ..ReadConfig::default()
    }
}

fn spawn_scale(format: SimFormat, kg: f64, mode: EmitMode) -> DuplexStream {
    let (host, device) = tokio::io::duplex(4096);
    let mut scale = VirtualScale::new("sim", format);
    scale.set_weight(kg);
    let (cmd_tx, cmd_rx) = mpsc::channel(4);
    tokio::spawn(async move {
        // Keep the command channel open for the lifetime of the task
        let _cmd_tx = cmd_tx;
        let _ = run_virtual_scale_task(device, scale, mode, cmd_rx).await;
    });
    host
}

#[tokio::test]
async fn test_read_and_parse_each_frame_style() {
    let cases = [
        (SimFormat::Plain, FrameFormat::Plain),
        (SimFormat::StatusPrefixed, FrameFormat::StatusPrefixed),
        (SimFormat::Semicolon, FrameFormat::StatusPrefixed),
        (SimFormat::Embedded, FrameFormat::Embedded),
    ];

    for (sim, expected) in cases {
        let mut host = spawn_scale(
            sim,
            0.53,
            EmitMode::Continuous {
                interval: Duration::from_millis(200),
            },
        );

        let raw = read_frame(&mut host, "sim", &fast_config(500)).await.unwrap();
        let frame = parse_weight(&raw).unwrap();

        assert_eq!(frame.value, 0.53, "{:?}: {:?}", sim, raw);
        assert_eq!(frame.format, expected, "{:?}", sim);
    }
}

#[tokio::test]
async fn test_garbage_frame_is_read_but_unrecognized() {
    let mut host = spawn_scale(
        SimFormat::Garbage,
        1.0,
        EmitMode::Continuous {
            interval: Duration::from_millis(200),
        },
    );

    let raw = read_frame(&mut host, "sim", &fast_config(500)).await.unwrap();
    assert!(raw.contains("OVERLOAD"));
    assert!(parse_weight(&raw).is_err());
}

#[tokio::test]
async fn test_unpolled_scale_times_out() {
    let mut host = spawn_scale(SimFormat::Plain, 0.53, EmitMode::OnRequest);

    let started = Instant::now();
    let err = read_frame(&mut host, "sim", &fast_config(50)).await.unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(err.code(), ErrorCode::Timeout);
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(500), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_silent_scale_times_out() {
    let mut host = spawn_scale(
        SimFormat::Silent,
        0.53,
        EmitMode::Continuous {
            interval: Duration::from_millis(10),
        },
    );

    let err = read_frame(&mut host, "sim", &fast_config(80)).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::Timeout);
}

#[tokio::test]
async fn test_missing_port_is_not_found() {
    let err = SerialReader
        .read_raw("/dev/scale-detect-does-not-exist", &fast_config(50))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn test_fast_emitter_negative_weight_is_exact() {
    let cases = [
        (SimFormat::Plain, FrameFormat::Plain),
        (SimFormat::StatusPrefixed, FrameFormat::StatusPrefixed),
        (SimFormat::Semicolon, FrameFormat::StatusPrefixed),
    ];

    for (sim, expected) in cases {
        // Several frames pile up during the settle delay
        let mut host = spawn_scale(
            sim,
            -0.53,
            EmitMode::Continuous {
                interval: Duration::from_millis(5),
            },
        );

        let raw = read_frame(&mut host, "sim", &fast_config(500)).await.unwrap();
        let frame = parse_weight(&raw).unwrap();

        assert_eq!(frame.value, -0.53, "{:?}: {:?}", sim, raw);
        assert_eq!(frame.format, expected, "{:?}", sim);
    }
}

#[tokio::test]
async fn test_fast_emitter_heavy_weight_is_exact() {
    let cases = [
        SimFormat::Plain,
        SimFormat::StatusPrefixed,
        SimFormat::Semicolon,
        SimFormat::Embedded,
    ];

    for sim in cases {
        let mut host = spawn_scale(
            sim,
            1234.567,
            EmitMode::Continuous {
                interval: Duration::from_millis(5),
            },
        );

        let raw = read_frame(&mut host, "sim", &fast_config(500)).await.unwrap();
        let frame = parse_weight(&raw).unwrap();

        assert_eq!(frame.value, 1234.567, "{:?}: {:?}", sim, raw);
    }
}

#[tokio::test]
async fn test_default_settle_with_fast_emitter() {
    let mut host = spawn_scale(
        SimFormat::Plain,
        -1250.0,
        EmitMode::Continuous {
            interval: Duration::from_millis(10),
        },
    );

    let raw = read_frame(&mut host, "sim", &ReadConfig::default()).await.unwrap();
    assert!(raw.lines().count() > 1, "{:?}", raw);
    assert_eq!(parse_weight(&raw).unwrap().value, -1250.0);
}
