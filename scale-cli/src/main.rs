//! scalehub - operator CLI for weighing scales
//!
//! Prints JSON results on stdout; logs go to stderr.

mod cli;
mod registry;
mod settings;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use scale_protocol::{parse_weight, WeightReadResult};
use scale_station::{ScaleRecord, ScaleStation};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::registry::FileRegistry;
use crate::settings::Settings;

/// Station for this host, backed by the settings file
fn station(path: PathBuf, settings: Settings) -> ScaleStation<FileRegistry> {
    let vendors = settings.vendor_table();
    let read_defaults = settings.read_config();
    ScaleStation::for_host(FileRegistry::new(path, settings), vendors).with_read_defaults(read_defaults)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "scalehub=info,scale_protocol=info,scale_detect=info,scale_station=info,scale_sim=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let path = match cli.config {
        Some(path) => path,
        None => Settings::default_path()?,
    };
    let mut settings = Settings::load_from(&path);

    match cli.cmd {
        Commands::Parse { frame } => {
            let result = match parse_weight(&frame) {
                Ok(parsed) => WeightReadResult::weighed(frame, parsed),
                Err(_) => WeightReadResult::unrecognized(frame),
            };
            print_json(&result)?;
        }
        Commands::Register {
            id,
            name,
            port,
            tenant,
        } => {
            let mut record = ScaleRecord::new(id, name, port);
            record.tenant_id = tenant;
            settings.register(record.clone());
            settings
                .save_to(&path)
                .with_context(|| format!("saving {}", path.display()))?;
            tracing::info!("Registered scale {} on {}", record.id, record.connection_info);
            print_json(&record)?;
        }
        Commands::Scales => print_json(&settings.scales)?,
        Commands::Discover => print_json(&station(path, settings).discover().await)?,
        Commands::Facilities => print_json(&station(path, settings).check_facilities().await)?,
        Commands::InstallFacilities => {
            print_json(&station(path, settings).install_facilities().await)?
        }
        Commands::Read {
            port,
            baud,
            timeout_ms,
        } => {
            let result = station(path, settings)
                .read_weight(&port, baud, timeout_ms)
                .await;
            print_json(&result)?;
        }
        Commands::Test { scale_id } => {
            let status = station(path, settings)
                .test_scale(&scale_id)
                .await
                .with_context(|| format!("testing scale {}", scale_id))?;
            print_json(&status)?;
        }
    }

    Ok(())
}
