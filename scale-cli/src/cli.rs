//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "scalehub", version, about = "Discover, read and test weighing scales")]
pub struct Cli {
    /// Settings file (defaults to $XDG_CONFIG_HOME/scalehub/settings.json)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List candidate scale devices visible to this host
    Discover,
    /// Report the state of the serial/HID driver facilities
    Facilities,
    /// Try to enable missing driver facilities
    InstallFacilities,
    /// Read one weight from a serial endpoint
    Read {
        /// Port address, e.g. /dev/ttyUSB0 or COM3
        #[arg(long)]
        port: String,
        /// Line speed (defaults to the configured baud rate)
        #[arg(long)]
        baud: Option<u32>,
        /// Read deadline in milliseconds
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
    },
    /// Interpret a raw frame without touching any hardware
    Parse {
        /// Frame text as received from a scale
        frame: String,
    },
    /// Read a registered scale and store whether it answered
    Test {
        scale_id: String,
    },
    /// Register a scale, replacing any with the same id
    Register {
        id: String,
        name: String,
        /// Port address the scale is attached to
        port: String,
        #[arg(long)]
        tenant: Option<String>,
    },
    /// List registered scales
    Scales,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_arguments() {
        let cli = Cli::try_parse_from([
            "scalehub", "read", "--port", "COM3", "--baud", "4800", "--timeout-ms", "50",
        ])
        .unwrap();
        match cli.cmd {
            Commands::Read { port, baud, timeout_ms } => {
                assert_eq!(port, "COM3");
                assert_eq!(baud, Some(4800));
                assert_eq!(timeout_ms, Some(50));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_register_with_tenant_and_config() {
        let cli = Cli::try_parse_from([
            "scalehub",
            "register",
            "s1",
            "Balcão",
            "/dev/ttyUSB0",
            "--tenant",
            "loja-1",
            "--config",
            "/tmp/scalehub.json",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/scalehub.json")));
        assert!(matches!(
            cli.cmd,
            Commands::Register { ref tenant, .. } if tenant.as_deref() == Some("loja-1")
        ));
    }

    #[test]
    fn test_read_requires_port() {
        assert!(Cli::try_parse_from(["scalehub", "read"]).is_err());
    }

    #[test]
    fn test_install_facilities_kebab_case() {
        let cli = Cli::try_parse_from(["scalehub", "install-facilities"]).unwrap();
        assert!(matches!(cli.cmd, Commands::InstallFacilities));
    }
}
