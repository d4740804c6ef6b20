//! mbus-cli: diagnostic tool for M-Bus meters behind a TCP gateway
//!
//! Connects to a meter gateway, sends a single link-layer request and prints
//! whatever comes back. Useful for checking that a meter answers on its
//! primary address before wiring it into anything bigger.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mbus_frame::{address, Frame};
use mbus_transport::{Direction, MbusTcpConnection, TcpSettings, WireObserver};

#[derive(Parser)]
#[command(name = "mbus-cli")]
#[command(author, version, about = "M-Bus over TCP diagnostics")]
struct Cli {
    /// Gateway host name or address
    #[arg(long)]
    host: String,

    /// Gateway TCP port
    #[arg(long)]
    port: u16,

    /// Response timeout in seconds
    #[arg(long, default_value_t = 4.0)]
    timeout: f64,

    /// Enable verbose output (repeat for raw wire dumps)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a meter (SND_NKE) and expect an acknowledgment
    Ping {
        /// Primary address of the meter (0-250)
        #[arg(long)]
        address: u8,
    },

    /// Request user data (REQ_UD2) and print the response
    Request {
        /// Primary address of the meter (0-250)
        #[arg(long)]
        address: u8,
    },
}

/// Observer that dumps raw wire traffic at debug level
struct HexDumpObserver;

impl WireObserver for HexDumpObserver {
    fn on_frame(&self, direction: Direction, bytes: &[u8]) {
        tracing::debug!("{} {} bytes: {}", direction, bytes.len(), hex(bytes));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let address = match cli.command {
        Commands::Ping { address } | Commands::Request { address } => address,
    };
    if !address::is_primary(address) {
        bail!("{} is not a primary address (0-250)", address);
    }

    let mut settings = TcpSettings::new(cli.host.clone(), cli.port);
    settings
        .set_timeout(cli.timeout)
        .context("invalid timeout")?;

    let mut conn = MbusTcpConnection::connect_with_observer(settings, Arc::new(HexDumpObserver))
        .with_context(|| format!("failed to connect to {}:{}", cli.host, cli.port))?;

    let request = match cli.command {
        Commands::Ping { .. } => Frame::snd_nke(address),
        Commands::Request { .. } => Frame::req_ud2(address),
    };

    conn.send_frame(&request)
        .with_context(|| format!("failed to send request to address {address}"))?;
    let response = conn
        .recv_frame()
        .with_context(|| format!("no valid response from address {address}"))?;

    match (&cli.command, &response) {
        (Commands::Ping { .. }, Frame::Ack) => println!("address {address}: ack"),
        (Commands::Ping { .. }, other) => {
            bail!("address {address}: expected ack, got {}", describe(other))
        }
        (Commands::Request { .. }, frame) => println!("address {address}: {}", describe(frame)),
    }

    conn.disconnect().context("failed to disconnect")?;
    Ok(())
}

/// One-line human-readable frame summary
fn describe(frame: &Frame) -> String {
    match frame {
        Frame::Ack => "ack".to_string(),
        Frame::Short { control, address } => {
            format!("short frame (C=0x{control:02X} A={address})")
        }
        Frame::Control {
            control,
            address,
            control_information,
        } => format!("control frame (C=0x{control:02X} A={address} CI=0x{control_information:02X})"),
        Frame::Long {
            control,
            address,
            control_information,
            data,
        } => format!(
            "long frame (C=0x{control:02X} A={address} CI=0x{control_information:02X}) {} data bytes: {}",
            data.len(),
            hex(data)
        ),
    }
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{b:02X}");
    }
    out
}
