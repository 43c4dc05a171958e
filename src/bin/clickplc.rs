//! clickplc - CLICK PLC command-line tool
//!
//! Prints PLC state as JSON. With no spec, dumps every tag when a tag file is
//! given, otherwise `x001-x816`, `y001-y816` and `df1-df500`.
//!
//! Usage:
//!   clickplc 192.168.1.10
//!   clickplc 192.168.1.10 --tags plc_tags.csv
//!   clickplc 192.168.1.10 c1-c10 df1
//!   clickplc 192.168.1.10 --set c1=true --set df3=1.5,2.5 c1-c3 df3-df4

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use clickplc::{ClickPlc, DriverConfig, PlcError, Readings, WriteData};

/// Read ranges dumped when no spec or tag file is given.
const DEFAULT_DUMP: [&str; 3] = ["x001-x816", "y001-y816", "df1-df500"];

#[derive(Debug, Parser)]
#[command(name = "clickplc", version, about = "Control a CLICK PLC from the command line.")]
struct Args {
    /// IP address of the PLC, optionally with a port
    address: String,

    /// Addresses, ranges or tag names to read
    specs: Vec<String>,

    /// Nickname CSV exported by the CLICK software
    #[arg(short, long, value_name = "FILE")]
    tags: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, value_name = "FILE", env = "CLICKPLC_CONFIG")]
    config: Option<PathBuf>,

    /// Request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Modbus unit id
    #[arg(long)]
    unit_id: Option<u8>,

    /// Write before reading, e.g. `c1=true` or `ds1=3,4` (repeatable)
    #[arg(long = "set", value_name = "SPEC=VALUE")]
    set: Vec<String>,

    /// Log level when RUST_LOG is unset
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = DriverConfig::load(args.config.as_deref())?;
    config.address = args.address;
    if let Some(tags) = args.tags {
        config.tag_file = Some(tags);
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    if let Some(unit_id) = args.unit_id {
        config.unit_id = unit_id;
    }
    debug!("config: {:?}", config);

    let mut plc = ClickPlc::connect(&config).await?;

    for assignment in &args.set {
        let (spec, text) = assignment.split_once('=').ok_or_else(|| {
            PlcError::value(format!("Expected SPEC=VALUE, got '{}'.", assignment))
        })?;
        let value_type = plc.tags().resolve(spec)?.range.category().value_type();
        plc.set(spec, WriteData::parse(value_type, text)?).await?;
    }

    let mut readings = Readings::new();
    if !args.specs.is_empty() {
        for spec in &args.specs {
            readings.extend(plc.get(spec).await?);
        }
    } else if args.set.is_empty() {
        if plc.tags().is_empty() {
            for spec in DEFAULT_DUMP {
                readings.extend(plc.get(spec).await?);
            }
        } else {
            readings = plc.get_all().await?;
        }
    }

    if !readings.is_empty() {
        println!("{}", serde_json::to_string_pretty(&readings)?);
    }
    plc.close().await?;
    Ok(())
}
