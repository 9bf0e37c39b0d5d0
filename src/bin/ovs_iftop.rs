use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

use ovs_sar::sar_modules::config::{load_file_config, ToolConfig};
use ovs_sar::sar_modules::logging::init_logging;
use ovs_sar::sar_modules::{CounterSource, OvsCli};

/// Print the raw statistics of one Open vSwitch interface.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Interface to inspect
    #[arg(short, long)]
    interface: String,

    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(None, "ovs-iftop");

    let file = match args.config.as_deref().map(load_file_config).transpose() {
        Ok(file) => file.unwrap_or_default(),
        Err(e) => {
            error!(error = %e, "Invalid configuration. Exiting.");
            return ExitCode::FAILURE;
        }
    };
    let tools = match ToolConfig::from_file(&file) {
        Ok(tools) => tools,
        Err(e) => {
            error!(error = %e, "Invalid configuration. Exiting.");
            return ExitCode::FAILURE;
        }
    };

    let source = CounterSource::new(Arc::new(OvsCli::new(tools)));
    match source.interface_statistics(&args.interface).await {
        Ok(statistics) => {
            println!("{statistics}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(interface = %args.interface, error = %e, "Failed to read interface statistics.");
            ExitCode::FAILURE
        }
    }
}
