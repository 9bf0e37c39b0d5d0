use clap::Parser;
use std::io::BufWriter;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use ovs_sar::sar_modules::config::{SarArgs, SarConfig};
use ovs_sar::sar_modules::error::{ConfigError, RunError};
use ovs_sar::sar_modules::logging::init_logging;
use ovs_sar::sar_modules::{CounterSource, OvsCli, Sampler};

#[tokio::main]
async fn main() -> ExitCode {
    let args = SarArgs::parse();

    let config = SarConfig::load(&args);
    init_logging(
        config.as_ref().ok().and_then(|c| c.log_dir.as_deref()),
        "ovs-sar",
    );

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "ovs-sar stopped.");
            ExitCode::FAILURE
        }
    }
}

/// Samples until Ctrl-C. Any error here means a non-zero exit status.
async fn run(config: Result<SarConfig, ConfigError>) -> Result<(), RunError> {
    let config = config?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        interfaces = ?config.interfaces,
        interval_secs = config.interval.as_secs(),
        "Starting ovs-sar."
    );

    let source = CounterSource::new(Arc::new(OvsCli::new(config.tools.clone())));
    let sampler = Sampler::new(&config, source, BufWriter::new(std::io::stdout()));
    let mut sampler_task = tokio::spawn(sampler.run());

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            sampler_task.abort();
            signal.map_err(RunError::Signal)?;
            info!("Interrupt received, stopping.");
            Ok(())
        }
        joined = &mut sampler_task => {
            joined??;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_interval_fails_before_sampling() {
        let args = SarArgs::try_parse_from(["ovs-sar", "-i", "vm1-eth0", "-n", "0"]).unwrap();
        let err = run(SarConfig::load(&args)).await.unwrap_err();
        assert!(matches!(err, RunError::Config(ConfigError::ZeroInterval)));
    }

    #[tokio::test]
    async fn test_missing_interfaces_fails_before_sampling() {
        let args = SarArgs::try_parse_from(["ovs-sar", "-n", "2"]).unwrap();
        let err = run(SarConfig::load(&args)).await.unwrap_err();
        assert!(matches!(err, RunError::Config(ConfigError::MissingInterfaces)));
    }
}
