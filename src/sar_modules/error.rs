use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single external tool invocation.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },
    #[error("Failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' exited with status {code:?}: {message}")]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        message: String,
    },
}

/// Why one port could not be polled during one tick.
///
/// None of these are fatal: the sampler reports zero counters for the port
/// and moves on.
#[derive(Error, Debug)]
pub enum PollError {
    #[error("Cannot resolve bridge for '{port}': {reason}")]
    Resolution { port: String, reason: String },
    #[error("Port statistics query failed for '{port}' on '{bridge}': {source}")]
    Query {
        port: String,
        bridge: String,
        #[source]
        source: CommandError,
    },
    #[error("Unparseable statistics for '{port}': {reason}")]
    Parse { port: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("No interface given, use --interface or set `interfaces` in the config file")]
    MissingInterfaces,
    #[error("Empty interface name in interface list")]
    EmptyInterface,
    #[error("Interface '{0}' is listed more than once")]
    DuplicateInterface(String),
    #[error("Interval must be a positive number of seconds")]
    ZeroInterval,
    #[error("Command timeout must be a positive number of seconds")]
    ZeroCommandTimeout,
}

#[derive(Error, Debug)]
pub enum SamplerError {
    #[error("Failed to write report output: {0}")]
    Output(#[from] std::io::Error),
}

/// Why `ovs-sar` exits with a failure status.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sampler(#[from] SamplerError),
    #[error("Sampler task panicked: {0}")]
    Panicked(#[from] tokio::task::JoinError),
    #[error("Failed to listen for the interrupt signal: {0}")]
    Signal(#[source] std::io::Error),
}
