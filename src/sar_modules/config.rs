use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sar_modules::error::ConfigError;

pub const DEFAULT_INTERVAL_SECONDS: u64 = 2;
pub const DEFAULT_COMMAND_TIMEOUT_SECONDS: u64 = 5;
pub const DEFAULT_OVS_VSCTL: &str = "ovs-vsctl";
pub const DEFAULT_OVS_OFCTL: &str = "ovs-ofctl";

/// Command line of `ovs-sar`.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Per-interface packet rates of Open vSwitch ports", long_about = None)]
pub struct SarArgs {
    /// Comma-separated list of interfaces to watch
    #[arg(short, long, value_delimiter = ',')]
    pub interface: Vec<String>,

    /// Sampling interval in seconds
    #[arg(short = 'n', long)]
    pub interval: Option<u64>,

    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for daily-rotated JSON log files
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

/// On-disk configuration. Every key is optional; the command line wins.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub interfaces: Vec<String>,
    pub interval_seconds: Option<u64>,
    pub ovs_vsctl: Option<String>,
    pub ovs_ofctl: Option<String>,
    pub verbose_args: Vec<String>,
    pub command_timeout_secs: Option<u64>,
    pub log_dir: Option<PathBuf>,
}

/// How the control-plane executables are invoked.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfig {
    pub ovs_vsctl: String,
    pub ovs_ofctl: String,
    /// Extra `-v...` flags placed after `-vconsole:off` on every call.
    pub verbose_args: Vec<String>,
    pub command_timeout: Duration,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            ovs_vsctl: DEFAULT_OVS_VSCTL.to_string(),
            ovs_ofctl: DEFAULT_OVS_OFCTL.to_string(),
            verbose_args: Vec::new(),
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECONDS),
        }
    }
}

impl ToolConfig {
    pub fn from_file(file: &FileConfig) -> Result<Self, ConfigError> {
        let timeout_secs = file
            .command_timeout_secs
            .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECONDS);
        if timeout_secs == 0 {
            return Err(ConfigError::ZeroCommandTimeout);
        }
        Ok(Self {
            ovs_vsctl: file
                .ovs_vsctl
                .clone()
                .unwrap_or_else(|| DEFAULT_OVS_VSCTL.to_string()),
            ovs_ofctl: file
                .ovs_ofctl
                .clone()
                .unwrap_or_else(|| DEFAULT_OVS_OFCTL.to_string()),
            verbose_args: file.verbose_args.clone(),
            command_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Validated runtime configuration, built once at startup and handed to the
/// sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct SarConfig {
    pub interfaces: Vec<String>,
    pub interval: Duration,
    pub tools: ToolConfig,
    pub log_dir: Option<PathBuf>,
}

impl SarConfig {
    /// Reads the optional config file named by `args` and merges it with the
    /// command line.
    pub fn load(args: &SarArgs) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => load_file_config(path)?,
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    pub fn merge(args: &SarArgs, file: FileConfig) -> Result<Self, ConfigError> {
        let raw_interfaces = if args.interface.is_empty() {
            &file.interfaces
        } else {
            &args.interface
        };
        let interfaces = validate_interfaces(raw_interfaces)?;

        let interval_secs = args
            .interval
            .or(file.interval_seconds)
            .unwrap_or(DEFAULT_INTERVAL_SECONDS);
        if interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        let tools = ToolConfig::from_file(&file)?;
        let log_dir = args.log_dir.clone().or(file.log_dir);

        Ok(Self {
            interfaces,
            interval: Duration::from_secs(interval_secs),
            tools,
            log_dir,
        })
    }
}

pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let config_str = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&config_str).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Trims names and enforces a non-empty list of distinct, non-empty names.
/// Order is preserved; it is the row order of the report.
fn validate_interfaces(raw: &[String]) -> Result<Vec<String>, ConfigError> {
    if raw.is_empty() {
        return Err(ConfigError::MissingInterfaces);
    }
    let mut seen = HashSet::new();
    let mut interfaces = Vec::with_capacity(raw.len());
    for name in raw {
        let name = name.trim();
        if name.is_empty() {
            return Err(ConfigError::EmptyInterface);
        }
        if !seen.insert(name.to_string()) {
            return Err(ConfigError::DuplicateInterface(name.to_string()));
        }
        interfaces.push(name.to_string());
    }
    Ok(interfaces)
}
