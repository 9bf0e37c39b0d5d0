//! Access to the Open vSwitch command-line tools.
use async_trait::async_trait;

use crate::sar_modules::command::run_tool;
use crate::sar_modules::config::ToolConfig;
use crate::sar_modules::error::CommandError;

/// `ovs-vsctl br-exists` exits with this status when the bridge is absent.
const BR_EXISTS_MISSING_STATUS: i32 = 2;

/// Queries answered by the switch's control plane.
///
/// Implementations return the tool's textual answer untouched; interpreting
/// it belongs to `CounterSource`.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Name of the bridge owning `port`.
    async fn bridge_of(&self, port: &str) -> Result<String, CommandError>;

    /// Whether `name` is itself a bridge.
    async fn bridge_exists(&self, name: &str) -> Result<bool, CommandError>;

    /// Raw `dump-ports` text for `port` on `bridge`.
    async fn port_stats(&self, bridge: &str, port: &str) -> Result<String, CommandError>;

    /// Raw `statistics` column of the interface record.
    async fn interface_statistics(&self, port: &str) -> Result<String, CommandError>;
}

/// `ControlPlane` backed by `ovs-vsctl` and `ovs-ofctl` processes.
#[derive(Debug, Clone)]
pub struct OvsCli {
    tools: ToolConfig,
}

impl OvsCli {
    pub fn new(tools: ToolConfig) -> Self {
        Self { tools }
    }

    fn argv<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut argv = Vec::with_capacity(1 + self.tools.verbose_args.len() + args.len());
        argv.push("-vconsole:off");
        argv.extend(self.tools.verbose_args.iter().map(String::as_str));
        argv.extend_from_slice(args);
        argv
    }

    async fn vsctl(&self, args: &[&str]) -> Result<String, CommandError> {
        let out = run_tool(
            &self.tools.ovs_vsctl,
            self.argv(args),
            self.tools.command_timeout,
        )
        .await?;
        Ok(out.stdout)
    }

    async fn ofctl(&self, args: &[&str]) -> Result<String, CommandError> {
        let out = run_tool(
            &self.tools.ovs_ofctl,
            self.argv(args),
            self.tools.command_timeout,
        )
        .await?;
        Ok(out.stdout)
    }
}

fn br_exists_answer(result: Result<String, CommandError>) -> Result<bool, CommandError> {
    match result {
        Ok(_) => Ok(true),
        Err(CommandError::NonZeroExit {
            code: Some(BR_EXISTS_MISSING_STATUS),
            ..
        }) => Ok(false),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl ControlPlane for OvsCli {
    async fn bridge_of(&self, port: &str) -> Result<String, CommandError> {
        self.vsctl(&["iface-to-br", port]).await
    }

    async fn bridge_exists(&self, name: &str) -> Result<bool, CommandError> {
        br_exists_answer(self.vsctl(&["br-exists", name]).await)
    }

    async fn port_stats(&self, bridge: &str, port: &str) -> Result<String, CommandError> {
        self.ofctl(&["dump-ports", bridge, port]).await
    }

    async fn interface_statistics(&self, port: &str) -> Result<String, CommandError> {
        self.vsctl(&["get", "interface", port, "statistics"]).await
    }
}
