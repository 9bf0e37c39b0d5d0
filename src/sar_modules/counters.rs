//! Cumulative per-port counters and how they are read from `ovs-ofctl`.
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::sync::Arc;
use tracing::debug;

use crate::sar_modules::control_plane::ControlPlane;
use crate::sar_modules::error::{CommandError, PollError};

/// Printed by `ovs-ofctl dump-ports` for counters the datapath does not keep.
const UNKNOWN_MARKER: &str = "?";

lazy_static! {
    static ref RX_PATTERN: Regex =
        Regex::new(r"rx pkts=([^,\s]+), bytes=([^,\s]+), drop=([^,\s]+), errs=([^,\s]+)")
            .expect("rx pattern is valid");
    static ref TX_PATTERN: Regex =
        Regex::new(r"tx pkts=([^,\s]+), bytes=([^,\s]+), drop=([^,\s]+), errs=([^,\s]+)")
            .expect("tx pattern is valid");
}

/// Counters for one traffic direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionCounters {
    pub packets: u64,
    pub bytes: u64,
    pub drops: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortCounters {
    pub rx: DirectionCounters,
    pub tx: DirectionCounters,
}

impl PortCounters {
    /// Stand-in reported for a port whose poll failed.
    pub fn zeroed() -> Self {
        Self::default()
    }
}

/// Extracts rx/tx counters from `ovs-ofctl dump-ports` output.
///
/// Only the first match of each direction is used. `?` reads as 0; any other
/// non-decimal token fails the whole parse.
pub fn parse_port_stats(port: &str, text: &str) -> Result<PortCounters, PollError> {
    Ok(PortCounters {
        rx: parse_direction(port, text, &RX_PATTERN, "rx")?,
        tx: parse_direction(port, text, &TX_PATTERN, "tx")?,
    })
}

fn parse_direction(
    port: &str,
    text: &str,
    pattern: &Regex,
    direction: &str,
) -> Result<DirectionCounters, PollError> {
    let caps = pattern.captures(text).ok_or_else(|| PollError::Parse {
        port: port.to_string(),
        reason: format!("no {direction} counters in output: {text:?}"),
    })?;

    let field = |caps: &Captures<'_>, idx: usize| -> Result<u64, PollError> {
        let token = caps.get(idx).map(|m| m.as_str()).unwrap_or(UNKNOWN_MARKER);
        parse_token(token).ok_or_else(|| PollError::Parse {
            port: port.to_string(),
            reason: format!("malformed {direction} counter {token:?}"),
        })
    };

    Ok(DirectionCounters {
        packets: field(&caps, 1)?,
        bytes: field(&caps, 2)?,
        drops: field(&caps, 3)?,
        errors: field(&caps, 4)?,
    })
}

fn parse_token(token: &str) -> Option<u64> {
    if token == UNKNOWN_MARKER {
        return Some(0);
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Reads the current counters of a port through a `ControlPlane`.
#[derive(Clone)]
pub struct CounterSource {
    control_plane: Arc<dyn ControlPlane>,
}

impl CounterSource {
    pub fn new(control_plane: Arc<dyn ControlPlane>) -> Self {
        Self { control_plane }
    }

    /// Resolves the owning bridge, dumps the port and parses the counters.
    pub async fn fetch(&self, port: &str) -> Result<PortCounters, PollError> {
        let bridge = self.resolve_bridge(port).await?;
        let text = self
            .control_plane
            .port_stats(&bridge, port)
            .await
            .map_err(|source| PollError::Query {
                port: port.to_string(),
                bridge: bridge.clone(),
                source,
            })?;
        let counters = parse_port_stats(port, &text)?;
        debug!(port = %port, bridge = %bridge, ?counters, "Polled port counters.");
        Ok(counters)
    }

    /// A bridge queried by its own name owns itself.
    async fn resolve_bridge(&self, port: &str) -> Result<String, PollError> {
        let lookup_err = match self.control_plane.bridge_of(port).await {
            Ok(bridge) if !bridge.is_empty() => return Ok(bridge),
            Ok(_) => "empty bridge name".to_string(),
            Err(e) => e.to_string(),
        };

        match self.control_plane.bridge_exists(port).await {
            Ok(true) => {
                debug!(port = %port, "Port is a bridge, using it as its own parent.");
                Ok(port.to_string())
            }
            Ok(false) => Err(PollError::Resolution {
                port: port.to_string(),
                reason: lookup_err,
            }),
            Err(e) => Err(PollError::Resolution {
                port: port.to_string(),
                reason: format!("{lookup_err}; bridge check failed: {e}"),
            }),
        }
    }

    /// Raw `statistics` column of the interface, as printed by `ovs-vsctl`.
    pub async fn interface_statistics(&self, port: &str) -> Result<String, CommandError> {
        self.control_plane.interface_statistics(port).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Scripted control plane. Each port answers `port_stats` from a queue of
    /// responses; `Err` entries simulate a failing `ovs-ofctl` run.
    #[derive(Default)]
    pub struct FakeControlPlane {
        pub bridges: HashMap<String, String>,
        pub bridge_names: Vec<String>,
        pub stats: Mutex<HashMap<String, VecDeque<Result<String, String>>>>,
    }

    impl FakeControlPlane {
        pub fn with_port(mut self, port: &str, bridge: &str) -> Self {
            self.bridges.insert(port.to_string(), bridge.to_string());
            self
        }

        pub fn with_bridge(mut self, bridge: &str) -> Self {
            self.bridge_names.push(bridge.to_string());
            self
        }

        pub fn push_stats(&self, port: &str, response: Result<String, String>) {
            self.stats
                .lock()
                .unwrap()
                .entry(port.to_string())
                .or_default()
                .push_back(response);
        }
    }

    fn failed(message: &str) -> CommandError {
        CommandError::NonZeroExit {
            program: "fake-ovs".to_string(),
            code: Some(1),
            message: message.to_string(),
        }
    }

    #[async_trait]
    impl ControlPlane for FakeControlPlane {
        async fn bridge_of(&self, port: &str) -> Result<String, CommandError> {
            self.bridges
                .get(port)
                .cloned()
                .ok_or_else(|| failed(&format!("no interface named {port}")))
        }

        async fn bridge_exists(&self, name: &str) -> Result<bool, CommandError> {
            Ok(self.bridge_names.iter().any(|b| b == name))
        }

        async fn port_stats(&self, _bridge: &str, port: &str) -> Result<String, CommandError> {
            let next = self
                .stats
                .lock()
                .unwrap()
                .get_mut(port)
                .and_then(VecDeque::pop_front);
            match next {
                Some(Ok(text)) => Ok(text),
                Some(Err(message)) => Err(failed(&message)),
                None => Err(failed("no scripted response")),
            }
        }

        async fn interface_statistics(&self, port: &str) -> Result<String, CommandError> {
            Ok(format!("{{rx_bytes=0, tx_bytes=0}} for {port}"))
        }
    }

    pub fn dump_ports(rx: [u64; 4], tx: [u64; 4]) -> String {
        format!(
            "OFPST_PORT reply (xid=0x2): 1 ports\n  port  1: rx pkts={}, bytes={}, drop={}, errs={}, frame=0, over=0, crc=0\n           tx pkts={}, bytes={}, drop={}, errs={}, coll=0",
            rx[0], rx[1], rx[2], rx[3], tx[0], tx[1], tx[2], tx[3]
        )
    }
}
