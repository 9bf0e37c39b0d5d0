pub mod command;
pub mod config;
pub mod control_plane;
pub mod counters;
pub mod error;
pub mod logging;
pub mod report;
pub mod sampler;

pub use control_plane::{ControlPlane, OvsCli};
pub use counters::{CounterSource, DirectionCounters, PortCounters};
pub use sampler::Sampler;
