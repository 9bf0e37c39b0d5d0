pub mod encoding;
pub mod execution;

pub use execution::{run_tool, ToolOutput};
