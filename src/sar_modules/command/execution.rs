use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command as TokioCommand;
use tracing::debug;

use crate::sar_modules::command::encoding::decode_output;
use crate::sar_modules::error::CommandError;

/// Decoded standard output of a tool that exited successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
}

/// Runs `program` with `args` and captures its output.
///
/// Exit status 0 yields the trimmed stdout. Any other status yields
/// `CommandError::NonZeroExit` carrying the trimmed stderr. The child is
/// killed if it outlives `timeout`.
pub async fn run_tool<I, S>(
    program: &str,
    args: I,
    timeout: Duration,
) -> Result<ToolOutput, CommandError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut command = TokioCommand::new(program);
    for arg in args {
        command.arg(arg.as_ref());
    }
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());
    command.kill_on_drop(true);

    debug!(command = ?command, "Running control-plane tool.");

    let child = command.spawn().map_err(|source| CommandError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(CommandError::Wait {
                program: program.to_string(),
                source,
            })
        }
        // Dropping the future drops the child, and kill_on_drop reaps it.
        Err(_) => {
            return Err(CommandError::Timeout {
                program: program.to_string(),
                timeout,
            })
        }
    };

    if output.status.success() {
        Ok(ToolOutput {
            stdout: decode_output(&output.stdout),
        })
    } else {
        Err(CommandError::NonZeroExit {
            program: program.to_string(),
            code: output.status.code(),
            message: decode_output(&output.stderr),
        })
    }
}
