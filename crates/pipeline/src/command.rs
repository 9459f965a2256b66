//! Shared helper for invoking external command-line tools.

use std::ffi::OsStr;
use std::process::Stdio;

use crate::error::StageError;

/// Maximum stderr kept in an error message.
const MAX_STDERR_CHARS: usize = 2000;

/// Run `program` with `args`, returning stdout on a zero exit status.
///
/// A missing binary maps to [`StageError::ToolNotFound`]; a non-zero exit
/// maps to [`StageError::ToolFailed`] carrying the (truncated) stderr.
pub async fn run_tool<I, S>(program: &str, args: I) -> Result<String, StageError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    tracing::debug!(tool = program, "Running external tool");

    let output = tokio::process::Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| StageError::ToolNotFound {
            tool: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(StageError::ToolFailed {
            tool: program.to_string(),
            exit_code: output.status.code(),
            stderr: tail(&String::from_utf8_lossy(&output.stderr), MAX_STDERR_CHARS),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Keep the last `max` characters of `text`, trimmed.
fn tail(text: &str, max: usize) -> String {
    let trimmed = text.trim();
    let count = trimmed.chars().count();
    if count <= max {
        return trimmed.to_string();
    }
    trimmed.chars().skip(count - max).collect()
}
