//! Execution of external command-line tools with a deadline.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::runtime::{Builder, Handle};
use tokio::time::timeout;
use tracing::debug;

use crate::error::{snippet, ToolError};

/// Runs one tool invocation at a time and returns its combined output.
///
/// stdout and stderr are concatenated: the node tools print results on
/// either stream depending on build and verbosity.
#[derive(Clone, Debug)]
pub struct ToolRunner {
    timeout: Duration,
    verbose: bool,
    work_dir: Option<PathBuf>,
}

impl ToolRunner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            verbose: false,
            work_dir: None,
        }
    }

    /// Log full command lines and outputs at debug level.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Directory the tool runs in; relative output files land here.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Blocking form of [`ToolRunner::run_async`].
    ///
    /// Inside a runtime this must be called from a blocking thread
    /// (`spawn_blocking`), never from an async task. Outside a runtime a
    /// current-thread one is built for the call.
    pub fn run(&self, bin: &Path, args: &[String]) -> Result<String, ToolError> {
        block_on(self.run_async(bin, args))
    }

    pub async fn run_async(&self, bin: &Path, args: &[String]) -> Result<String, ToolError> {
        let tool = bin.display().to_string();
        if self.verbose {
            debug!(tool = %tool, args = ?args, "running tool");
        }

        let mut command = Command::new(bin);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.work_dir {
            command.current_dir(dir);
        }

        let child = command.spawn().map_err(|source| ToolError::Spawn {
            tool: tool.clone(),
            source,
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(|source| ToolError::Wait {
                tool: tool.clone(),
                source,
            })?,
            Err(_) => {
                return Err(ToolError::Timeout {
                    tool,
                    secs: self.timeout.as_secs(),
                })
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if self.verbose {
            debug!(tool = %tool, status = %output.status, output = %combined, "tool finished");
        }

        if !output.status.success() {
            return Err(ToolError::Failed {
                tool,
                status: output.status.to_string(),
                output: snippet(&combined),
            });
        }
        Ok(combined)
    }
}

fn block_on<T>(future: impl Future<Output = Result<T, ToolError>>) -> Result<T, ToolError> {
    match Handle::try_current() {
        Ok(handle) => handle.block_on(future),
        Err(_) => Builder::new_current_thread()
            .enable_all()
            .build()?
            .block_on(future),
    }
}
