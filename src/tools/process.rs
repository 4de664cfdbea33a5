//! Entry point that runs an external program per call.
//!
//! Resolved arguments are written to the child's stdin as a single JSON
//! object; stdout is read back as the tool's return value.

use super::traits::{EntryPoint, Signature, ToolError};
use crate::types::ToolArgs;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// External command bound to a tool manifest.
#[derive(Debug, Clone)]
pub struct ProcessEntryPoint {
    command: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    signature: Signature,
}

impl ProcessEntryPoint {
    pub fn new(command: impl Into<String>, args: Vec<String>, signature: Signature) -> Self {
        Self {
            command: command.into(),
            args,
            working_dir: None,
            signature,
        }
    }

    /// Run the child from `dir` (manifests use their own directory).
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl EntryPoint for ProcessEntryPoint {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    async fn call(&self, args: ToolArgs) -> Result<Value, ToolError> {
        let payload = serde_json::to_vec(&Value::Object(args))
            .map_err(|e| ToolError::InvalidOutput(format!("arguments not serializable: {e}")))?;

        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        debug!("Spawning tool process: {} {:?}", self.command, self.args);
        let mut child = cmd.spawn().map_err(|source| ToolError::Spawn {
            command: self.command.clone(),
            source,
        })?;

        // stdin is fed while stdout and stderr drain, so neither side can
        // stall on a full pipe.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // A child that exits without reading stdin closes the pipe early.
                if let Err(e) = stdin.write_all(&payload).await {
                    debug!("Tool process closed stdin early: {}", e);
                }
            }
        };
        let ((), output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|source| ToolError::Spawn {
            command: self.command.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(ToolError::Process {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_stdout(&output.stdout)
    }
}

/// Interpret child stdout: JSON when it parses, a plain string otherwise.
fn parse_stdout(stdout: &[u8]) -> Result<Value, ToolError> {
    let text = std::str::from_utf8(stdout)
        .map_err(|e| ToolError::InvalidOutput(format!("stdout is not UTF-8: {e}")))?
        .trim();

    if text.is_empty() {
        return Ok(Value::Null);
    }

    Ok(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
}
