//! Configuration schema for dispatcher.toml.

use crate::discovery::DEFAULT_EXTENSIONS;
use crate::types::ToolArgs;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Directory scanned for tool manifests.
    pub tools_dir: String,

    /// Manifest file extensions considered during discovery.
    pub extensions: Vec<String>,

    /// Per-call timeout in milliseconds (0 disables the limit).
    pub invoke_timeout_ms: u64,

    /// Log level (debug, info, warn, error).
    pub log_level: String,

    /// Values offered to every tool that declares a matching parameter.
    pub inject: ToolArgs,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            tools_dir: "~/.tool-dispatcher/tools".into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            invoke_timeout_ms: 30_000,
            log_level: "info".into(),
            inject: ToolArgs::new(),
        }
    }
}

impl DispatcherConfig {
    /// Resolve a path that may contain `~` to an absolute path.
    pub fn resolve_path(&self, path: &str) -> String {
        shellexpand::tilde(path).into_owned()
    }

    /// Resolved tool directory.
    pub fn resolved_tools_dir(&self) -> String {
        self.resolve_path(&self.tools_dir)
    }

    /// Per-call timeout, `None` when disabled.
    pub fn invoke_timeout(&self) -> Option<Duration> {
        (self.invoke_timeout_ms > 0).then(|| Duration::from_millis(self.invoke_timeout_ms))
    }

    /// Check that the config can be written as TOML.
    ///
    /// TOML has no null, so a null anywhere under `inject` is rejected by name.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in &self.inject {
            if let Some(at) = find_null(value, format!("inject.{key}")) {
                bail!("Config value '{at}' is null, which TOML cannot represent");
            }
        }
        Ok(())
    }
}

/// Dotted path of the first null inside `value`.
fn find_null(value: &Value, at: String) -> Option<String> {
    match value {
        Value::Null => Some(at),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, item)| find_null(item, format!("{at}[{i}]"))),
        Value::Object(map) => map
            .iter()
            .find_map(|(k, item)| find_null(item, format!("{at}.{k}"))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_valid() {
        assert!(DispatcherConfig::default().validate().is_ok());
    }

    #[test]
    fn null_inject_values_are_named() {
        let mut config = DispatcherConfig::default();
        config.inject.insert("workspace".into(), json!("/srv/ws"));
        config.inject.insert("limits".into(), json!({"cpu": [1, null]}));

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("inject.limits.cpu[1]"), "{err}");

        config.inject.insert("limits".into(), Value::Null);
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("'inject.limits'"), "{err}");
    }
}
