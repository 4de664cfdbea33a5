//! Dispatcher that owns the tool registry and invokes tools by name.

pub mod invoker;
pub mod resolver;

pub use invoker::{invoke, invoke_with, normalize, InvokeOptions};
pub use resolver::resolve;

use crate::config::{self, DispatcherConfig};
use crate::discovery::{self, DiscoveryError, DiscoveryReport};
use crate::tools::{CapabilityRegistry, ToolDefinition, ToolRegistry};
use crate::types::{InvocationResponse, ToolArgs};
use anyhow::Context;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Discovered tools plus the host-injected values offered to them.
///
/// `invoke` only reads the registry; `reload` needs `&mut self`, so a
/// discovery pass can never overlap an invocation on the same dispatcher.
#[derive(Debug)]
pub struct Dispatcher {
    config: DispatcherConfig,
    tools_dir: PathBuf,
    timeout: Option<Duration>,
    injected: ToolArgs,
    capabilities: CapabilityRegistry,
    registry: ToolRegistry,
}

impl Dispatcher {
    /// Create a dispatcher and run the first discovery pass.
    pub fn new(
        config: &DispatcherConfig,
        capabilities: CapabilityRegistry,
    ) -> Result<Self, DiscoveryError> {
        let mut dispatcher = Self {
            config: config.clone(),
            tools_dir: PathBuf::from(config.resolved_tools_dir()),
            timeout: config.invoke_timeout(),
            injected: config.inject.clone(),
            capabilities,
            registry: ToolRegistry::new(),
        };
        dispatcher.reload()?;
        Ok(dispatcher)
    }

    /// Load `dispatcher.toml` from `path` (defaults when absent) and build a
    /// dispatcher from it.
    pub fn from_config_path(
        path: &Path,
        capabilities: CapabilityRegistry,
    ) -> anyhow::Result<Self> {
        let config = config::load_config(path)?;
        info!("Loaded dispatcher config from {:?}", path);
        Self::new(&config, capabilities)
            .with_context(|| format!("Failed to discover tools in {}", config.tools_dir))
    }

    /// Settings this dispatcher runs with, including values injected since
    /// it was created.
    pub fn config(&self) -> DispatcherConfig {
        DispatcherConfig {
            inject: self.injected.clone(),
            ..self.config.clone()
        }
    }

    /// Write the current settings to `path`.
    ///
    /// Fails without writing when an injected value holds a null.
    pub fn save_config(&self, path: &Path) -> anyhow::Result<()> {
        config::save_config(&self.config(), path)
    }

    /// Run a new discovery pass and replace the registry.
    pub fn reload(&mut self) -> Result<DiscoveryReport, DiscoveryError> {
        let report = discovery::scan(
            &self.tools_dir,
            &self.capabilities,
            &self.config.extensions,
        )?;
        let (registry, replaced) = ToolRegistry::from_definitions(report.tools.iter().cloned());
        info!(
            "Registry holds {} tools ({} overwritten by name)",
            registry.len(),
            replaced.len()
        );
        self.registry = registry;
        Ok(report)
    }

    /// Offer `value` to every tool that declares a parameter named `key`.
    ///
    /// Any JSON value is accepted for invocation; see [`Dispatcher::save_config`]
    /// for the null restriction on persisting.
    pub fn inject(&mut self, key: impl Into<String>, value: Value) {
        self.injected.insert(key.into(), value);
    }

    pub fn injected(&self) -> &ToolArgs {
        &self.injected
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.registry.get(name)
    }

    /// Configured per-call timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Invoke the tool named `name` under the configured timeout.
    pub async fn invoke(&self, name: &str, caller: &ToolArgs) -> InvocationResponse {
        self.invoke_with(name, caller, self.default_options()).await
    }

    /// Invoke with a cancellation token in addition to the configured timeout.
    pub async fn invoke_cancellable(
        &self,
        name: &str,
        caller: &ToolArgs,
        cancel: CancellationToken,
    ) -> InvocationResponse {
        self.invoke_with(name, caller, self.default_options().with_cancel(cancel))
            .await
    }

    async fn invoke_with(
        &self,
        name: &str,
        caller: &ToolArgs,
        options: InvokeOptions,
    ) -> InvocationResponse {
        match self.registry.get(name) {
            Some(tool) => invoker::invoke_with(tool, &self.injected, caller, &options).await,
            None => {
                warn!("Invocation of unknown tool '{}'", name);
                InvocationResponse::error(format!("tool '{name}' is not registered"))
            }
        }
    }

    fn default_options(&self) -> InvokeOptions {
        InvokeOptions {
            timeout: self.timeout,
            cancel: None,
        }
    }
}
