//! Tool dispatcher. Discovers plugin tools from a directory and invokes them
//! through one uniform contract.
//!
//! Discovery reads tool manifests, the resolver injects host-provided values a
//! tool asks for, and the invoker turns every outcome into a
//! `{status, data | error}` envelope.

pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod logging;
pub mod tools;
pub mod types;

pub use config::DispatcherConfig;
pub use discovery::{discover, scan, DiscoveryError, DiscoveryReport};
pub use dispatch::{invoke, invoke_with, normalize, resolve, Dispatcher, InvokeOptions};
pub use tools::{
    CapabilityRegistry, EntryPoint, FnEntryPoint, Signature, ToolDefinition, ToolError,
    ToolRegistry,
};
pub use types::{InvocationResponse, ToolArgs};
