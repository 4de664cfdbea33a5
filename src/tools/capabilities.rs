//! Startup-time registry of entry points that tool manifests can refer to.

use super::traits::{EntryPoint, SharedEntryPoint};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors produced while registering capabilities.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The identifier was empty or whitespace.
    #[error("capability id cannot be empty")]
    EmptyId,

    /// The identifier collided with an existing registration.
    #[error("capability '{id}' is already registered")]
    Duplicate { id: String },
}

/// Entry points known to the host, keyed by capability id.
///
/// A manifest with `entry.capability = "<id>"` is bound to the entry point
/// registered here under that id.
#[derive(Default, Clone)]
pub struct CapabilityRegistry {
    entries: BTreeMap<String, SharedEntryPoint>,
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("registered", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry point under `id`.
    pub fn register<E>(&mut self, id: impl Into<String>, entry: E) -> Result<(), CapabilityError>
    where
        E: EntryPoint + 'static,
    {
        self.register_shared(id, Arc::new(entry))
    }

    /// Register an already-shared entry point under `id`.
    pub fn register_shared(
        &mut self,
        id: impl Into<String>,
        entry: SharedEntryPoint,
    ) -> Result<(), CapabilityError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CapabilityError::EmptyId);
        }
        if self.entries.contains_key(&id) {
            return Err(CapabilityError::Duplicate { id });
        }
        self.entries.insert(id, entry);
        Ok(())
    }

    /// Look up an entry point.
    pub fn get(&self, id: &str) -> Option<SharedEntryPoint> {
        self.entries.get(id).cloned()
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::traits::{FnEntryPoint, Signature, ToolError};
    use crate::types::ToolArgs;
    use serde_json::Value;

    type Ready = std::future::Ready<Result<Value, ToolError>>;

    fn noop() -> FnEntryPoint<impl Fn(ToolArgs) -> Ready + Send + Sync> {
        FnEntryPoint::new(Signature::default(), |_args: ToolArgs| {
            std::future::ready(Ok(Value::Null))
        })
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = CapabilityRegistry::new();
        registry.register("text.upper", noop()).unwrap();
        registry.register("math.add", noop()).unwrap();

        assert!(registry.get("text.upper").is_some());
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.ids().collect::<Vec<_>>(), ["math.add", "text.upper"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn duplicate_registration_errors() {
        let mut registry = CapabilityRegistry::new();
        registry.register("echo", noop()).unwrap();

        let err = registry
            .register("echo", noop())
            .expect_err("duplicate registration should fail");
        assert!(matches!(err, CapabilityError::Duplicate { id } if id == "echo"));
    }

    #[test]
    fn empty_id_is_rejected() {
        let mut registry = CapabilityRegistry::new();
        let err = registry.register("  ", noop()).unwrap_err();
        assert!(matches!(err, CapabilityError::EmptyId));
    }
}
