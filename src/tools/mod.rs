pub mod capabilities;
pub mod process;
pub mod traits;

pub use capabilities::{CapabilityError, CapabilityRegistry};
pub use process::ProcessEntryPoint;
pub use traits::{str_arg, EntryPoint, FnEntryPoint, SharedEntryPoint, Signature, ToolError};

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

// ---------------------------------------------------------------------------
// Tool definitions
// ---------------------------------------------------------------------------

/// One discovered tool: its name, schema document and entry point.
#[derive(Clone)]
pub struct ToolDefinition {
    name: String,
    schema: Map<String, Value>,
    entry_point: SharedEntryPoint,
    source: Option<PathBuf>,
}

impl ToolDefinition {
    /// Build a definition; the schema's `name` wins over `fallback_name`.
    pub fn new(
        fallback_name: impl Into<String>,
        schema: Map<String, Value>,
        entry_point: SharedEntryPoint,
    ) -> Self {
        let name = declared_name(&schema).unwrap_or_else(|| fallback_name.into());
        Self {
            name,
            schema,
            entry_point,
            source: None,
        }
    }

    /// Record the file this definition was loaded from.
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opaque schema metadata, passed through to the host.
    pub fn schema(&self) -> &Map<String, Value> {
        &self.schema
    }

    pub fn entry_point(&self) -> &SharedEntryPoint {
        &self.entry_point
    }

    pub fn signature(&self) -> &Signature {
        self.entry_point.signature()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("params", &self.signature().params())
            .field("source", &self.source)
            .finish()
    }
}

/// The schema's `name`, if it is a non-empty string.
fn declared_name(schema: &Map<String, Value>) -> Option<String> {
    schema
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Name-to-definition mapping produced by one discovery pass.
///
/// Read-only once built; rebuilding means building a new registry.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from definitions in discovery order. Later names overwrite earlier
    /// ones; the overwritten definitions are returned.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = ToolDefinition>,
    ) -> (Self, Vec<ToolDefinition>) {
        let mut registry = Self::new();
        let mut replaced = Vec::new();
        for def in definitions {
            if let Some(old) = registry.insert(def) {
                replaced.push(old);
            }
        }
        (registry, replaced)
    }

    /// Insert a definition, returning the one it replaced.
    pub fn insert(&mut self, definition: ToolDefinition) -> Option<ToolDefinition> {
        let old = self.tools.insert(definition.name.clone(), definition);
        if let Some(old) = &old {
            warn!(
                "Tool '{}' from {:?} overwritten by a later definition",
                old.name, old.source
            );
        }
        old
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// Tool names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolArgs;
    use serde_json::json;
    use std::sync::Arc;

    fn entry() -> SharedEntryPoint {
        Arc::new(FnEntryPoint::new(Signature::new(["x"]), |_args: ToolArgs| async {
            Ok(Value::Null)
        }))
    }

    fn schema(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("schema must be an object"),
        }
    }

    #[test]
    fn schema_name_takes_precedence() {
        let def = ToolDefinition::new("bar", schema(json!({"name": "foo"})), entry());
        assert_eq!(def.name(), "foo");
    }

    #[test]
    fn blank_or_non_string_name_falls_back() {
        let def = ToolDefinition::new("bar", schema(json!({"name": "  "})), entry());
        assert_eq!(def.name(), "bar");
        let def = ToolDefinition::new("bar", schema(json!({"name": 5})), entry());
        assert_eq!(def.name(), "bar");
    }

    #[test]
    fn later_definition_wins_on_collision() {
        let first = ToolDefinition::new("a", schema(json!({"name": "dup", "v": 1})), entry())
            .with_source("a.toml");
        let second = ToolDefinition::new("b", schema(json!({"name": "dup", "v": 2})), entry())
            .with_source("b.toml");

        let (registry, replaced) = ToolRegistry::from_definitions([first, second]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("dup").unwrap().schema()["v"], json!(2));
        assert_eq!(replaced.len(), 1);
        assert_eq!(replaced[0].source(), Some(Path::new("a.toml")));
    }
}
