//! Tool manifest files: the `schema` document plus an `entry` declaration.
//!
//! TOML form:
//! ```toml
//! [schema]
//! name = "echo"
//! description = "Upper-cases a message"
//!
//! [entry]
//! capability = "text.upper"
//! ```
//!
//! or, for an external program:
//! ```toml
//! [entry]
//! command = "python3"
//! args = ["echo.py"]
//! params = ["message", "workspace"]
//! required = ["message"]
//! ```
//!
//! YAML and JSON manifests carry the same two keys.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

/// On-disk shape of a tool unit. Unknown keys are ignored.
///
/// Both symbols are kept as raw values so a unit declaring them with the wrong
/// shape is skipped rather than failing to load.
#[derive(Debug, Default, Deserialize)]
pub struct ToolManifest {
    #[serde(default)]
    pub schema: Option<Value>,
    #[serde(default)]
    pub entry: Option<Value>,
}

impl ToolManifest {
    /// The schema document, if declared as a non-empty table.
    pub fn schema_doc(&self) -> Option<&Map<String, Value>> {
        self.schema
            .as_ref()
            .and_then(Value::as_object)
            .filter(|doc| !doc.is_empty())
    }
}

/// How the entry point of a tool is bound.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct EntryDecl {
    /// Id of an entry point registered by the host.
    #[serde(default)]
    pub capability: Option<String>,
    /// Program to run per call.
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    /// Parameter names the program accepts.
    #[serde(default)]
    pub params: Vec<String>,
    /// Subset of parameters that must be bound.
    #[serde(default)]
    pub required: Vec<String>,
}

impl EntryDecl {
    /// Read an `entry` value. `None` when it is not a well-formed table.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }
}

/// Serialization format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Toml,
    Yaml,
    Json,
}

impl ManifestFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse manifest text in the given format.
pub fn parse_manifest(content: &str, format: ManifestFormat) -> Result<ToolManifest, String> {
    match format {
        ManifestFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        ManifestFormat::Yaml => {
            // An empty YAML document is a unit with no declared symbols.
            if content.trim().is_empty() {
                return Ok(ToolManifest::default());
            }
            serde_yaml::from_str(content).map_err(|e| e.to_string())
        }
        ManifestFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn toml_capability_manifest() {
        let manifest = parse_manifest(
            r#"
            [schema]
            name = "echo"
            description = "Upper-cases a message"

            [entry]
            capability = "text.upper"
            "#,
            ManifestFormat::Toml,
        )
        .unwrap();

        let schema = manifest.schema_doc().unwrap();
        assert_eq!(schema["name"], json!("echo"));
        assert_eq!(schema["description"], json!("Upper-cases a message"));
        let entry = EntryDecl::from_value(manifest.entry.as_ref().unwrap()).unwrap();
        assert_eq!(entry.capability.as_deref(), Some("text.upper"));
    }

    #[test]
    fn yaml_command_manifest() {
        let manifest = parse_manifest(
            "schema:\n  name: lint\n  tags: [a, b]\nentry:\n  command: ruff\n  args: [check]\n  params: [workspace]\n",
            ManifestFormat::Yaml,
        )
        .unwrap();

        assert_eq!(manifest.schema_doc().unwrap()["tags"], json!(["a", "b"]));
        let entry = EntryDecl::from_value(manifest.entry.as_ref().unwrap()).unwrap();
        assert_eq!(entry.command.as_deref(), Some("ruff"));
        assert_eq!(entry.args, ["check"]);
        assert_eq!(entry.params, ["workspace"]);
        assert!(entry.required.is_empty());
    }

    #[test]
    fn json_manifest_without_entry() {
        let manifest =
            parse_manifest(r#"{"schema": {"name": "half"}}"#, ManifestFormat::Json).unwrap();
        assert!(manifest.schema.is_some());
        assert!(manifest.entry.is_none());
    }

    #[test]
    fn wrongly_shaped_symbols_still_parse() {
        let manifest =
            parse_manifest(r#"{"schema": "echo", "entry": 42}"#, ManifestFormat::Json).unwrap();
        assert!(manifest.schema_doc().is_none());
        assert!(EntryDecl::from_value(manifest.entry.as_ref().unwrap()).is_none());

        let manifest = parse_manifest("schema:\n  name: run\nentry: run\n", ManifestFormat::Yaml)
            .unwrap();
        assert!(manifest.schema_doc().is_some());
        assert!(EntryDecl::from_value(manifest.entry.as_ref().unwrap()).is_none());
    }

    #[test]
    fn entry_with_mistyped_field_is_rejected() {
        assert!(EntryDecl::from_value(&json!({"capability": 5})).is_none());
        assert!(EntryDecl::from_value(&json!({})).is_some());
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(parse_manifest("[schema\nname = ", ManifestFormat::Toml).is_err());
    }

    #[test]
    fn empty_yaml_is_an_empty_manifest() {
        let manifest = parse_manifest("\n", ManifestFormat::Yaml).unwrap();
        assert!(manifest.schema.is_none());
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ManifestFormat::from_path(Path::new("a.TOML")), Some(ManifestFormat::Toml));
        assert_eq!(ManifestFormat::from_path(Path::new("a.yml")), Some(ManifestFormat::Yaml));
        assert_eq!(ManifestFormat::from_path(Path::new("a.json")), Some(ManifestFormat::Json));
        assert_eq!(ManifestFormat::from_path(Path::new("a.py")), None);
        assert_eq!(ManifestFormat::from_path(Path::new("README")), None);
    }
}
