//! Tool discovery: scans a directory for tool manifests.
//!
//! Each manifest declares a schema document and an entry point. Units that
//! lack either are skipped quietly; units that fail to load are logged and
//! skipped without stopping the scan.

pub mod manifest;

pub use manifest::{EntryDecl, ManifestFormat, ToolManifest};

use crate::tools::{
    CapabilityRegistry, ProcessEntryPoint, SharedEntryPoint, Signature, ToolDefinition,
    ToolRegistry,
};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Manifest extensions scanned when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Errors raised while loading tool units.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The tool directory exists but could not be listed.
    #[error("failed to read tool directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A manifest could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A manifest could not be parsed.
    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

/// Why a well-formed unit was left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No `schema`, or an empty one.
    MissingSchema,
    /// No `entry`, or one naming neither a capability nor a command.
    MissingEntry,
    /// `entry` names both a capability and a command.
    AmbiguousEntry,
    /// `entry` is declared but is not a well-formed entry table.
    NotCallable,
    /// `entry.capability` is not registered by the host.
    UnknownCapability(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSchema => write!(f, "no schema"),
            Self::MissingEntry => write!(f, "no entry point"),
            Self::AmbiguousEntry => write!(f, "entry declares both capability and command"),
            Self::NotCallable => write!(f, "entry is not a callable declaration"),
            Self::UnknownCapability(id) => write!(f, "capability '{id}' is not registered"),
        }
    }
}

/// Unit excluded from the result set.
#[derive(Debug)]
pub struct SkippedUnit {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Outcome of one discovery pass.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Loaded definitions, in discovery (filename) order.
    pub tools: Vec<ToolDefinition>,
    pub skipped: Vec<SkippedUnit>,
    /// Units that failed to load.
    pub failures: Vec<DiscoveryError>,
}

impl DiscoveryReport {
    /// Build the name-to-definition registry (last-wins), returning the
    /// definitions that were overwritten.
    pub fn into_registry(self) -> (ToolRegistry, Vec<ToolDefinition>) {
        ToolRegistry::from_definitions(self.tools)
    }
}

/// Discover tools in `dir` using the default manifest extensions.
pub fn discover(
    dir: &Path,
    capabilities: &CapabilityRegistry,
) -> Result<Vec<ToolDefinition>, DiscoveryError> {
    let extensions: Vec<String> = DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect();
    Ok(scan(dir, capabilities, &extensions)?.tools)
}

/// Scan `dir` for manifests whose extension is in `extensions`.
///
/// A missing directory yields an empty report.
pub fn scan(
    dir: &Path,
    capabilities: &CapabilityRegistry,
    extensions: &[String],
) -> Result<DiscoveryReport, DiscoveryError> {
    let mut report = DiscoveryReport::default();

    if !dir.exists() {
        debug!("Tool directory does not exist: {:?}", dir);
        return Ok(report);
    }

    for path in candidate_files(dir, extensions)? {
        match load_unit(&path, capabilities) {
            Ok(Ok(def)) => {
                debug!("Loaded tool '{}' from {:?}", def.name(), path);
                report.tools.push(def);
            }
            Ok(Err(reason)) => {
                debug!("Skipping {:?}: {}", path, reason);
                report.skipped.push(SkippedUnit { path, reason });
            }
            Err(e) => {
                warn!("Failed to load tool unit: {}", e);
                report.failures.push(e);
            }
        }
    }

    info!(
        "Discovered {} tools in {:?} ({} skipped, {} failed)",
        report.tools.len(),
        dir,
        report.skipped.len(),
        report.failures.len()
    );
    Ok(report)
}

/// Regular files in `dir` with a matching extension, sorted by file name.
fn candidate_files(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, DiscoveryError> {
    let read_dir_err = |source: std::io::Error| DiscoveryError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_dir_err)? {
        let path = entry.map_err(read_dir_err)?.path();
        if path.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Load one unit. The outer error is a load failure; the inner one a skip.
fn load_unit(
    path: &Path,
    capabilities: &CapabilityRegistry,
) -> Result<Result<ToolDefinition, SkipReason>, DiscoveryError> {
    let format = ManifestFormat::from_path(path).ok_or_else(|| DiscoveryError::Parse {
        path: path.to_path_buf(),
        message: "unsupported manifest format".into(),
    })?;

    let content = std::fs::read_to_string(path).map_err(|source| DiscoveryError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let manifest =
        manifest::parse_manifest(&content, format).map_err(|message| DiscoveryError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

    Ok(build_definition(path, manifest, capabilities))
}

fn build_definition(
    path: &Path,
    manifest: ToolManifest,
    capabilities: &CapabilityRegistry,
) -> Result<ToolDefinition, SkipReason> {
    let schema = manifest
        .schema_doc()
        .cloned()
        .ok_or(SkipReason::MissingSchema)?;
    let entry = match &manifest.entry {
        None | Some(Value::Null) => return Err(SkipReason::MissingEntry),
        Some(value) => EntryDecl::from_value(value).ok_or(SkipReason::NotCallable)?,
    };
    let entry_point = bind_entry(path, entry, capabilities)?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
        .to_string();

    Ok(ToolDefinition::new(stem, schema, entry_point).with_source(path))
}

fn bind_entry(
    path: &Path,
    entry: EntryDecl,
    capabilities: &CapabilityRegistry,
) -> Result<SharedEntryPoint, SkipReason> {
    match (entry.capability, entry.command) {
        (Some(_), Some(_)) => Err(SkipReason::AmbiguousEntry),
        (None, None) => Err(SkipReason::MissingEntry),
        (Some(id), None) => capabilities
            .get(&id)
            .ok_or(SkipReason::UnknownCapability(id)),
        (None, Some(command)) => {
            let signature = Signature::new(entry.params).require(entry.required);
            let mut process = ProcessEntryPoint::new(command, entry.args, signature);
            if let Some(dir) = path.parent() {
                process = process.with_working_dir(dir);
            }
            Ok(Arc::new(process))
        }
    }
}
