//! Entry-point trait and the declared-signature metadata tools carry.

use crate::types::ToolArgs;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Errors a tool call can end in. Always converted to an error envelope.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool ran and reported a failure.
    #[error("{0}")]
    Execution(String),

    /// A required parameter was neither injected nor supplied.
    #[error("missing required argument '{name}'")]
    MissingArgument { name: String },

    /// The tool did not finish in time.
    #[error("tool '{tool}' timed out after {millis} ms")]
    Timeout { tool: String, millis: u128 },

    /// The host cancelled the call.
    #[error("tool '{tool}' was cancelled")]
    Cancelled { tool: String },

    /// The tool panicked.
    #[error("tool '{tool}' panicked: {message}")]
    Panicked { tool: String, message: String },

    /// An external tool process could not be started.
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// An external tool process exited unsuccessfully.
    #[error("process exited with {}: {stderr}", .code.map_or_else(|| "signal".to_string(), |c| format!("code {c}")))]
    Process { code: Option<i32>, stderr: String },

    /// The tool produced output that could not be interpreted.
    #[error("invalid tool output: {0}")]
    InvalidOutput(String),
}

impl ToolError {
    /// Creates an execution error from the supplied reason.
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution(reason.into())
    }

    /// Creates a missing-argument error.
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingArgument { name: name.into() }
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// Parameter names an entry point accepts.
///
/// Only named parameters are supported; there is no variadic capture, so a
/// tool receives exactly the injected or supplied values it names here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    params: Vec<String>,
    required: Vec<String>,
}

impl Signature {
    /// Declare the accepted parameter names (all optional).
    pub fn new<I, S>(params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            params: params.into_iter().map(Into::into).collect(),
            required: Vec::new(),
        }
    }

    /// Mark parameters as required. Names not yet declared are added.
    pub fn require<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.params.contains(&name) {
                self.params.push(name.clone());
            }
            if !self.required.contains(&name) {
                self.required.push(name);
            }
        }
        self
    }

    /// Declared parameter names.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Parameters that must be present at call time.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Whether `name` is a declared parameter.
    pub fn accepts(&self, name: &str) -> bool {
        self.params.iter().any(|p| p == name)
    }

    /// Check that every required parameter is bound in `args`.
    pub fn bind(&self, args: &ToolArgs) -> Result<(), ToolError> {
        match self.required.iter().find(|name| !args.contains_key(name.as_str())) {
            Some(name) => Err(ToolError::missing(name.as_str())),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// A callable tool implementation.
#[async_trait]
pub trait EntryPoint: Send + Sync {
    /// Parameters this entry point accepts.
    fn signature(&self) -> &Signature;

    /// Execute with already-resolved arguments.
    async fn call(&self, args: ToolArgs) -> Result<Value, ToolError>;
}

/// Shared handle to an entry point.
pub type SharedEntryPoint = Arc<dyn EntryPoint>;

/// Entry point backed by an async closure.
pub struct FnEntryPoint<F> {
    signature: Signature,
    func: F,
}

impl<F, Fut> FnEntryPoint<F>
where
    F: Fn(ToolArgs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ToolError>> + Send,
{
    pub fn new(signature: Signature, func: F) -> Self {
        Self { signature, func }
    }
}

#[async_trait]
impl<F, Fut> EntryPoint for FnEntryPoint<F>
where
    F: Fn(ToolArgs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ToolError>> + Send,
{
    fn signature(&self) -> &Signature {
        &self.signature
    }

    async fn call(&self, args: ToolArgs) -> Result<Value, ToolError> {
        (self.func)(args).await
    }
}

/// Fetch a string argument, failing like a missing keyword would.
pub fn str_arg<'a>(args: &'a ToolArgs, name: &str) -> Result<&'a str, ToolError> {
    match args.get(name) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ToolError::execution(format!(
            "argument '{name}' must be a string, got {other}"
        ))),
        None => Err(ToolError::missing(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn require_adds_undeclared_params() {
        let sig = Signature::new(["a"]).require(["b"]);
        assert_eq!(sig.params(), ["a", "b"]);
        assert_eq!(sig.required(), ["b"]);
        assert!(sig.accepts("a"));
        assert!(!sig.accepts("c"));
    }

    #[test]
    fn bind_reports_first_missing_required() {
        let sig = Signature::new(["a", "b"]).require(["a", "b"]);
        let mut args = ToolArgs::new();
        args.insert("b".into(), json!(1));

        let err = sig.bind(&args).unwrap_err();
        assert!(matches!(err, ToolError::MissingArgument { ref name } if name == "a"));
        assert_eq!(err.to_string(), "missing required argument 'a'");
    }

    #[tokio::test]
    async fn closure_entry_point_is_callable() {
        let entry = FnEntryPoint::new(Signature::new(["x"]), |args: ToolArgs| async move {
            Ok(args.get("x").cloned().unwrap_or(Value::Null))
        });
        let mut args = ToolArgs::new();
        args.insert("x".into(), json!("hi"));
        assert_eq!(entry.call(args).await.unwrap(), json!("hi"));
    }

    #[test]
    fn str_arg_distinguishes_missing_and_mistyped() {
        let mut args = ToolArgs::new();
        args.insert("n".into(), json!(3));
        assert!(matches!(str_arg(&args, "m"), Err(ToolError::MissingArgument { .. })));
        assert!(matches!(str_arg(&args, "n"), Err(ToolError::Execution(_))));
    }

    #[test]
    fn process_error_mentions_exit_code() {
        let err = ToolError::Process {
            code: Some(3),
            stderr: "bad".into(),
        };
        assert_eq!(err.to_string(), "process exited with code 3: bad");
    }
}
