//! Invocation inside a failure boundary, and normalization of the outcome.
//!
//! Every call ends in exactly one [`InvocationResponse`]. Tool errors, binding
//! failures, panics, timeouts and cancellations all become error envelopes.

use super::resolver::resolve;
use crate::tools::{ToolDefinition, ToolError};
use crate::types::{InvocationResponse, ToolArgs, STATUS_KEY};
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};

/// Used when a tool fails with an empty message.
const FALLBACK_ERROR: &str = "tool failed without an error message";

/// Per-call limits.
#[derive(Debug, Clone, Default)]
pub struct InvokeOptions {
    /// Abort the call after this long.
    pub timeout: Option<Duration>,
    /// Abort the call when this token fires.
    pub cancel: Option<CancellationToken>,
}

impl InvokeOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Invoke `tool` with no time limit.
pub async fn invoke(
    tool: &ToolDefinition,
    injected: &ToolArgs,
    caller: &ToolArgs,
) -> InvocationResponse {
    invoke_with(tool, injected, caller, &InvokeOptions::default()).await
}

/// Invoke `tool` under `options`. Never fails.
pub async fn invoke_with(
    tool: &ToolDefinition,
    injected: &ToolArgs,
    caller: &ToolArgs,
    options: &InvokeOptions,
) -> InvocationResponse {
    let invocation_id = ulid::Ulid::new().to_string();
    let span = info_span!("invoke", tool = tool.name(), invocation_id = %invocation_id);

    async move {
        let started = Instant::now();
        let result = call(tool, injected, caller, options).await;
        let elapsed_ms = started.elapsed().as_millis();
        match &result {
            Ok(_) => debug!("Tool call completed in {} ms", elapsed_ms),
            Err(e) => warn!("Tool call failed after {} ms: {}", elapsed_ms, e),
        }
        normalize(result)
    }
    .instrument(span)
    .await
}

/// Map a call outcome onto the response envelope.
///
/// An object that already carries a `status` key is returned untouched.
pub fn normalize(result: Result<Value, ToolError>) -> InvocationResponse {
    match result {
        Ok(Value::Object(doc)) if doc.contains_key(STATUS_KEY) => {
            InvocationResponse::SelfEnveloped(doc)
        }
        Ok(data) => InvocationResponse::success(data),
        Err(e) => {
            let message = e.to_string();
            if message.trim().is_empty() {
                InvocationResponse::error(FALLBACK_ERROR)
            } else {
                InvocationResponse::error(message)
            }
        }
    }
}

async fn call(
    tool: &ToolDefinition,
    injected: &ToolArgs,
    caller: &ToolArgs,
    options: &InvokeOptions,
) -> Result<Value, ToolError> {
    let args = resolve(tool.signature(), injected, caller);
    tool.signature().bind(&args)?;

    // The call runs as its own task so a panic stays inside it.
    let entry = Arc::clone(tool.entry_point());
    let mut handle = tokio::spawn(async move { entry.call(args).await }.in_current_span());

    let deadline = async {
        match options.timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => std::future::pending::<()>().await,
        }
    };
    let cancelled = async {
        match &options.cancel {
            Some(token) => token.cancelled().await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        joined = &mut handle => flatten_join(tool.name(), joined),
        _ = deadline => {
            handle.abort();
            Err(ToolError::Timeout {
                tool: tool.name().to_string(),
                millis: options.timeout.unwrap_or_default().as_millis(),
            })
        }
        _ = cancelled => {
            handle.abort();
            Err(ToolError::Cancelled {
                tool: tool.name().to_string(),
            })
        }
    }
}

fn flatten_join(
    tool: &str,
    joined: Result<Result<Value, ToolError>, JoinError>,
) -> Result<Value, ToolError> {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(ToolError::Panicked {
            tool: tool.to_string(),
            message: panic_message(e.into_panic()),
        }),
        Err(_) => Err(ToolError::Cancelled {
            tool: tool.to_string(),
        }),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
