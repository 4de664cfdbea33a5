//! Argument resolution: merge injected and caller arguments, keep only what
//! the entry point declares.

use crate::tools::Signature;
use crate::types::ToolArgs;

/// Compute the exact arguments passed to an entry point.
///
/// Caller values override injected ones with the same key. Keys that are not
/// declared parameters of `signature` are dropped.
pub fn resolve(signature: &Signature, injected: &ToolArgs, caller: &ToolArgs) -> ToolArgs {
    injected
        .iter()
        .chain(caller.iter())
        .filter(|(key, _)| signature.accepts(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn args(value: Value) -> ToolArgs {
        match value {
            Value::Object(map) => map,
            _ => panic!("args must be an object"),
        }
    }

    #[test]
    fn caller_overrides_injected_and_extras_are_dropped() {
        let sig = Signature::new(["a", "b"]);
        let resolved = resolve(
            &sig,
            &args(json!({"a": 1, "b": 2, "c": 3})),
            &args(json!({"b": 20})),
        );
        assert_eq!(Value::Object(resolved), json!({"a": 1, "b": 20}));
    }

    #[test]
    fn undeclared_caller_args_are_dropped() {
        let sig = Signature::new(["message"]);
        let resolved = resolve(
            &sig,
            &ToolArgs::new(),
            &args(json!({"message": "hi", "demo": true})),
        );
        assert_eq!(Value::Object(resolved), json!({"message": "hi"}));
    }

    #[test]
    fn no_declared_params_resolves_to_nothing() {
        let resolved = resolve(
            &Signature::default(),
            &args(json!({"workspace": "/tmp"})),
            &args(json!({"x": 1})),
        );
        assert!(resolved.is_empty());
    }

    #[test]
    fn missing_values_are_not_invented() {
        let sig = Signature::new(["a", "b"]).require(["b"]);
        let resolved = resolve(&sig, &args(json!({"a": 1})), &ToolArgs::new());
        assert_eq!(Value::Object(resolved), json!({"a": 1}));
    }
}
