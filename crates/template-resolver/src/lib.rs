//! Template Resolver
//!
//! Walks a nested JSON value and substitutes whole-string `{{path.dotted}}`
//! tokens against an [`EvaluationContext`]. Resolution is pure and
//! side-effect-free: the same `(value, context)` pair always resolves to the
//! same output, and resolving an already-resolved value is a no-op.

use common::types::{EvaluationContext, JsonValue};
use serde_json::{Map, Value};

/// Resolve every `{{a.b.c}}` token in `value` against `context`.
///
/// - Objects and arrays are walked recursively.
/// - A string is substituted only when it is an *exact* `{{...}}` match
///   (whitespace inside the braces is trimmed); embedded templates such as
///   `"hello {{x}}"` are left untouched.
/// - An unresolved dotted path yields `null` rather than failing.
pub fn resolve(value: &JsonValue, context: &EvaluationContext) -> JsonValue {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), resolve(v, context));
            }
            Value::Object(out)
        }
        Value::Array(items) => items.iter().map(|v| resolve(v, context)).collect(),
        Value::String(s) => match template_expr(s) {
            Some(expr) => eval_path(expr, context),
            None => value.clone(),
        },
        other => other.clone(),
    }
}

/// Returns the trimmed inner expression if `s` is an exact `{{...}}` template,
/// `None` otherwise.
fn template_expr(s: &str) -> Option<&str> {
    let rest = s.strip_prefix("{{")?;
    let expr = rest.strip_suffix("}}")?;
    Some(expr.trim())
}

/// Evaluate a dotted path (`results.1.result.status`) against the context.
///
/// The context is first turned into a JSON object (`{results, trigger}`) so
/// the same object-descent rule applies uniformly: at each path segment, if
/// the current value is an object, descend into the named field; otherwise
/// the whole path resolves to `null`.
fn eval_path(expr: &str, context: &EvaluationContext) -> JsonValue {
    let context_value = serde_json::to_value(context).unwrap_or(Value::Null);
    let mut current = &context_value;
    for segment in expr.split('.') {
        match current.as_object().and_then(|m| m.get(segment)) {
            Some(next) => current = next,
            None => return Value::Null,
        }
    }
    current.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn ctx_with_result(node_id: &str, result: Value) -> EvaluationContext {
        let mut results = HashMap::new();
        results.insert(node_id.to_string(), result);
        EvaluationContext {
            results,
            trigger: None,
        }
    }

    #[test]
    fn resolves_dotted_path_against_results() {
        let ctx = ctx_with_result("1", json!({"status": "processed"}));
        let resolved = resolve(&json!("{{results.1.status}}"), &ctx);
        assert_eq!(resolved, json!("processed"));
    }

    #[test]
    fn unresolved_path_yields_null() {
        let ctx = EvaluationContext::default();
        let resolved = resolve(&json!("{{results.99.status}}"), &ctx);
        assert_eq!(resolved, Value::Null);
    }

    #[test]
    fn embedded_template_is_left_untouched() {
        let ctx = ctx_with_result("1", json!({"status": "processed"}));
        let input = json!("hello {{results.1.status}}");
        assert_eq!(resolve(&input, &ctx), input);
    }

    #[test]
    fn recurses_into_objects_and_arrays() {
        let ctx = ctx_with_result("1", json!({"status": "processed"}));
        let input = json!({
            "message": "{{results.1.status}}",
            "list": ["{{results.1.status}}", "literal"],
        });
        let resolved = resolve(&input, &ctx);
        assert_eq!(
            resolved,
            json!({"message": "processed", "list": ["processed", "literal"]})
        );
    }

    #[test]
    fn non_template_values_pass_through_unchanged() {
        let ctx = EvaluationContext::default();
        let input = json!({"a": 1, "b": true, "c": null, "d": 1.5});
        assert_eq!(resolve(&input, &ctx), input);
    }

    #[test]
    fn resolution_is_idempotent_when_no_templates_present() {
        let ctx = ctx_with_result("1", json!({"status": "processed"}));
        let input = json!({"a": [1, 2, "plain"], "b": {"c": "d"}});
        let once = resolve(&input, &ctx);
        let twice = resolve(&once, &ctx);
        assert_eq!(once, twice);
        assert_eq!(once, input);
    }

    #[test]
    fn re_resolving_a_resolved_value_is_a_fixed_point() {
        let ctx = ctx_with_result("1", json!({"status": "processed"}));
        let input = json!("{{results.1.status}}");
        let once = resolve(&input, &ctx);
        let twice = resolve(&once, &ctx);
        assert_eq!(once, twice);
    }
}
