//! Array-form filter expressions over feature properties.
//!
//! Category filter predicates are stored as JSON arrays, e.g.
//! `["all", [">=", ["get", "VALUE"], 10], ["<", ["get", "VALUE"], 20]]`.
//! Supported operators: property access (`get`, `has`), comparison
//! (`==`, `!=`, `<`, `<=`, `>`, `>=`), logic (`all`, `any`, `!`), and
//! `literal`. Everything else evaluates to `None`, which a predicate
//! treats as no-match.

use crate::error::{SymbologyError, SymbologyResult};
use crate::feature::Properties;
use serde_json::Value;

/// Evaluate an expression against a property map.
pub fn evaluate(expr: &Value, properties: &Properties) -> Option<Value> {
    match expr {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Some(expr.clone()),
        Value::Array(arr) => evaluate_array(arr, properties),
        Value::Object(_) => Some(expr.clone()),
    }
}

/// Predicate form: non-boolean results and evaluation failures are no-match.
pub fn matches(expr: &Value, properties: &Properties) -> bool {
    matches!(evaluate(expr, properties), Some(Value::Bool(true)))
}

/// Validate an expression tree without evaluating it: every array head must
/// be a known operator. Rejection happens at assignment time, not at draw
/// time.
pub fn validate(expr: &Value) -> SymbologyResult<()> {
    let Value::Array(arr) = expr else {
        return Ok(());
    };
    let Some(op) = arr.first().and_then(Value::as_str) else {
        return Err(SymbologyError::expression(format!(
            "expression array must start with an operator string: {}",
            expr
        )));
    };
    const KNOWN: [&str; 12] = [
        "get", "has", "literal", "==", "!=", "<", "<=", ">", ">=", "all", "any", "!",
    ];
    if !KNOWN.contains(&op) {
        return Err(SymbologyError::expression(format!(
            "unknown operator '{}'",
            op
        )));
    }
    if op == "literal" {
        return Ok(());
    }
    for arg in &arr[1..] {
        validate(arg)?;
    }
    Ok(())
}

fn evaluate_array(arr: &[Value], properties: &Properties) -> Option<Value> {
    let op = arr.first()?.as_str()?;
    match op {
        "get" => {
            let key = arr.get(1)?.as_str()?;
            properties.get(key).cloned()
        }
        "has" => {
            let key = arr.get(1)?.as_str()?;
            Some(Value::Bool(properties.contains_key(key)))
        }
        "literal" => arr.get(1).cloned(),

        "==" => eval_eq(arr, properties).map(Value::Bool),
        "!=" => eval_eq(arr, properties).map(|b| Value::Bool(!b)),
        "<" => eval_cmp(arr, properties, |o| o == std::cmp::Ordering::Less),
        "<=" => eval_cmp(arr, properties, |o| o != std::cmp::Ordering::Greater),
        ">" => eval_cmp(arr, properties, |o| o == std::cmp::Ordering::Greater),
        ">=" => eval_cmp(arr, properties, |o| o != std::cmp::Ordering::Less),

        "all" => {
            for arg in &arr[1..] {
                match evaluate(arg, properties)? {
                    Value::Bool(true) => {}
                    Value::Bool(false) => return Some(Value::Bool(false)),
                    _ => return None,
                }
            }
            Some(Value::Bool(true))
        }
        "any" => {
            for arg in &arr[1..] {
                if let Value::Bool(true) = evaluate(arg, properties)? {
                    return Some(Value::Bool(true));
                }
            }
            Some(Value::Bool(false))
        }
        "!" => match evaluate(arr.get(1)?, properties)? {
            Value::Bool(b) => Some(Value::Bool(!b)),
            _ => None,
        },

        _ => None,
    }
}

fn eval_eq(arr: &[Value], properties: &Properties) -> Option<bool> {
    let a = evaluate(arr.get(1)?, properties)?;
    let b = evaluate(arr.get(2)?, properties)?;
    // Numbers compare numerically so 10 == 10.0.
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return Some(x == y);
    }
    Some(a == b)
}

fn eval_cmp(
    arr: &[Value],
    properties: &Properties,
    accept: impl Fn(std::cmp::Ordering) -> bool,
) -> Option<Value> {
    let a = evaluate(arr.get(1)?, properties)?;
    let b = evaluate(arr.get(2)?, properties)?;
    let ordering = match (&a, &b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?)?,
    };
    Some(Value::Bool(accept(ordering)))
}

/// Build the canonical range predicate a scheme attaches to a category:
/// `low <= field < high`, with the upper bound inclusive for the last
/// category in a scheme.
pub fn range_filter(field: &str, low: f64, high: f64, inclusive_max: bool) -> Value {
    let upper_op = if inclusive_max { "<=" } else { "<" };
    serde_json::json!([
        "all",
        [">=", ["get", field], low],
        [upper_op, ["get", field], high]
    ])
}
