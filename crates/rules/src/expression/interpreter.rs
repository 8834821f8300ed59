//! Tree-walking interpreter over `serde_json::Value` contexts.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use regex::Regex;
use serde_json::{Number, Value};

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::{type_name, EvalError};

/// Compiled `matches` patterns, keyed by the pattern as written.
#[derive(Debug, Default)]
pub(crate) struct RegexCache {
    compiled: RwLock<HashMap<String, Arc<Regex>>>,
}

impl RegexCache {
    fn get_or_compile(&self, pattern: &str) -> Result<Arc<Regex>, EvalError> {
        if let Some(regex) = self
            .compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(pattern)
        {
            return Ok(Arc::clone(regex));
        }

        // Whole-string match.
        let regex = Regex::new(&format!("^(?:{pattern})$"))
            .map(Arc::new)
            .map_err(|e| EvalError::Runtime(format!("invalid regular expression `{pattern}`: {e}")))?;
        self.compiled
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pattern.to_string(), Arc::clone(&regex));
        Ok(regex)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.compiled.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

pub(crate) fn eval(expr: &Expr, context: &Value, regexes: &RegexCache) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Context => Ok(context.clone()),
        Expr::Property(name) => read_property(context, name, false),
        Expr::Member {
            object,
            property,
            null_safe,
        } => {
            let object = eval(object, context, regexes)?;
            read_property(&object, property, *null_safe)
        }
        Expr::Index { object, index } => {
            let object = eval(object, context, regexes)?;
            let index = eval(index, context, regexes)?;
            read_index(&object, &index)
        }
        Expr::Call {
            receiver,
            method,
            args,
            null_safe,
        } => {
            let receiver = eval(receiver, context, regexes)?;
            if receiver.is_null() {
                if *null_safe {
                    return Ok(Value::Null);
                }
                return Err(EvalError::Runtime(format!("cannot call `{method}()` on null")));
            }
            let args = args
                .iter()
                .map(|arg| eval(arg, context, regexes))
                .collect::<Result<Vec<_>, _>>()?;
            call_method(&receiver, method, &args)
        }
        Expr::Unary { op, operand } => {
            let value = eval(operand, context, regexes)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!as_bool(&value, "!")?)),
                UnaryOp::Negate => number_value(-as_number(&value, "-")?),
            }
        }
        Expr::Binary { op, left, right } => eval_binary(*op, left, right, context, regexes),
        Expr::Ternary {
            condition,
            then_branch,
            else_branch,
        } => {
            if as_bool(&eval(condition, context, regexes)?, "?:")? {
                eval(then_branch, context, regexes)
            } else {
                eval(else_branch, context, regexes)
            }
        }
    }
}

fn eval_binary(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    context: &Value,
    regexes: &RegexCache,
) -> Result<Value, EvalError> {
    // Logical operators short-circuit; the right side is only evaluated when needed.
    match op {
        BinaryOp::And => {
            let lhs = as_bool(&eval(left, context, regexes)?, "&&")?;
            if !lhs {
                return Ok(Value::Bool(false));
            }
            return Ok(Value::Bool(as_bool(&eval(right, context, regexes)?, "&&")?));
        }
        BinaryOp::Or => {
            let lhs = as_bool(&eval(left, context, regexes)?, "||")?;
            if lhs {
                return Ok(Value::Bool(true));
            }
            return Ok(Value::Bool(as_bool(&eval(right, context, regexes)?, "||")?));
        }
        _ => {}
    }

    let lhs = eval(left, context, regexes)?;
    let rhs = eval(right, context, regexes)?;

    match op {
        BinaryOp::Equal => Ok(Value::Bool(values_equal(&lhs, &rhs))),
        BinaryOp::NotEqual => Ok(Value::Bool(!values_equal(&lhs, &rhs))),
        BinaryOp::Less => compare(&lhs, &rhs, "<", |o| o == Ordering::Less),
        BinaryOp::LessEqual => compare(&lhs, &rhs, "<=", |o| o != Ordering::Greater),
        BinaryOp::Greater => compare(&lhs, &rhs, ">", |o| o == Ordering::Greater),
        BinaryOp::GreaterEqual => compare(&lhs, &rhs, ">=", |o| o != Ordering::Less),
        BinaryOp::Matches => regex_match(&lhs, &rhs, regexes),
        BinaryOp::Add => add(&lhs, &rhs),
        BinaryOp::Subtract => number_value(as_number(&lhs, "-")? - as_number(&rhs, "-")?),
        BinaryOp::Multiply => number_value(as_number(&lhs, "*")? * as_number(&rhs, "*")?),
        BinaryOp::Divide => {
            let divisor = as_number(&rhs, "/")?;
            if divisor == 0.0 {
                return Err(EvalError::Runtime("division by zero".to_string()));
            }
            number_value(as_number(&lhs, "/")? / divisor)
        }
        BinaryOp::Modulo => {
            let divisor = as_number(&rhs, "%")?;
            if divisor == 0.0 {
                return Err(EvalError::Runtime("modulo by zero".to_string()));
            }
            number_value(as_number(&lhs, "%")? % divisor)
        }
        BinaryOp::And | BinaryOp::Or => unreachable!("logical operators handled above"),
    }
}

fn read_property(object: &Value, property: &str, null_safe: bool) -> Result<Value, EvalError> {
    match object {
        Value::Object(map) => Ok(map.get(property).cloned().unwrap_or(Value::Null)),
        Value::Null if null_safe => Ok(Value::Null),
        Value::Null => Err(EvalError::Runtime(format!(
            "cannot read property `{property}` of null"
        ))),
        other => Err(EvalError::Type(format!(
            "cannot read property `{property}` of {}",
            type_name(other)
        ))),
    }
}

fn read_index(object: &Value, index: &Value) -> Result<Value, EvalError> {
    match (object, index) {
        (Value::Array(items), Value::Number(n)) => {
            let idx = array_index(n)?;
            Ok(items.get(idx).cloned().unwrap_or(Value::Null))
        }
        (Value::String(s), Value::Number(n)) => {
            let idx = array_index(n)?;
            Ok(s.chars()
                .nth(idx)
                .map(|c| Value::String(c.to_string()))
                .unwrap_or(Value::Null))
        }
        (Value::Object(map), Value::String(key)) => Ok(map.get(key).cloned().unwrap_or(Value::Null)),
        (Value::Null, _) => Err(EvalError::Runtime("cannot index into null".to_string())),
        (object, index) => Err(EvalError::Type(format!(
            "cannot index {} with {}",
            type_name(object),
            type_name(index)
        ))),
    }
}

fn array_index(n: &Number) -> Result<usize, EvalError> {
    n.as_u64()
        .and_then(|i| usize::try_from(i).ok())
        .ok_or_else(|| EvalError::Type(format!("index must be a non-negative integer, got {n}")))
}

fn call_method(receiver: &Value, method: &str, args: &[Value]) -> Result<Value, EvalError> {
    let arity = |expected: usize| -> Result<(), EvalError> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(EvalError::Runtime(format!(
                "`{method}()` expects {expected} argument(s), got {}",
                args.len()
            )))
        }
    };

    match (method, receiver) {
        ("length" | "size", Value::String(s)) => {
            arity(0)?;
            Ok(Value::from(s.chars().count()))
        }
        ("length" | "size", Value::Array(items)) => {
            arity(0)?;
            Ok(Value::from(items.len()))
        }
        ("size", Value::Object(map)) => {
            arity(0)?;
            Ok(Value::from(map.len()))
        }
        ("isEmpty", Value::String(s)) => {
            arity(0)?;
            Ok(Value::Bool(s.is_empty()))
        }
        ("isEmpty", Value::Array(items)) => {
            arity(0)?;
            Ok(Value::Bool(items.is_empty()))
        }
        ("isEmpty", Value::Object(map)) => {
            arity(0)?;
            Ok(Value::Bool(map.is_empty()))
        }
        ("trim", Value::String(s)) => {
            arity(0)?;
            Ok(Value::String(s.trim().to_string()))
        }
        ("toUpperCase", Value::String(s)) => {
            arity(0)?;
            Ok(Value::String(s.to_uppercase()))
        }
        ("toLowerCase", Value::String(s)) => {
            arity(0)?;
            Ok(Value::String(s.to_lowercase()))
        }
        ("startsWith", Value::String(s)) => {
            arity(1)?;
            Ok(Value::Bool(s.starts_with(as_str(&args[0], "startsWith")?)))
        }
        ("endsWith", Value::String(s)) => {
            arity(1)?;
            Ok(Value::Bool(s.ends_with(as_str(&args[0], "endsWith")?)))
        }
        ("contains", Value::String(s)) => {
            arity(1)?;
            Ok(Value::Bool(s.contains(as_str(&args[0], "contains")?)))
        }
        ("contains", Value::Array(items)) => {
            arity(1)?;
            Ok(Value::Bool(items.iter().any(|item| values_equal(item, &args[0]))))
        }
        ("contains", Value::Object(map)) => {
            arity(1)?;
            Ok(Value::Bool(map.contains_key(as_str(&args[0], "contains")?)))
        }
        (method, receiver) => Err(EvalError::Runtime(format!(
            "unknown method `{method}()` on {}",
            type_name(receiver)
        ))),
    }
}

fn as_bool(value: &Value, op: &str) -> Result<bool, EvalError> {
    value.as_bool().ok_or_else(|| {
        EvalError::Type(format!("`{op}` expects boolean, got {}", type_name(value)))
    })
}

fn as_number(value: &Value, op: &str) -> Result<f64, EvalError> {
    value.as_f64().ok_or_else(|| {
        EvalError::Type(format!("`{op}` expects number, got {}", type_name(value)))
    })
}

fn as_str<'a>(value: &'a Value, op: &str) -> Result<&'a str, EvalError> {
    value.as_str().ok_or_else(|| {
        EvalError::Type(format!("`{op}` expects string, got {}", type_name(value)))
    })
}

/// Integral results come back as JSON integers so `2 * 3 == 6` holds structurally.
fn number_value(n: f64) -> Result<Value, EvalError> {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        return Ok(Value::from(n as i64));
    }
    Number::from_f64(n)
        .map(Value::Number)
        .ok_or_else(|| EvalError::Runtime(format!("arithmetic produced a non-finite number ({n})")))
}

fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => lhs == rhs,
    }
}

fn compare(
    lhs: &Value,
    rhs: &Value,
    op: &str,
    accept: impl Fn(Ordering) -> bool,
) -> Result<Value, EvalError> {
    let ordering = match (lhs, rhs) {
        // Ordering against null is never satisfied.
        (Value::Null, _) | (_, Value::Null) => return Ok(Value::Bool(false)),
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
            match a.partial_cmp(&b) {
                Some(ordering) => ordering,
                None => return Ok(Value::Bool(false)),
            }
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => {
            return Err(EvalError::Type(format!(
                "cannot compare {} {op} {}",
                type_name(lhs),
                type_name(rhs)
            )))
        }
    };
    Ok(Value::Bool(accept(ordering)))
}

fn regex_match(lhs: &Value, rhs: &Value, regexes: &RegexCache) -> Result<Value, EvalError> {
    let pattern = as_str(rhs, "matches")?;
    let subject = match lhs {
        Value::Null => return Ok(Value::Bool(false)),
        Value::String(s) => s.as_str(),
        other => {
            return Err(EvalError::Type(format!(
                "`matches` expects string, got {}",
                type_name(other)
            )))
        }
    };
    let regex = regexes.get_or_compile(pattern)?;
    Ok(Value::Bool(regex.is_match(subject)))
}

fn add(lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    match (lhs, rhs) {
        (Value::Number(_), Value::Number(_)) => {
            number_value(as_number(lhs, "+")? + as_number(rhs, "+")?)
        }
        (Value::String(a), other) => Ok(Value::String(format!("{a}{}", display(other)))),
        (other, Value::String(b)) => Ok(Value::String(format!("{}{b}", display(other)))),
        _ => Err(EvalError::Type(format!(
            "cannot add {} and {}",
            type_name(lhs),
            type_name(rhs)
        ))),
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::parser::parse;
    use serde_json::json;

    fn run(expr: &str, context: &Value) -> Result<Value, EvalError> {
        eval(&parse(expr).unwrap(), context, &RegexCache::default())
    }

    #[test]
    fn property_lookup_and_comparison() {
        let ctx = json!({"age": 16, "name": "Ann"});
        assert_eq!(run("age >= 18", &ctx).unwrap(), json!(false));
        assert_eq!(run("age < 18 && name == 'Ann'", &ctx).unwrap(), json!(true));
        assert_eq!(run("missing == null", &ctx).unwrap(), json!(true));
    }

    #[test]
    fn ordering_against_null_is_false() {
        let ctx = json!({"age": null});
        assert_eq!(run("age >= 18", &ctx).unwrap(), json!(false));
        assert_eq!(run("age < 18", &ctx).unwrap(), json!(false));
    }

    #[test]
    fn member_access_on_null_errors_unless_null_safe() {
        let ctx = json!({"address": null});
        assert!(matches!(run("address.city == 'x'", &ctx), Err(EvalError::Runtime(_))));
        assert_eq!(run("address?.city == null", &ctx).unwrap(), json!(true));
        assert_eq!(run("address?.trim() == null", &ctx).unwrap(), json!(true));
    }

    #[test]
    fn short_circuit_skips_failing_right_side() {
        let ctx = json!({"a": null});
        assert_eq!(run("a != null && a.b > 1", &ctx).unwrap(), json!(false));
        assert_eq!(run("a == null || a.b > 1", &ctx).unwrap(), json!(true));
    }

    #[test]
    fn arithmetic_and_concatenation() {
        let ctx = json!({"n": 7, "s": "ab"});
        assert_eq!(run("n * 2 + 1", &ctx).unwrap(), json!(15));
        assert_eq!(run("n / 2", &ctx).unwrap(), json!(3.5));
        assert_eq!(run("n % 4", &ctx).unwrap(), json!(3));
        assert_eq!(run("-n", &ctx).unwrap(), json!(-7));
        assert_eq!(run("s + n", &ctx).unwrap(), json!("ab7"));
        assert!(run("n / 0", &ctx).is_err());
        assert!(run("s - 1", &ctx).is_err());
    }

    #[test]
    fn string_and_collection_methods() {
        let ctx = json!({"name": "  Ada ", "tags": ["x", "y"], "meta": {"k": 1}});
        assert_eq!(run("name.trim().length()", &ctx).unwrap(), json!(3));
        assert_eq!(run("name.trim().toUpperCase()", &ctx).unwrap(), json!("ADA"));
        assert_eq!(run("name.contains('Ad')", &ctx).unwrap(), json!(true));
        assert_eq!(run("tags.size() == 2 && tags.contains('y')", &ctx).unwrap(), json!(true));
        assert_eq!(run("meta.contains('k') && !meta.isEmpty()", &ctx).unwrap(), json!(true));
        assert_eq!(run("tags[1]", &ctx).unwrap(), json!("y"));
        assert_eq!(run("tags[5]", &ctx).unwrap(), Value::Null);
        assert!(run("name.reverse()", &ctx).is_err());
        assert!(run("name.startsWith()", &ctx).is_err());
    }

    #[test]
    fn regex_matches_whole_string() {
        let ctx = json!({"code": "AB-123", "empty": null});
        assert_eq!(run("code matches '[A-Z]{2}-\\d+'", &ctx).unwrap(), json!(true));
        assert_eq!(run("code matches '\\d+'", &ctx).unwrap(), json!(false));
        assert_eq!(run("empty matches '.*'", &ctx).unwrap(), json!(false));
        assert!(run("code matches '('", &ctx).is_err());
    }

    #[test]
    fn patterns_compile_once_per_cache() {
        let regexes = RegexCache::default();
        let expr = parse("code matches '[A-Z]{2}-\\d+'").unwrap();
        for code in ["AB-1", "CD-22", "nope"] {
            eval(&expr, &json!({"code": code}), &regexes).unwrap();
        }
        assert_eq!(regexes.len(), 1);

        let broken = parse("code matches '('").unwrap();
        assert!(eval(&broken, &json!({"code": "x"}), &regexes).is_err());
        assert_eq!(regexes.len(), 1);
    }

    #[test]
    fn context_variable_and_ternary() {
        assert_eq!(run("#this > 3 ? 'big' : 'small'", &json!(5)).unwrap(), json!("big"));
        assert_eq!(run("#root.length() == 2", &json!("hi")).unwrap(), json!(true));
    }

    #[test]
    fn logical_operators_require_booleans() {
        let ctx = json!({"n": 1});
        assert!(matches!(run("n && true", &ctx), Err(EvalError::Type(_))));
        assert!(matches!(run("!n", &ctx), Err(EvalError::Type(_))));
        assert!(matches!(run("n > 'a'", &ctx), Err(EvalError::Type(_))));
    }

    #[test]
    fn property_of_scalar_context_is_a_type_error() {
        assert!(matches!(run("age > 1", &json!(3)), Err(EvalError::Type(_))));
    }
}
