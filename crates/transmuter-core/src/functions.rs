//! Built-in functions available to declarative definitions
//!
//! # Value functions (`apply`)
//!
//! `identity`, `to_string`, `to_number`, `upper`, `lower`, `trim`, `length`,
//! `is_null`, `not`, `date`
//!
//! # List reducers (`reduce` with `field`)
//!
//! `collect`, `first`, `last`, `count`, `sum`, `mean`, `min`, `max`,
//! `distinct`, `normalize`, `join`
//!
//! # Group reducers (`reduce` without `field`)
//!
//! `count`, `collect`, `first`, `last`
//!
//! # Extractors
//!
//! - `template` - Jinja template rendered against the record, with `context`
//!   and `constants` in scope. Those names, and `record`, take precedence over
//!   record fields of the same name; `record.<field>` always reaches the field.
//! - `path` - dotted path into nested objects and arrays

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use minijinja::{Environment, UndefinedBehavior};

use crate::binding::{Callable, FnResult};
use crate::error::{BoxError, Error, Result};
use crate::ordering::natural_cmp;
use crate::record::Value;

const TEMPLATE_NAME: &str = "extractor";

/// Look up a value function by name
pub fn value_function(name: &str) -> Result<Callable<Value>> {
    let f: fn(&Value) -> FnResult = match name {
        "identity" => |v| Ok(v.clone()),
        "to_string" => to_string,
        "to_number" => to_number,
        "upper" => |v| Ok(Value::String(as_str("upper", v)?.to_uppercase())),
        "lower" => |v| Ok(Value::String(as_str("lower", v)?.to_lowercase())),
        "trim" => |v| Ok(Value::String(as_str("trim", v)?.trim().to_string())),
        "length" => length,
        "is_null" => |v| Ok(Value::Bool(v.is_null())),
        "not" => |v| match v {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(format!("not: expected a boolean, got {}", other).into()),
        },
        "date" => date,
        _ => {
            return Err(Error::UnknownFunction {
                kind: "value",
                name: name.to_string(),
            });
        }
    };
    Ok(Callable::function(f))
}

/// Look up a reducer over the values of one field
pub fn list_function(name: &str) -> Result<Callable<[Value]>> {
    let f: fn(&[Value]) -> FnResult = match name {
        "collect" => |values| Ok(Value::Array(values.to_vec())),
        "first" => |values| Ok(values.first().cloned().unwrap_or(Value::Null)),
        "last" => |values| Ok(values.last().cloned().unwrap_or(Value::Null)),
        "count" => |values| Ok(Value::from(values.len())),
        "sum" => sum,
        "mean" => |values| Ok(float(mean(values)?)),
        "min" => |values| extreme(values, Ordering::Less),
        "max" => |values| extreme(values, Ordering::Greater),
        "distinct" => distinct,
        "normalize" => normalize,
        "join" => join,
        _ => {
            return Err(Error::UnknownFunction {
                kind: "list",
                name: name.to_string(),
            });
        }
    };
    Ok(Callable::function(f))
}

/// Look up a reducer over whole records of a group
pub fn group_function(name: &str) -> Result<Callable<[Value]>> {
    let f: fn(&[Value]) -> FnResult = match name {
        "count" => |records| Ok(Value::from(records.len())),
        "collect" => |records| Ok(Value::Array(records.to_vec())),
        "first" => |records| Ok(records.first().cloned().unwrap_or(Value::Null)),
        "last" => |records| Ok(records.last().cloned().unwrap_or(Value::Null)),
        _ => {
            return Err(Error::UnknownFunction {
                kind: "group",
                name: name.to_string(),
            });
        }
    };
    Ok(Callable::function(f))
}

/// Compile a Jinja template into a record extractor
///
/// Record fields are top-level variables, next to `context`, `constants` and
/// `record` (the whole record). A field named like one of those three is
/// shadowed and must be read as `record.<field>`.
///
/// The template is checked for syntax errors here; undefined variables fail
/// when a record is rendered.
pub fn template_extractor(source: &str) -> Result<Callable<Value>> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.add_template_owned(TEMPLATE_NAME, source.to_string())?;
    let env = Arc::new(env);

    Ok(Callable::method(move |this, record: &Value| {
        let template = env.get_template(TEMPLATE_NAME)?;
        let rendered = template.render(minijinja::context! {
            context => this.context().as_fields(),
            constants => this.constants(),
            record => record,
            ..minijinja::Value::from_serialize(record)
        })?;
        Ok(Value::String(rendered))
    }))
}

/// Build an extractor following a dotted path such as `customer.address.city`
pub fn path_extractor(path: &str) -> Callable<Value> {
    let segments: Vec<String> = path.split('.').map(str::to_string).collect();
    let path = path.to_string();

    Callable::function(move |record: &Value| {
        segments
            .iter()
            .try_fold(record, |current, segment| match current {
                Value::Object(obj) => obj.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })
            .cloned()
            .ok_or_else(|| format!("path '{}' not found in record", path).into())
    })
}

fn as_str<'v>(function: &str, value: &'v Value) -> std::result::Result<&'v str, BoxError> {
    value
        .as_str()
        .ok_or_else(|| format!("{}: expected a string, got {}", function, value).into())
}

fn as_f64(function: &str, value: &Value) -> std::result::Result<f64, BoxError> {
    value
        .as_f64()
        .ok_or_else(|| format!("{}: expected a number, got {}", function, value).into())
}

fn float(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn to_string(value: &Value) -> FnResult {
    Ok(match value {
        Value::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    })
}

fn to_number(value: &Value) -> FnResult {
    match value {
        Value::Number(_) => Ok(value.clone()),
        Value::Bool(b) => Ok(Value::from(u8::from(*b))),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Ok(Value::from(i))
            } else {
                let f: f64 = s
                    .parse()
                    .map_err(|_| format!("to_number: cannot parse '{}'", s))?;
                Ok(float(f))
            }
        }
        other => Err(format!("to_number: cannot convert {}", other).into()),
    }
}

fn length(value: &Value) -> FnResult {
    let len = match value {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(obj) => obj.len(),
        other => return Err(format!("length: {} has no length", other).into()),
    };
    Ok(Value::from(len))
}

fn date(value: &Value) -> FnResult {
    let s = as_str("date", value)?;
    let day: NaiveDate = match DateTime::parse_from_rfc3339(s) {
        Ok(timestamp) => timestamp.date_naive(),
        Err(_) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .map(|timestamp| timestamp.date())
            .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
            .map_err(|e| format!("date: cannot parse '{}': {}", s, e))?,
    };
    Ok(Value::String(day.format("%Y-%m-%d").to_string()))
}

fn sum(values: &[Value]) -> FnResult {
    if values.iter().all(|v| v.is_i64()) {
        let total = values
            .iter()
            .filter_map(Value::as_i64)
            .try_fold(0i64, i64::checked_add)
            .ok_or("sum: integer overflow")?;
        return Ok(Value::from(total));
    }

    let mut total = 0.0;
    for value in values {
        total += as_f64("sum", value)?;
    }
    Ok(float(total))
}

fn mean(values: &[Value]) -> std::result::Result<f64, BoxError> {
    if values.is_empty() {
        return Err("mean: no values".into());
    }
    let mut total = 0.0;
    for value in values {
        total += as_f64("mean", value)?;
    }
    Ok(total / values.len() as f64)
}

fn extreme(values: &[Value], wanted: Ordering) -> FnResult {
    let mut best: Option<&Value> = None;
    for value in values {
        best = match best {
            None => Some(value),
            Some(current) => match natural_cmp(value, current) {
                Some(ordering) if ordering == wanted => Some(value),
                Some(_) => Some(current),
                None => {
                    return Err(format!("cannot compare {} and {}", value, current).into());
                }
            },
        };
    }
    Ok(best.cloned().unwrap_or(Value::Null))
}

fn distinct(values: &[Value]) -> FnResult {
    let mut seen: Vec<Value> = Vec::new();
    for value in values {
        if !seen.contains(value) {
            seen.push(value.clone());
        }
    }
    Ok(Value::Array(seen))
}

fn normalize(values: &[Value]) -> FnResult {
    let average = mean(values)?;
    if average == 0.0 {
        return Err("normalize: mean is zero".into());
    }
    values
        .iter()
        .map(|v| Ok(float(as_f64("normalize", v)? / average)))
        .collect::<std::result::Result<Vec<_>, BoxError>>()
        .map(Value::Array)
}

fn join(values: &[Value]) -> FnResult {
    let parts = values
        .iter()
        .map(|v| as_str("join", v))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Value::String(parts.join(", ")))
}
