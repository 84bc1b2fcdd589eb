//! Sorting and grouping by tuple keys
//!
//! Keys compare like tuples: the first differing component decides, using the
//! natural order of its values. Components of different kinds (a string
//! against a number, say) have no natural order and fail the call.
//!
//! Numbers compare by value whatever their representation, so `1`, `1.0` and
//! `-0.0 == 0` tie when sorting and share a group when grouping.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::ResolutionError;
use crate::record::Value;

/// Compare two tuple keys
pub fn compare_keys(left: &[Value], right: &[Value]) -> Result<Ordering, ResolutionError> {
    for (l, r) in left.iter().zip(right) {
        match natural_cmp(l, r) {
            Some(Ordering::Equal) => continue,
            Some(decided) => return Ok(decided),
            None => {
                return Err(ResolutionError::Incomparable {
                    left: l.to_string(),
                    right: r.to_string(),
                });
            }
        }
    }
    Ok(left.len().cmp(&right.len()))
}

/// Natural order of two values, `None` when they cannot be ordered
pub fn natural_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    if left == right {
        return Some(Ordering::Equal);
    }
    match (left, right) {
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        (Value::Number(l), Value::Number(r)) => compare_numbers(l, r),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Array(l), Value::Array(r)) => {
            for (a, b) in l.iter().zip(r) {
                match natural_cmp(a, b)? {
                    Ordering::Equal => continue,
                    decided => return Some(decided),
                }
            }
            Some(l.len().cmp(&r.len()))
        }
        // objects are only ever equal or incomparable
        (Value::Object(l), Value::Object(r)) => {
            let equal = l.len() == r.len()
                && l.iter().all(|(key, a)| {
                    r.get(key)
                        .is_some_and(|b| natural_cmp(a, b) == Some(Ordering::Equal))
                });
            equal.then_some(Ordering::Equal)
        }
        _ => None,
    }
}

fn compare_numbers(left: &serde_json::Number, right: &serde_json::Number) -> Option<Ordering> {
    match (integer(left), integer(right)) {
        (Some(l), Some(r)) => Some(l.cmp(&r)),
        (Some(l), None) => Some(compare_integer_float(l, right.as_f64()?)),
        (None, Some(r)) => Some(compare_integer_float(r, left.as_f64()?).reverse()),
        (None, None) => left.as_f64()?.partial_cmp(&right.as_f64()?),
    }
}

fn integer(number: &serde_json::Number) -> Option<i128> {
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
}

/// Every JSON integer lies in `[-2^63, 2^64)`
const INTEGER_MIN: f64 = -9_223_372_036_854_775_808.0;
const INTEGER_END: f64 = 18_446_744_073_709_551_616.0;

/// Exact comparison of an integer against a finite float
fn compare_integer_float(integer: i128, float: f64) -> Ordering {
    let floor = float.floor();
    if floor < INTEGER_MIN {
        return Ordering::Greater;
    }
    if floor >= INTEGER_END {
        return Ordering::Less;
    }
    // floor is integral and in range, so the cast is exact
    match integer.cmp(&(floor as i128)) {
        Ordering::Equal if float > floor => Ordering::Less,
        decided => decided,
    }
}

/// The float's integer value, when it has one that a JSON integer can hold
fn integral(float: f64) -> Option<i128> {
    (float.fract() == 0.0 && (INTEGER_MIN..INTEGER_END).contains(&float)).then(|| float as i128)
}

/// Total order used to keep the sort consistent once an incomparable pair was seen
fn fallback_cmp(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Array(l), Value::Array(r)) => tuple_fallback(l, r),
        _ => natural_cmp(left, right).unwrap_or_else(|| {
            kind_rank(left)
                .cmp(&kind_rank(right))
                .then_with(|| canonical(left).to_string().cmp(&canonical(right).to_string()))
        }),
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Stable sort of `records` by their precomputed `keys`
pub fn sort_by_keys<S>(
    records: Vec<S>,
    keys: Vec<Vec<Value>>,
) -> Result<Vec<S>, ResolutionError> {
    let mut failure = None;
    let mut keyed: Vec<(Vec<Value>, S)> = keys.into_iter().zip(records).collect();

    keyed.sort_by(|(left, _), (right, _)| match compare_keys(left, right) {
        Ok(ordering) => ordering,
        Err(err) => {
            failure.get_or_insert(err);
            tuple_fallback(left, right)
        }
    });

    match failure {
        Some(err) => Err(err),
        None => Ok(keyed.into_iter().map(|(_, record)| record).collect()),
    }
}

fn tuple_fallback(left: &[Value], right: &[Value]) -> Ordering {
    left.iter()
        .zip(right)
        .map(|(l, r)| fallback_cmp(l, r))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| left.len().cmp(&right.len()))
}

/// Bucket `records` by key equality
///
/// Keys are equal when [`natural_cmp`] finds them equal. Groups come out in
/// the order their first member appeared; members keep their relative order.
pub fn group_by_keys<S>(records: Vec<S>, keys: Vec<Vec<Value>>) -> Vec<Vec<S>> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<S>> = Vec::new();

    for (key, record) in keys.into_iter().zip(records) {
        let normalized: Vec<Value> = key.iter().map(canonical).collect();
        let slot = *index
            .entry(Value::Array(normalized).to_string())
            .or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
        groups[slot].push(record);
    }

    groups
}

/// Rewrite integral floats as integers so equal keys render identically
fn canonical(value: &Value) -> Value {
    match value {
        Value::Number(number) if number.is_f64() => number
            .as_f64()
            .and_then(integral)
            .map(|i| match i64::try_from(i) {
                Ok(i) => Value::from(i),
                Err(_) => Value::from(i as u64),
            })
            .unwrap_or_else(|| value.clone()),
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, value)| (key.clone(), canonical(value)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_compare_across_representations() {
        assert_eq!(natural_cmp(&json!(1), &json!(1.5)), Some(Ordering::Less));
        assert_eq!(natural_cmp(&json!(-1), &json!(u64::MAX)), Some(Ordering::Less));
        assert_eq!(natural_cmp(&json!(2.5), &json!(2)), Some(Ordering::Greater));
    }

    #[test]
    fn test_mixed_kinds_are_incomparable() {
        assert_eq!(natural_cmp(&json!("a"), &json!(1)), None);
        assert_eq!(natural_cmp(&json!(null), &json!(0)), None);
        assert_eq!(natural_cmp(&json!({"a": 1}), &json!({"a": 2})), None);
    }

    #[test]
    fn test_equal_values_compare_equal_whatever_their_kind() {
        assert_eq!(natural_cmp(&json!(null), &json!(null)), Some(Ordering::Equal));
        assert_eq!(natural_cmp(&json!({"a": 1}), &json!({"a": 1})), Some(Ordering::Equal));
    }

    #[test]
    fn test_keys_decided_by_first_difference() {
        let left = vec![json!("Paul Smith"), json!(5)];
        let right = vec![json!("Paul Smith"), json!(17)];
        assert_eq!(compare_keys(&left, &right).unwrap(), Ordering::Less);

        // later components are never compared once an earlier one decides
        let left = vec![json!(1), json!("x")];
        let right = vec![json!(2), json!(0)];
        assert_eq!(compare_keys(&left, &right).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_integer_and_float_of_same_magnitude_tie() {
        let left = vec![json!(1), json!("a")];
        let right = vec![json!(1.0), json!("b")];
        assert_eq!(compare_keys(&left, &right).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_sort_is_stable() {
        let records = vec!["a", "b", "c", "d"];
        let keys = vec![vec![json!(2)], vec![json!(1)], vec![json!(2)], vec![json!(1)]];
        assert_eq!(sort_by_keys(records, keys).unwrap(), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_sort_fails_on_incomparable_keys() {
        let records = vec![1, 2];
        let keys = vec![vec![json!("a")], vec![json!(1)]];
        let err = sort_by_keys(records, keys).unwrap_err();
        assert!(matches!(err, ResolutionError::Incomparable { .. }));
    }

    #[test]
    fn test_group_preserves_first_appearance() {
        let records = vec!["r1", "g1", "g2", "r2"];
        let keys = vec![
            vec![json!("Patricio")],
            vec![json!("God Himself")],
            vec![json!("God Himself")],
            vec![json!("Patricio")],
        ];
        let groups = group_by_keys(records, keys);
        assert_eq!(groups, vec![vec!["r1", "r2"], vec!["g1", "g2"]]);
    }

    #[test]
    fn test_group_merges_numerically_equal_keys() {
        let records = vec!["zero", "negative_zero", "one", "one_float", "two"];
        let keys = vec![
            vec![json!(0.0)],
            vec![json!(-0.0)],
            vec![json!(1)],
            vec![json!(1.0)],
            vec![json!(2)],
        ];
        let groups = group_by_keys(records, keys);
        assert_eq!(
            groups,
            vec![vec!["zero", "negative_zero"], vec!["one", "one_float"], vec!["two"]]
        );
    }

    #[test]
    fn test_group_merges_nested_equal_numbers() {
        let records = vec![1, 2, 3];
        let keys = vec![
            vec![json!({"x": 1, "tags": [2.0]})],
            vec![json!({"x": 1.0, "tags": [2]})],
            vec![json!({"x": 1.5, "tags": [2]})],
        ];
        assert_eq!(group_by_keys(records, keys), vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_objects_equal_by_value() {
        assert_eq!(
            natural_cmp(&json!({"a": 1}), &json!({"a": 1.0})),
            Some(Ordering::Equal)
        );
        assert_eq!(natural_cmp(&json!({"a": 1}), &json!({"b": 1})), None);
    }

    #[test]
    fn test_integer_against_float_is_exact() {
        let two_pow_53 = 9_007_199_254_740_992_i64;
        assert_eq!(
            natural_cmp(&json!(two_pow_53 + 1), &json!(9_007_199_254_740_992.0)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            natural_cmp(&json!(two_pow_53), &json!(9_007_199_254_740_992.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            natural_cmp(&json!(u64::MAX), &json!(18_446_744_073_709_551_616.0)),
            Some(Ordering::Less)
        );
        assert_eq!(
            natural_cmp(&json!(i64::MIN), &json!(-1e19)),
            Some(Ordering::Greater)
        );
        assert_eq!(natural_cmp(&json!(-3), &json!(-2.5)), Some(Ordering::Less));
        assert_eq!(natural_cmp(&json!(-0.0), &json!(0)), Some(Ordering::Equal));
    }

    #[test]
    fn test_sort_of_large_mixed_numbers() {
        let two_pow_53 = 9_007_199_254_740_992_i64;
        let records = vec!["above", "float", "exact"];
        let keys = vec![
            vec![json!(two_pow_53 + 1)],
            vec![json!(9_007_199_254_740_992.0)],
            vec![json!(two_pow_53)],
        ];
        assert_eq!(
            sort_by_keys(records, keys).unwrap(),
            vec!["float", "exact", "above"]
        );
    }

    #[test]
    fn test_group_of_nothing_is_empty() {
        let groups: Vec<Vec<u8>> = group_by_keys(Vec::new(), Vec::new());
        assert!(groups.is_empty());
    }
}
