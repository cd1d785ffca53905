// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Filter evaluation, sorting, pagination, and attribute projection over the
//! `serde_json::Value` view of a resource (the same dynamic view
//! `response::SingleResourceResponse` already builds from a typed
//! `Resource`).

use chrono::DateTime;
use serde_json::Value;

use crate::filter::{AttrPath, CompareOp, Filter, FilterValue};

/// Resolve an attribute path against a resource's JSON object. A URI-
/// qualified path first looks inside a sub-object keyed by that URI (the
/// way extension attributes are nested, per the Enterprise User schema),
/// falling back to a top-level lookup so core-schema-qualified paths (e.g.
/// `urn:...:User:userName`) still resolve against the flat core attributes.
pub fn resolve<'a>(resource: &'a Value, path: &AttrPath) -> Option<&'a Value> {
    let obj = resource.as_object()?;

    let base = match &path.uri {
        Some(uri) => obj.get(uri.as_str()).and_then(Value::as_object).or(Some(obj)),
        None => Some(obj),
    }?;

    let attr = find_case_insensitive(base, &path.attr)?;

    match &path.sub_attr {
        Some(sub) => {
            let sub_obj = attr.as_object()?;
            find_case_insensitive(sub_obj, sub)
        }
        None => Some(attr),
    }
}

fn find_case_insensitive<'a>(
    map: &'a serde_json::Map<String, Value>,
    key: &str,
) -> Option<&'a Value> {
    map.get(key).or_else(|| {
        map.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v)
    })
}

/// Evaluate a filter against a resource's JSON representation.
pub fn evaluate(filter: &Filter, resource: &Value) -> bool {
    match filter {
        Filter::Compare { path, op, value } => {
            eval_compare(resource, path, *op, value)
        }
        Filter::Present { path } => eval_present(resource, path),
        Filter::And(l, r) => evaluate(l, resource) && evaluate(r, resource),
        Filter::Or(l, r) => evaluate(l, resource) || evaluate(r, resource),
        Filter::Not(inner) => !evaluate(inner, resource),
        Filter::ValuePath { path, filter } => {
            eval_value_path(resource, path, filter)
        }
    }
}

fn eval_present(resource: &Value, path: &AttrPath) -> bool {
    match resolve(resource, path) {
        None | Some(Value::Null) => false,
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn eval_value_path(resource: &Value, path: &AttrPath, inner: &Filter) -> bool {
    match resolve(resource, path) {
        Some(Value::Array(items)) => {
            items.iter().any(|item| evaluate(inner, item))
        }
        Some(other) => evaluate(inner, other),
        None => false,
    }
}

fn eval_compare(
    resource: &Value,
    path: &AttrPath,
    op: CompareOp,
    value: &FilterValue,
) -> bool {
    let resolved = resolve(resource, path);

    // Multi-valued attributes without a value filter: match if any element
    // compares true (used by bare `emails.value eq "..."`-style top level
    // compares against arrays of primitives).
    if let Some(Value::Array(items)) = resolved {
        return items.iter().any(|item| compare_scalar(Some(item), op, value));
    }

    compare_scalar(resolved, op, value)
}

fn compare_scalar(
    resolved: Option<&Value>,
    op: CompareOp,
    value: &FilterValue,
) -> bool {
    match op {
        CompareOp::Eq => values_equal(resolved, value),
        CompareOp::Ne => !values_equal(resolved, value),
        CompareOp::Co | CompareOp::Sw | CompareOp::Ew => {
            let (Some(Value::String(s)), FilterValue::Str(v)) =
                (resolved, value)
            else {
                return false;
            };
            match op {
                CompareOp::Co => s.contains(v.as_str()),
                CompareOp::Sw => s.starts_with(v.as_str()),
                CompareOp::Ew => s.ends_with(v.as_str()),
                _ => unreachable!(),
            }
        }
        CompareOp::Gt | CompareOp::Lt | CompareOp::Ge | CompareOp::Le => {
            ordered_compare(resolved, op, value)
        }
    }
}

/// `eq`/`ne` null-handling: an absent attribute or JSON null is `eq null`,
/// and never `eq` any other literal.
fn values_equal(resolved: Option<&Value>, value: &FilterValue) -> bool {
    match (resolved, value) {
        (None, FilterValue::Null) => true,
        (Some(Value::Null), FilterValue::Null) => true,
        (None, _) | (Some(Value::Null), _) => false,
        (Some(Value::String(s)), FilterValue::Str(v)) => s == v,
        (Some(Value::Bool(b)), FilterValue::Bool(v)) => b == v,
        (Some(Value::Number(n)), FilterValue::Num(v)) => {
            n.as_f64().map(|n| n == *v).unwrap_or(false)
        }
        _ => false,
    }
}

fn ordered_compare(
    resolved: Option<&Value>,
    op: CompareOp,
    value: &FilterValue,
) -> bool {
    let ordering = match (resolved, value) {
        (Some(Value::Number(n)), FilterValue::Num(v)) => {
            n.as_f64().map(|n| n.partial_cmp(v))
        }
        (Some(Value::String(s)), FilterValue::Str(v)) => {
            if let (Some(a), Some(b)) =
                (DateTime::parse_from_rfc3339(s).ok(), parse_rfc3339_loose(v))
            {
                Some(Some(a.cmp(&b)))
            } else {
                Some(Some(s.as_str().cmp(v.as_str())))
            }
        }
        _ => None,
    };

    let Some(Some(ordering)) = ordering else {
        return false;
    };

    match op {
        CompareOp::Gt => ordering.is_gt(),
        CompareOp::Lt => ordering.is_lt(),
        CompareOp::Ge => ordering.is_ge(),
        CompareOp::Le => ordering.is_le(),
        _ => unreachable!(),
    }
}

fn parse_rfc3339_loose(
    s: &str,
) -> Option<DateTime<chrono::FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

/// Sort order per RFC 7644 §3.4.2.3: dotted path, undefined sorts before
/// defined, codepoint string ordering, numeric ordering for numbers, date
/// ordering when both sides parse as RFC 3339 timestamps, `false` before
/// `true`.
pub fn sort_resources(
    resources: &mut [Value],
    sort_by: &AttrPath,
    ascending: bool,
) {
    resources.sort_by(|a, b| {
        let av = resolve(a, sort_by);
        let bv = resolve(b, sort_by);
        let ordering = compare_sort_values(av, bv);
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

/// Exposes the ordering [`sort_resources`] uses internally so callers that
/// need to sort a collection of something-other-than-bare-`Value`s (for
/// example an adapter sorting `StoredParts<R>` alongside their JSON view)
/// can reuse the same comparison rules instead of re-deriving them.
pub fn sort_key_cmp(
    a: Option<&Value>,
    b: Option<&Value>,
) -> std::cmp::Ordering {
    compare_sort_values(a, b)
}

fn compare_sort_values(
    a: Option<&Value>,
    b: Option<&Value>,
) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    let is_defined = |v: Option<&Value>| !matches!(v, None | Some(Value::Null));

    match (is_defined(a), is_defined(b)) {
        (false, false) => return Ordering::Equal,
        (false, true) => return Ordering::Less,
        (true, false) => return Ordering::Greater,
        (true, true) => {}
    }

    match (a.unwrap(), b.unwrap()) {
        (Value::String(x), Value::String(y)) => {
            match (
                DateTime::parse_from_rfc3339(x).ok(),
                DateTime::parse_from_rfc3339(y).ok(),
            ) {
                (Some(dx), Some(dy)) => dx.cmp(&dy),
                _ => x.cmp(y),
            }
        }
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .zip(y.as_f64())
            .and_then(|(x, y)| x.partial_cmp(&y))
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// A 1-based, pre-pagination-count paginated slice, per RFC 7644 §3.4.2.
pub struct Page<'a> {
    pub items: &'a [Value],
    pub start_index: usize,
    pub total_results: usize,
}

pub fn paginate(
    resources: &[Value],
    start_index: Option<usize>,
    count: Option<usize>,
) -> Page<'_> {
    let total_results = resources.len();
    // startIndex is 1-based; values less than 1 are treated as 1.
    let start_index = start_index.unwrap_or(1).max(1);
    let skip = start_index.saturating_sub(1);

    if skip >= resources.len() {
        return Page { items: &[], start_index, total_results };
    }

    let slice = &resources[skip..];
    let items = match count {
        Some(count) => &slice[..count.min(slice.len())],
        None => slice,
    };

    Page { items, start_index, total_results }
}

/// Project a resource's JSON object down to only `attributes`, or down to
/// everything *except* `excluded_attributes`. Core attributes (`id`,
/// `externalId`, `meta`, `schemas`) are always retained unless explicitly
/// named in `excluded_attributes`. Requesting or excluding a parent
/// attribute implies all of its sub-attributes; requesting a sub-attribute
/// implies keeping its parent object (with only that sub-attribute inside).
pub fn project(
    resource: &Value,
    attributes: &[String],
    excluded_attributes: &[String],
) -> Value {
    let Some(obj) = resource.as_object() else {
        return resource.clone();
    };

    const ALWAYS_INCLUDED: &[&str] = &["id", "externalId", "meta", "schemas"];

    if !attributes.is_empty() {
        let mut out = serde_json::Map::new();
        for (key, val) in obj {
            if ALWAYS_INCLUDED.contains(&key.as_str())
                && !excluded_attributes
                    .iter()
                    .any(|e| e.eq_ignore_ascii_case(key))
            {
                out.insert(key.clone(), val.clone());
                continue;
            }
            if let Some(projected) = project_one(key, val, attributes) {
                out.insert(key.clone(), projected);
            }
        }
        return Value::Object(out);
    }

    if !excluded_attributes.is_empty() {
        let mut out = serde_json::Map::new();
        for (key, val) in obj {
            if excluded_attributes.iter().any(|e| e.eq_ignore_ascii_case(key)) {
                continue;
            }
            out.insert(key.clone(), val.clone());
        }
        return Value::Object(out);
    }

    resource.clone()
}

fn project_one(key: &str, val: &Value, attributes: &[String]) -> Option<Value> {
    for attr in attributes {
        let mut parts = attr.splitn(2, '.');
        let top = parts.next().unwrap();
        if !top.eq_ignore_ascii_case(key) {
            continue;
        }
        return match parts.next() {
            None => Some(val.clone()),
            Some(sub) => val.as_object().map(|sub_obj| {
                let mut out = serde_json::Map::new();
                if let Some(v) = find_case_insensitive(sub_obj, sub) {
                    out.insert(sub.to_string(), v.clone());
                }
                Value::Object(out)
            }),
        };
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::filter::parse_filter;
    use serde_json::json;

    #[test]
    fn eq_matches_string() {
        let resource = json!({"userName": "bjensen"});
        let f = parse_filter(r#"userName eq "bjensen""#).unwrap();
        assert!(evaluate(&f, &resource));
    }

    #[test]
    fn eq_null_matches_absent_attribute() {
        let resource = json!({"userName": "bjensen"});
        let f = parse_filter("nickName eq null").unwrap();
        assert!(evaluate(&f, &resource));
    }

    #[test]
    fn co_sw_ew_are_string_only() {
        let resource = json!({"userName": "bjensen", "age": 42});
        assert!(evaluate(
            &parse_filter(r#"userName co "jens""#).unwrap(),
            &resource
        ));
        assert!(evaluate(
            &parse_filter(r#"userName sw "bj""#).unwrap(),
            &resource
        ));
        assert!(evaluate(
            &parse_filter(r#"userName ew "sen""#).unwrap(),
            &resource
        ));
        assert!(!evaluate(&parse_filter(r#"age co "4""#).unwrap(), &resource));
    }

    #[test]
    fn value_path_matches_any_array_element() {
        let resource = json!({
            "emails": [
                {"type": "work", "value": "a@example.com"},
                {"type": "home", "value": "b@example.com"}
            ]
        });
        let f = parse_filter(r#"emails[type eq "home"]"#).unwrap();
        assert!(evaluate(&f, &resource));
        let f = parse_filter(r#"emails[type eq "mobile"]"#).unwrap();
        assert!(!evaluate(&f, &resource));
    }

    #[test]
    fn pr_requires_non_empty() {
        assert!(eval_present(&json!({"title": "x"}), &AttrPath::simple("title")));
        assert!(!eval_present(&json!({"title": ""}), &AttrPath::simple("title")));
        assert!(!eval_present(&json!({}), &AttrPath::simple("title")));
        assert!(!eval_present(
            &json!({"emails": []}),
            &AttrPath::simple("emails")
        ));
    }

    #[test]
    fn sort_undefined_first_then_codepoint_order() {
        let mut resources = vec![
            json!({"userName": "bob"}),
            json!({}),
            json!({"userName": "alice"}),
        ];
        sort_resources(&mut resources, &AttrPath::simple("userName"), true);
        assert_eq!(resources[0], json!({}));
        assert_eq!(resources[1]["userName"], "alice");
        assert_eq!(resources[2]["userName"], "bob");
    }

    #[test]
    fn sort_ascending_by_nested_sub_attribute() {
        let mut resources = vec![
            json!({"name": {"familyName": "Smith"}}),
            json!({"name": {"familyName": "Doe"}}),
            json!({"name": {"familyName": "Adams"}}),
        ];
        let sort_by = AttrPath {
            uri: None,
            attr: "name".to_string(),
            sub_attr: Some("familyName".to_string()),
        };
        sort_resources(&mut resources, &sort_by, true);
        let names: Vec<&str> = resources
            .iter()
            .map(|r| r["name"]["familyName"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Adams", "Doe", "Smith"]);
    }

    #[test]
    fn paginate_is_one_based() {
        let resources: Vec<Value> =
            (0..10).map(|i| json!({"n": i})).collect();
        let page = paginate(&resources, Some(2), Some(3));
        assert_eq!(page.start_index, 2);
        assert_eq!(page.total_results, 10);
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.items[0]["n"], 1);
    }

    #[test]
    fn project_keeps_core_attrs_and_requested() {
        let resource =
            json!({"id": "1", "userName": "bob", "title": "eng", "meta": {}});
        let projected =
            project(&resource, &["userName".to_string()], &[]);
        assert!(projected.get("userName").is_some());
        assert!(projected.get("id").is_some());
        assert!(projected.get("meta").is_some());
        assert!(projected.get("title").is_none());
    }
}
