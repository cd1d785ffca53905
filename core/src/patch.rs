// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RFC 7644 §3.5.2 PATCH semantics, operating on the `serde_json::Value`
//! view of a resource's attributes (the same dynamic view the response
//! layer already builds from a typed `Resource`). Operations are applied to
//! a working copy and only committed back to the caller if every operation
//! in the request succeeds: a single failing operation discards the whole
//! request (RFC 7644 §3.5.2 atomicity).

use serde::Deserialize;
use serde_json::Value;
use slog::{Logger, info};

use crate::eval;
use crate::filter::{self, Filter};
use crate::urn::PATCHOP_URN;

#[derive(Debug)]
pub enum PatchRequestError {
    Invalid(String),
    InvalidValue(String),
    Unsupported(String),
}

#[derive(Debug, Deserialize, schemars::JsonSchema, Clone)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Add { path: Option<String>, value: Value },
    Replace { path: Option<String>, value: Value },
    Remove { path: String, value: Option<Value> },
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PatchRequest {
    schemas: Vec<String>,
    #[serde(rename = "Operations")]
    operations: Vec<PatchOp>,
}

impl PatchRequest {
    fn validate_schema(&self) -> Result<(), PatchRequestError> {
        match matches!(&self.schemas[..], [val] if val == PATCHOP_URN) {
            true => Ok(()),
            false => Err(PatchRequestError::Invalid(format!(
                "invalid patch schema {:?}",
                self.schemas
            ))),
        }
    }

    /// Apply every operation in order to a clone of `resource`, returning
    /// the result only if all operations succeeded.
    pub fn apply(
        &self,
        log: &Logger,
        resource_id: &str,
        resource: &Value,
    ) -> Result<Value, PatchRequestError> {
        self.validate_schema()?;

        let mut working = resource.clone();
        for op in &self.operations {
            apply_one(log, resource_id, &mut working, op)?;
        }
        enforce_single_primary(&mut working);

        Ok(working)
    }
}

/// A parsed PATCH path: `attrPath ["[" valFilter "]"] ["." subAttr]`.
#[derive(Debug, Clone)]
pub struct PatchPath {
    pub uri: Option<String>,
    pub attr: String,
    pub value_filter: Option<Filter>,
    pub sub_attr: Option<String>,
}

pub fn parse_patch_path(path: &str) -> Result<PatchPath, PatchRequestError> {
    let path = path.trim();
    if path.is_empty() {
        return Err(PatchRequestError::Invalid(
            "path must not be empty".to_string(),
        ));
    }

    let bracket_pos = path.find('[');
    let (head, rest) = match bracket_pos {
        Some(idx) => (&path[..idx], &path[idx..]),
        None => (path, ""),
    };

    let (uri, attr_and_sub) = match head.rfind(':') {
        Some(idx) => (Some(head[..idx].to_string()), &head[idx + 1..]),
        None => (None, head),
    };

    let (value_filter, after_bracket) = if let Some(rest) =
        rest.strip_prefix('[')
    {
        let close = rest.find(']').ok_or_else(|| {
            PatchRequestError::Invalid(format!(
                "unterminated '[' in path {path:?}"
            ))
        })?;
        let filter_src = &rest[..close];
        let filter = filter::parse_filter(filter_src).map_err(|e| {
            PatchRequestError::Invalid(format!(
                "invalid filter in path {path:?}: {}",
                e.message
            ))
        })?;
        (Some(filter), &rest[close + 1..])
    } else {
        (None, rest)
    };

    let (attr, sub_attr) = if value_filter.is_some() {
        let sub = after_bracket.strip_prefix('.').map(String::from);
        (attr_and_sub.to_string(), sub)
    } else {
        let mut parts = attr_and_sub.splitn(2, '.');
        let attr = parts.next().unwrap_or_default().to_string();
        let sub = parts.next().map(String::from);
        (attr, sub)
    };

    if attr.is_empty() {
        return Err(PatchRequestError::Invalid(format!(
            "path {path:?} has no attribute name"
        )));
    }

    Ok(PatchPath { uri, attr, value_filter, sub_attr })
}

const MULTI_VALUED_ATTRS: &[&str] = &[
    "emails",
    "phoneNumbers",
    "ims",
    "photos",
    "entitlements",
    "roles",
    "x509Certificates",
    "addresses",
    "members",
];

const READ_ONLY_ATTRS: &[&str] = &["id", "meta", "groups", "schemas"];

const BOOLEAN_ATTRS: &[&str] = &["active", "primary"];

const STRING_ATTRS: &[&str] = &[
    "userName",
    "externalId",
    "displayName",
    "nickName",
    "profileUrl",
    "title",
    "userType",
    "preferredLanguage",
    "locale",
    "timezone",
    "password",
    "formatted",
    "familyName",
    "givenName",
    "middleName",
    "honorificPrefix",
    "honorificSuffix",
    "value",
    "type",
    "streetAddress",
    "locality",
    "region",
    "postalCode",
    "country",
];

fn is_known_multi_valued(attr: &str) -> bool {
    MULTI_VALUED_ATTRS.iter().any(|a| a.eq_ignore_ascii_case(attr))
}

fn is_read_only(attr: &str) -> bool {
    READ_ONLY_ATTRS.iter().any(|a| a.eq_ignore_ascii_case(attr))
}

/// Validates a scalar value being written to a known attribute against that
/// attribute's schema type (RFC 7643 §2.3). Attributes outside the known
/// tables (complex attributes, extension attributes) are left unvalidated.
fn check_known_type(attr: &str, value: &Value) -> Result<(), PatchRequestError> {
    if BOOLEAN_ATTRS.iter().any(|a| a.eq_ignore_ascii_case(attr))
        && !value.is_boolean()
    {
        return Err(PatchRequestError::InvalidValue(format!(
            "attribute {attr} requires a boolean value, got {value}"
        )));
    }
    if STRING_ATTRS.iter().any(|a| a.eq_ignore_ascii_case(attr))
        && !value.is_string()
    {
        return Err(PatchRequestError::InvalidValue(format!(
            "attribute {attr} requires a string value, got {value}"
        )));
    }
    Ok(())
}

/// A plural attribute name not present in [`MULTI_VALUED_ATTRS`] is still
/// treated as multi-valued if it ends in "s" and the current value (if any)
/// isn't itself a plain object, per RFC 7644 §3.5.2's plural-name heuristic for
/// absent attributes.
fn is_multi_valued(attr: &str, current: Option<&Value>) -> bool {
    if is_known_multi_valued(attr) {
        return true;
    }
    match current {
        Some(Value::Array(_)) => true,
        Some(Value::Object(_)) => false,
        _ => attr.ends_with('s'),
    }
}

fn find_key<'a>(
    map: &'a serde_json::Map<String, Value>,
    key: &str,
) -> Option<String> {
    map.keys().find(|k| k.eq_ignore_ascii_case(key)).cloned()
}

fn apply_one(
    log: &Logger,
    resource_id: &str,
    resource: &mut Value,
    op: &PatchOp,
) -> Result<(), PatchRequestError> {
    match op {
        PatchOp::Add { path, value } => apply_add_or_replace(
            log, resource_id, resource, path.as_deref(), value, false,
        ),
        PatchOp::Replace { path, value } => apply_add_or_replace(
            log, resource_id, resource, path.as_deref(), value, true,
        ),
        PatchOp::Remove { path, value } => {
            apply_remove(log, resource_id, resource, path, value.as_ref())
        }
    }
}

fn apply_add_or_replace(
    log: &Logger,
    resource_id: &str,
    resource: &mut Value,
    path: Option<&str>,
    value: &Value,
    is_replace: bool,
) -> Result<(), PatchRequestError> {
    match path {
        None => {
            let Value::Object(incoming) = value else {
                return Err(PatchRequestError::Invalid(
                    "add/replace without a path requires an object value"
                        .to_string(),
                ));
            };
            for (attr, val) in incoming {
                if is_read_only(attr) {
                    continue;
                }
                set_named_attr(
                    log,
                    resource_id,
                    resource,
                    attr,
                    None,
                    val,
                    is_replace,
                )?;
            }
            Ok(())
        }
        Some(path) => {
            let p = parse_patch_path(path)?;
            if is_read_only(&p.attr) {
                return Err(PatchRequestError::Invalid(format!(
                    "attribute {} is readOnly",
                    p.attr
                )));
            }
            set_named_attr(
                log,
                resource_id,
                resource,
                &p.attr,
                Some(&p),
                value,
                is_replace,
            )
        }
    }
}

fn set_named_attr(
    log: &Logger,
    resource_id: &str,
    resource: &mut Value,
    attr: &str,
    patch_path: Option<&PatchPath>,
    value: &Value,
    is_replace: bool,
) -> Result<(), PatchRequestError> {
    let Value::Object(obj) = resource else {
        return Err(PatchRequestError::Invalid(
            "resource is not a JSON object".to_string(),
        ));
    };

    let key = find_key(obj, attr).unwrap_or_else(|| attr.to_string());
    let current = obj.get(&key).cloned();

    match patch_path {
        // attr[filter].subAttr or attr[filter]
        Some(PatchPath { value_filter: Some(filter), sub_attr, .. }) => {
            let Some(Value::Array(items)) = obj.get_mut(&key) else {
                return Err(PatchRequestError::InvalidValue(format!(
                    "path targets a filter on non-array attribute {attr}"
                )));
            };

            match sub_attr {
                Some(sub) => {
                    check_known_type(sub, value)?;
                    let mut matched = false;
                    for item in items.iter_mut() {
                        if eval::evaluate(filter, item) {
                            matched = true;
                            if let Value::Object(item_obj) = item {
                                item_obj.insert(sub.clone(), value.clone());
                            }
                        }
                    }
                    if !matched {
                        return Err(PatchRequestError::Invalid(format!(
                            "no elements of {attr} matched the filter"
                        )));
                    }
                    info!(
                        log,
                        "PatchOp set sub-attribute on filtered elements";
                        "resource" => resource_id,
                        "attr" => attr,
                        "sub_attr" => sub,
                    );
                }
                None => {
                    // Duplicate suppression: if an element deep-equal to
                    // `value` already exists, this is a no-op. Otherwise
                    // append as a new element (RFC 7644 3.5.2.1).
                    if items.iter().any(|item| item == value) {
                        return Ok(());
                    }
                    items.push(value.clone());
                    info!(
                        log,
                        "PatchOp appended new element to filtered attribute";
                        "resource" => resource_id,
                        "attr" => attr,
                    );
                }
            }
            Ok(())
        }

        // attr.subAttr, no filter
        Some(PatchPath { sub_attr: Some(sub), value_filter: None, .. }) => {
            check_known_type(sub, value)?;
            let entry = obj
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Default::default()));
            let Value::Object(sub_obj) = entry else {
                return Err(PatchRequestError::Invalid(format!(
                    "attribute {attr} is not a complex attribute"
                )));
            };
            sub_obj.insert(sub.clone(), value.clone());
            Ok(())
        }

        // plain attr, no filter, no sub-attr
        _ => {
            if is_multi_valued(attr, current.as_ref()) {
                let Value::Array(new_items) = value.clone() else {
                    // a single complex value being added to a multi-valued
                    // attribute is appended as one new element.
                    let entry = obj
                        .entry(key.clone())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    let Value::Array(items) = entry else {
                        return Err(PatchRequestError::Invalid(format!(
                            "attribute {attr} is not multi-valued"
                        )));
                    };
                    if is_replace {
                        *items = vec![value.clone()];
                    } else if !items.iter().any(|item| item == value) {
                        items.push(value.clone());
                    }
                    return Ok(());
                };

                if is_replace {
                    obj.insert(key, Value::Array(new_items));
                } else {
                    let entry = obj
                        .entry(key.clone())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    let Value::Array(items) = entry else {
                        return Err(PatchRequestError::Invalid(format!(
                            "attribute {attr} is not multi-valued"
                        )));
                    };
                    for item in new_items {
                        if !items.iter().any(|existing| existing == &item) {
                            items.push(item);
                        }
                    }
                }
            } else {
                check_known_type(attr, value)?;
                obj.insert(key, value.clone());
            }

            info!(
                log,
                "PatchOp set attribute";
                "resource" => resource_id,
                "attr" => attr,
                "op" => if is_replace { "replace" } else { "add" },
            );
            Ok(())
        }
    }
}

fn apply_remove(
    log: &Logger,
    resource_id: &str,
    resource: &mut Value,
    path: &str,
    value: Option<&Value>,
) -> Result<(), PatchRequestError> {
    let p = parse_patch_path(path)?;
    if is_read_only(&p.attr) {
        return Err(PatchRequestError::Invalid(format!(
            "attribute {} is readOnly",
            p.attr
        )));
    }

    let Value::Object(obj) = resource else {
        return Err(PatchRequestError::Invalid(
            "resource is not a JSON object".to_string(),
        ));
    };

    let Some(key) = find_key(obj, &p.attr) else {
        // Removing an attribute that isn't set is a no-op.
        return Ok(());
    };

    match (&p.value_filter, &p.sub_attr) {
        (Some(filter), sub_attr) => {
            let Some(Value::Array(items)) = obj.get_mut(&key) else {
                return Err(PatchRequestError::InvalidValue(format!(
                    "path targets a filter on non-array attribute {}",
                    p.attr
                )));
            };
            match sub_attr {
                Some(sub) => {
                    for item in items.iter_mut() {
                        if eval::evaluate(filter, item) {
                            if let Value::Object(item_obj) = item {
                                item_obj.remove(sub.as_str());
                            }
                        }
                    }
                }
                None => {
                    items.retain(|item| !eval::evaluate(filter, item));
                }
            }
            info!(
                log,
                "PatchOp removed filtered elements";
                "resource" => resource_id,
                "attr" => p.attr,
            );
            Ok(())
        }
        (None, Some(sub)) => {
            if let Some(Value::Object(sub_obj)) = obj.get_mut(&key) {
                sub_obj.remove(sub.as_str());
            }
            Ok(())
        }
        (None, None) => {
            match (obj.get_mut(&key), value) {
                (Some(Value::Array(items)), Some(value)) => {
                    items.retain(|item| item != value);
                    info!(
                        log,
                        "PatchOp removed elements shallow-equal to value";
                        "resource" => resource_id,
                        "attr" => p.attr,
                    );
                }
                (Some(Value::Array(items)), None) => {
                    items.clear();
                    info!(
                        log,
                        "PatchOp removed attribute";
                        "resource" => resource_id,
                        "attr" => p.attr,
                    );
                }
                _ => {
                    obj.remove(&key);
                    info!(
                        log,
                        "PatchOp removed attribute";
                        "resource" => resource_id,
                        "attr" => p.attr,
                    );
                }
            }
            Ok(())
        }
    }
}

/// Enforce single-primary: for each known multi-valued attribute, scanning
/// from the end of the array, the first element found with `primary: true`
/// wins; every earlier `primary: true` is cleared to `false`.
pub(crate) fn enforce_single_primary(resource: &mut Value) {
    let Value::Object(obj) = resource else { return };

    for attr in MULTI_VALUED_ATTRS {
        let Some(key) = find_key(obj, attr) else { continue };
        let Some(Value::Array(items)) = obj.get_mut(&key) else { continue };

        let mut seen_primary = false;
        for item in items.iter_mut().rev() {
            let Value::Object(item_obj) = item else { continue };
            let Some(primary_key) = find_key(item_obj, "primary") else {
                continue;
            };
            let is_primary =
                matches!(item_obj.get(&primary_key), Some(Value::Bool(true)));
            if is_primary {
                if seen_primary {
                    item_obj.insert(primary_key, Value::Bool(false));
                } else {
                    seen_primary = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use slog::Discard;

    fn log() -> Logger {
        Logger::root(Discard, slog::o!())
    }

    #[test]
    fn replace_active_with_no_path() {
        let req: PatchRequest = serde_json::from_value(json!({
            "schemas": [PATCHOP_URN],
            "Operations": [
                {"op": "replace", "value": {"active": false}}
            ]
        }))
        .unwrap();

        let resource = json!({"id": "1", "userName": "bob", "active": true});
        let updated = req.apply(&log(), "1", &resource).unwrap();
        assert_eq!(updated["active"], false);
    }

    #[test]
    fn add_appends_to_multi_valued_without_duplicating() {
        let req: PatchRequest = serde_json::from_value(json!({
            "schemas": [PATCHOP_URN],
            "Operations": [
                {
                    "op": "add",
                    "path": "emails",
                    "value": [{"value": "a@example.com", "type": "work"}]
                }
            ]
        }))
        .unwrap();

        let resource = json!({
            "id": "1",
            "emails": [{"value": "a@example.com", "type": "work"}]
        });
        let updated = req.apply(&log(), "1", &resource).unwrap();
        assert_eq!(updated["emails"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn add_with_filter_appends_new_element_and_suppresses_duplicate() {
        let resource = json!({
            "id": "1",
            "emails": [{"value": "a@example.com", "type": "work"}]
        });

        let req: PatchRequest = serde_json::from_value(json!({
            "schemas": [PATCHOP_URN],
            "Operations": [
                {
                    "op": "add",
                    "path": "emails[type eq \"home\"]",
                    "value": {"value": "b@example.com", "type": "home"}
                }
            ]
        }))
        .unwrap();
        let updated = req.apply(&log(), "1", &resource).unwrap();
        assert_eq!(updated["emails"].as_array().unwrap().len(), 2);

        let req_dup: PatchRequest = serde_json::from_value(json!({
            "schemas": [PATCHOP_URN],
            "Operations": [
                {
                    "op": "add",
                    "path": "emails[type eq \"work\"]",
                    "value": {"value": "a@example.com", "type": "work"}
                }
            ]
        }))
        .unwrap();
        let unchanged = req_dup.apply(&log(), "1", &resource).unwrap();
        assert_eq!(unchanged, resource);
    }

    #[test]
    fn remove_with_filter_drops_matching_elements() {
        let resource = json!({
            "id": "1",
            "members": [
                {"value": "u1"},
                {"value": "u2"}
            ]
        });

        let req: PatchRequest = serde_json::from_value(json!({
            "schemas": [PATCHOP_URN],
            "Operations": [
                {"op": "remove", "path": "members[value eq \"u1\"]"}
            ]
        }))
        .unwrap();
        let updated = req.apply(&log(), "1", &resource).unwrap();
        let members = updated["members"].as_array().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0]["value"], "u2");
    }

    #[test]
    fn remove_without_filter_empties_array() {
        let resource =
            json!({"id": "1", "members": [{"value": "u1"}, {"value": "u2"}]});
        let req: PatchRequest = serde_json::from_value(json!({
            "schemas": [PATCHOP_URN],
            "Operations": [{"op": "remove", "path": "members"}]
        }))
        .unwrap();
        let updated = req.apply(&log(), "1", &resource).unwrap();
        assert_eq!(updated["members"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn remove_with_value_drops_only_shallow_equal_elements() {
        let resource = json!({
            "id": "1",
            "members": [
                {"value": "u1"},
                {"value": "u2"}
            ]
        });
        let req: PatchRequest = serde_json::from_value(json!({
            "schemas": [PATCHOP_URN],
            "Operations": [
                {
                    "op": "remove",
                    "path": "members",
                    "value": {"value": "u1"}
                }
            ]
        }))
        .unwrap();
        let updated = req.apply(&log(), "1", &resource).unwrap();
        let members = updated["members"].as_array().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0]["value"], "u2");
    }

    #[test]
    fn remove_absent_attribute_is_a_no_op() {
        let resource = json!({"id": "1", "userName": "bob"});
        let req: PatchRequest = serde_json::from_value(json!({
            "schemas": [PATCHOP_URN],
            "Operations": [{"op": "remove", "path": "nickName"}]
        }))
        .unwrap();
        let updated = req.apply(&log(), "1", &resource).unwrap();
        assert_eq!(updated, resource);
    }

    #[test]
    fn replace_sub_attribute_via_dotted_path() {
        let resource =
            json!({"id": "1", "name": {"givenName": "Bob", "familyName": "X"}});
        let req: PatchRequest = serde_json::from_value(json!({
            "schemas": [PATCHOP_URN],
            "Operations": [
                {"op": "replace", "path": "name.familyName", "value": "Jones"}
            ]
        }))
        .unwrap();
        let updated = req.apply(&log(), "1", &resource).unwrap();
        assert_eq!(updated["name"]["familyName"], "Jones");
        assert_eq!(updated["name"]["givenName"], "Bob");
    }

    #[test]
    fn filter_on_non_array_attribute_reports_invalid_value() {
        let resource = json!({"id": "1", "displayName": "bob"});
        let req: PatchRequest = serde_json::from_value(json!({
            "schemas": [PATCHOP_URN],
            "Operations": [
                {"op": "remove", "path": "displayName[value eq \"bob\"]"}
            ]
        }))
        .unwrap();
        let err = req.apply(&log(), "1", &resource).unwrap_err();
        let scim_error: crate::response::Error = err.into();
        assert_eq!(
            scim_error.error_type,
            Some(crate::response::ErrorType::InvalidValue)
        );
    }

    #[test]
    fn atomicity_discards_partial_changes_on_error() {
        let resource = json!({"id": "1", "userName": "bob"});
        let req: PatchRequest = serde_json::from_value(json!({
            "schemas": [PATCHOP_URN],
            "Operations": [
                {"op": "replace", "value": {"userName": "alice"}},
                {"op": "remove", "path": "emails[value eq \"x\"]"}
            ]
        }))
        .unwrap();
        // `emails` doesn't exist, so the filtered remove on a non-array
        // attribute fails and the whole request must be rejected.
        assert!(req.apply(&log(), "1", &resource).is_err());
    }

    #[test]
    fn single_primary_enforcement_keeps_last_scanning_from_end() {
        let resource = json!({
            "id": "1",
            "emails": [
                {"value": "a@example.com", "primary": true},
                {"value": "b@example.com", "primary": true}
            ]
        });
        let req: PatchRequest = serde_json::from_value(json!({
            "schemas": [PATCHOP_URN],
            "Operations": [{"op": "replace", "value": {"active": true}}]
        }))
        .unwrap();
        let updated = req.apply(&log(), "1", &resource).unwrap();
        let emails = updated["emails"].as_array().unwrap();
        assert_eq!(emails[0]["primary"], false);
        assert_eq!(emails[1]["primary"], true);
    }

    #[test]
    fn replace_rejects_wrong_type_for_known_attribute() {
        let resource = json!({"id": "1", "active": true});
        let req: PatchRequest = serde_json::from_value(json!({
            "schemas": [PATCHOP_URN],
            "Operations": [
                {"op": "replace", "path": "active", "value": "yes"}
            ]
        }))
        .unwrap();
        assert!(req.apply(&log(), "1", &resource).is_err());
    }

    #[test]
    fn rejects_invalid_schema() {
        let req: PatchRequest = serde_json::from_value(json!({
            "schemas": ["urn:bogus"],
            "Operations": []
        }))
        .unwrap();
        let resource = json!({"id": "1"});
        assert!(req.apply(&log(), "1", &resource).is_err());
    }

    #[test]
    fn groups_is_read_only() {
        let req: PatchRequest = serde_json::from_value(json!({
            "schemas": [PATCHOP_URN],
            "Operations": [
                {"op": "add", "path": "groups", "value": [{"value": "g1"}]}
            ]
        }))
        .unwrap();
        let resource = json!({"id": "1"});
        assert!(req.apply(&log(), "1", &resource).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use slog::Discard;

    fn log() -> Logger {
        Logger::root(Discard, slog::o!())
    }

    fn emails_with_primaries(
        primaries: Vec<bool>,
    ) -> Value {
        let items: Vec<Value> = primaries
            .into_iter()
            .enumerate()
            .map(|(i, primary)| {
                json!({
                    "value": format!("user{i}@example.com"),
                    "primary": primary,
                })
            })
            .collect();
        json!({"id": "1", "emails": items})
    }

    proptest! {
        /// RFC 7644 §3.5.2: whatever combination of elements come
        /// in marked `primary:true`, enforcement leaves at most one standing
        /// — the last one in array order.
        #[test]
        fn enforce_single_primary_leaves_last_marked_element_standing(
            primaries in proptest::collection::vec(any::<bool>(), 0..8)
        ) {
            let mut resource = emails_with_primaries(primaries.clone());
            enforce_single_primary(&mut resource);

            let items = resource["emails"].as_array().unwrap();
            let expected_last_true = primaries.iter().rposition(|&p| p);

            let actual_true_indices: Vec<usize> = items
                .iter()
                .enumerate()
                .filter(|(_, item)| item["primary"] == json!(true))
                .map(|(i, _)| i)
                .collect();

            match expected_last_true {
                Some(idx) => prop_assert_eq!(actual_true_indices, vec![idx]),
                None => prop_assert!(actual_true_indices.is_empty()),
            }
        }

        /// Idempotence: enforcement has already reduced the data to at most
        /// one primary, so running it again must be a no-op.
        #[test]
        fn enforce_single_primary_is_idempotent(
            primaries in proptest::collection::vec(any::<bool>(), 0..8)
        ) {
            let mut resource = emails_with_primaries(primaries);
            enforce_single_primary(&mut resource);
            let once = resource.clone();
            enforce_single_primary(&mut resource);
            prop_assert_eq!(once, resource);
        }

        /// RFC 7644 §3.5.2 atomicity: a PATCH request with an operation that
        /// fails (here, a filtered `remove` targeting a non-array attribute)
        /// must leave the caller's resource value completely untouched.
        #[test]
        fn failed_patch_does_not_mutate_input(
            display_name in "[a-zA-Z ]{1,20}"
        ) {
            let resource = json!({"id": "1", "displayName": display_name});
            let before = resource.clone();

            let req: PatchRequest = serde_json::from_value(json!({
                "schemas": [PATCHOP_URN],
                "Operations": [
                    {"op": "remove", "path": "displayName[value eq \"nope\"]"}
                ]
            }))
            .unwrap();

            let result = req.apply(&log(), "1", &resource);
            prop_assert!(result.is_err());
            prop_assert_eq!(resource, before);
        }
    }
}
