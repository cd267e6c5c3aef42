use std::borrow::Cow;

use serde_json::{Map, Value};

use super::FakerError;

/// Keywords implying an object when `type` is missing.
const OBJECT_KEYWORDS: &[&str] = &[
    "properties",
    "required",
    "additionalProperties",
    "patternProperties",
    "minProperties",
    "maxProperties",
];
const ARRAY_KEYWORDS: &[&str] = &["items", "minItems", "maxItems", "uniqueItems"];
const STRING_KEYWORDS: &[&str] = &["minLength", "maxLength", "pattern", "format"];
const NUMBER_KEYWORDS: &[&str] = &[
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
];

/// Resolves a local `$ref` against the root schema.
///
/// Only document-local references (`#` and `#/json/pointer`) are supported.
pub(super) fn resolve_ref<'a>(root: &'a Value, reference: &str) -> Result<&'a Value, FakerError> {
    let target = match reference {
        "#" => Some(root),
        _ => reference
            .strip_prefix('#')
            .filter(|pointer| pointer.starts_with('/'))
            .and_then(|pointer| root.pointer(pointer)),
    };
    target.ok_or_else(|| FakerError::UnresolvedReference {
        reference: reference.to_string(),
    })
}

/// Follows `$ref` chains until reaching a schema without reference.
pub(super) fn deref_schema<'a>(
    root: &'a Value,
    mut schema: &'a Value,
) -> Result<&'a Value, FakerError> {
    // a chain longer than this is a cycle
    for _ in 0..64 {
        match schema.get("$ref").and_then(Value::as_str) {
            Some(reference) => schema = resolve_ref(root, reference)?,
            None => return Ok(schema),
        }
    }
    Err(FakerError::UnresolvedReference {
        reference: schema
            .get("$ref")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

/// Merges `sub` into `target`: properties are unioned, required names are
/// unioned, any other keyword is kept from the first schema defining it.
pub(super) fn merge_into(target: &mut Map<String, Value>, sub: &Value) {
    let Some(sub) = sub.as_object() else {
        return;
    };
    for (key, value) in sub {
        match key.as_str() {
            "properties" => {
                let Some(properties) = value.as_object() else {
                    continue;
                };
                let entry = target
                    .entry("properties")
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Some(existing) = entry.as_object_mut() {
                    for (name, property) in properties {
                        existing
                            .entry(name.clone())
                            .or_insert_with(|| property.clone());
                    }
                }
            }
            "required" => {
                let Some(required) = value.as_array() else {
                    continue;
                };
                let entry = target
                    .entry("required")
                    .or_insert_with(|| Value::Array(vec![]));
                if let Some(existing) = entry.as_array_mut() {
                    for name in required {
                        if !existing.contains(name) {
                            existing.push(name.clone());
                        }
                    }
                }
            }
            _ => {
                target.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
    }
}

/// Flattens `allOf` into a single schema, recursively.
pub(super) fn flatten_all_of(root: &Value, schema: &Value) -> Result<Value, FakerError> {
    let Some(object) = schema.as_object() else {
        return Ok(schema.clone());
    };
    let mut merged = object.clone();
    let Some(Value::Array(subs)) = merged.remove("allOf") else {
        return Ok(schema.clone());
    };
    for sub in &subs {
        let sub = deref_schema(root, sub)?;
        let sub = flatten_all_of(root, sub)?;
        merge_into(&mut merged, &sub);
    }
    Ok(Value::Object(merged))
}

/// Merges the chosen `anyOf`/`oneOf` branch with its parent schema.
pub(super) fn merge_branch(root: &Value, parent: &Value, branch: &Value) -> Result<Value, FakerError> {
    let mut merged = parent.as_object().cloned().unwrap_or_default();
    merged.remove("anyOf");
    merged.remove("oneOf");
    let branch = deref_schema(root, branch)?;
    let branch = flatten_all_of(root, branch)?;
    // the branch wins over the parent
    let mut result = branch.as_object().cloned().unwrap_or_default();
    merge_into(&mut result, &Value::Object(merged));
    Ok(Value::Object(result))
}

/// The JSON types a schema accepts, as declared or inferred.
pub(super) fn schema_types(schema: &Value) -> Cow<'static, [&'static str]> {
    let declared = match schema.get("type") {
        Some(Value::String(name)) => vec![name.as_str()],
        Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).collect(),
        _ => vec![],
    };
    if !declared.is_empty() {
        let known = declared
            .into_iter()
            .filter_map(|name| match name {
                "object" => Some("object"),
                "array" => Some("array"),
                "string" => Some("string"),
                "integer" => Some("integer"),
                "number" => Some("number"),
                "boolean" => Some("boolean"),
                "null" => Some("null"),
                _ => None,
            })
            .collect::<Vec<_>>();
        return Cow::Owned(known);
    }

    let has_any = |keywords: &[&str]| keywords.iter().any(|key| schema.get(key).is_some());
    let inferred: &'static [&'static str] = if has_any(OBJECT_KEYWORDS) {
        &["object"]
    } else if has_any(ARRAY_KEYWORDS) {
        &["array"]
    } else if has_any(STRING_KEYWORDS) {
        &["string"]
    } else if has_any(NUMBER_KEYWORDS) {
        &["number"]
    } else {
        &[]
    };
    Cow::Borrowed(inferred)
}
