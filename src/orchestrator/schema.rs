//! JSON Schema simplification for the Messages API.
//!
//! Tool schemas may carry `$defs` with `$ref` indirection and
//! `anyOf`-with-null for optional fields. The tool-use API accepts
//! neither, so refs are inlined and nullable unions collapsed before the
//! schema is sent.

use serde_json::{Map, Value};

/// Cyclic or pathologically nested `$ref` chains stop expanding past this
/// many inlinings; the remaining `$ref` object passes through as-is.
const MAX_REF_DEPTH: usize = 32;

/// Inline `$defs`/`$ref` and collapse `anyOf` nullables. Total: any input
/// comes back as a usable schema, unknown shapes pass through unchanged.
pub fn resolve_schema_refs(mut schema: Value) -> Value {
    let defs = match schema.as_object_mut() {
        Some(object) => match object.remove("$defs") {
            Some(Value::Object(defs)) => defs,
            _ => Map::new(),
        },
        None => return schema,
    };
    resolve(schema, &defs, 0)
}

fn resolve(value: Value, defs: &Map<String, Value>, depth: usize) -> Value {
    match value {
        Value::Object(object) => {
            if let Some(Value::String(ref_path)) = object.get("$ref") {
                let ref_name = ref_path.rsplit('/').next().unwrap_or(ref_path);
                if depth < MAX_REF_DEPTH {
                    if let Some(definition) = defs.get(ref_name) {
                        return resolve(definition.clone(), defs, depth + 1);
                    }
                }
                return Value::Object(object);
            }

            if let Some(Value::Array(alternatives)) = object.get("anyOf") {
                let null_schema = serde_json::json!({"type": "null"});
                let non_null: Vec<&Value> = alternatives
                    .iter()
                    .filter(|alt| **alt != null_schema)
                    .collect();
                if non_null.len() == 1 {
                    let mut resolved = resolve(non_null[0].clone(), defs, depth);
                    if let Some(target) = resolved.as_object_mut() {
                        for key in ["description", "default", "title"] {
                            if let Some(extra) = object.get(key) {
                                target.insert(key.to_string(), extra.clone());
                            }
                        }
                    }
                    return resolved;
                }
            }

            Value::Object(
                object
                    .into_iter()
                    .map(|(key, value)| (key, resolve(value, defs, depth)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| resolve(item, defs, depth))
                .collect(),
        ),
        other => other,
    }
}
