use std::fs;
use std::path::Path;

use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::error::LoadError;
use crate::resolver::{Template, TemplateRecord};
use crate::value::{ReferenceRecord, Value};

/// Convert one JSON value into a `Value`. `key` names the record entry
/// for error messages.
pub fn value_from_json(key: &str, json: &JsonValue) -> Result<Value, LoadError> {
    let unsupported = |kind: &'static str| LoadError::UnsupportedValue {
        key: key.to_string(),
        kind,
    };
    match json {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(b) => Ok(Value::Bool(*b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::Int(i)),
            None if n.is_u64() => Err(unsupported("an integer out of range")),
            None => Err(unsupported("a floating-point number")),
        },
        JsonValue::String(s) => Ok(Value::Str(s.clone())),
        JsonValue::Array(items) => items
            .iter()
            .map(|item| value_from_json(key, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        JsonValue::Object(_) => Err(unsupported("an object")),
    }
}

/// Parse a `KEY=VALUE` assignment. VALUE is read as JSON when it parses,
/// and taken as a plain string otherwise.
pub fn assignment_from_str(raw: &str) -> Result<(String, Value), LoadError> {
    let (key, text) = raw
        .split_once('=')
        .ok_or_else(|| LoadError::MalformedAssignment(raw.to_string()))?;
    let value = match serde_json::from_str::<JsonValue>(text) {
        Ok(json) => value_from_json(key, &json)?,
        Err(_) => Value::Str(text.to_string()),
    };
    Ok((key.to_string(), value))
}

fn as_record(json: &JsonValue) -> Result<&Map<String, JsonValue>, LoadError> {
    match json {
        JsonValue::Object(map) => Ok(map),
        JsonValue::Null => Err(LoadError::NotARecord("null")),
        JsonValue::Bool(_) => Err(LoadError::NotARecord("a boolean")),
        JsonValue::Number(_) => Err(LoadError::NotARecord("a number")),
        JsonValue::String(_) => Err(LoadError::NotARecord("a string")),
        JsonValue::Array(_) => Err(LoadError::NotARecord("an array")),
    }
}

/// Build a reference record from a JSON object, keeping key order.
pub fn reference_from_json(json: &JsonValue) -> Result<ReferenceRecord, LoadError> {
    as_record(json)?
        .iter()
        .map(|(k, v)| value_from_json(k, v).map(|value| (k.as_str(), value)))
        .collect()
}

/// Build a template record from a JSON object. Strings become
/// `Template::Text`; every other value is a literal passed through as is.
pub fn templates_from_json(json: &JsonValue) -> Result<TemplateRecord, LoadError> {
    as_record(json)?
        .iter()
        .map(|(k, v)| -> Result<_, LoadError> {
            let template = match v {
                JsonValue::String(s) => Template::Text(s.clone()),
                other => Template::Literal(value_from_json(k, other)?),
            };
            Ok((k.as_str(), template))
        })
        .collect()
}

/// Read a JSON file whose root object maps variant names to records, and
/// return the record named `variant`.
pub fn load_variant(path: impl AsRef<Path>, variant: &str) -> Result<JsonValue, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root: JsonValue = serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let variants = match root {
        JsonValue::Object(map) => map,
        _ => {
            return Err(LoadError::NotAnObject {
                path: path.to_path_buf(),
            })
        }
    };
    debug!(path = %path.display(), variants = variants.len(), variant, "loaded variant file");

    match variants.get(variant) {
        Some(record @ JsonValue::Object(_)) => Ok(record.clone()),
        Some(_) => Err(LoadError::NotAnObject {
            path: path.to_path_buf(),
        }),
        None => Err(LoadError::MissingVariant {
            path: path.to_path_buf(),
            variant: variant.to_string(),
        }),
    }
}

pub fn load_reference(path: impl AsRef<Path>, variant: &str) -> Result<ReferenceRecord, LoadError> {
    reference_from_json(&load_variant(path, variant)?)
}

pub fn load_templates(path: impl AsRef<Path>, variant: &str) -> Result<TemplateRecord, LoadError> {
    templates_from_json(&load_variant(path, variant)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn converts_supported_values() {
        let reference = reference_from_json(&json!({
            "age": 10,
            "name": "John",
            "fruits": ["apple", "banana"],
            "matrix": [[1, 2], [3]],
            "human": true,
            "nothing": null
        }))
        .unwrap();

        assert_eq!(
            reference.keys().collect::<Vec<_>>(),
            vec!["age", "name", "fruits", "matrix", "human", "nothing"]
        );
        assert_eq!(reference.get("age"), Some(&Value::Int(10)));
        assert_eq!(
            reference.get("matrix"),
            Some(&Value::List(vec![
                Value::from(vec![1i64, 2]),
                Value::from(vec![3i64]),
            ]))
        );
        assert_eq!(reference.get("nothing"), Some(&Value::Null));
    }

    #[test]
    fn rejects_unsupported_values() {
        assert!(matches!(
            reference_from_json(&json!({ "ratio": 0.5 })),
            Err(LoadError::UnsupportedValue { key, .. }) if key == "ratio"
        ));
        assert!(matches!(
            reference_from_json(&json!({ "nested": { "a": 1 } })),
            Err(LoadError::UnsupportedValue { kind: "an object", .. })
        ));
        assert!(matches!(
            reference_from_json(&json!({ "big": u64::MAX })),
            Err(LoadError::UnsupportedValue { kind: "an integer out of range", .. })
        ));
        assert!(matches!(
            reference_from_json(&json!([1, 2])),
            Err(LoadError::NotARecord("an array"))
        ));
    }

    #[test]
    fn strings_are_templates_everything_else_literal() {
        let templates = templates_from_json(&json!({
            "name": "$$",
            "class": 1,
            "tags": ["a"]
        }))
        .unwrap();
        assert_eq!(templates.get("name"), Some(&Template::Text("$$".to_string())));
        assert_eq!(templates.get("class"), Some(&Template::Literal(Value::Int(1))));
        assert_eq!(
            templates.get("tags"),
            Some(&Template::Literal(Value::from(vec!["a"])))
        );
    }

    #[test]
    fn assignments() {
        assert_eq!(
            assignment_from_str("x=123").unwrap(),
            ("x".to_string(), Value::Int(123))
        );
        assert_eq!(
            assignment_from_str("x=abc").unwrap(),
            ("x".to_string(), Value::from("abc"))
        );
        assert_eq!(
            assignment_from_str("x=\"quoted\"").unwrap(),
            ("x".to_string(), Value::from("quoted"))
        );
        assert_eq!(
            assignment_from_str("x=[1, true]").unwrap(),
            ("x".to_string(), Value::List(vec![Value::Int(1), Value::Bool(true)]))
        );
        assert_eq!(
            assignment_from_str("x=a=b").unwrap(),
            ("x".to_string(), Value::from("a=b"))
        );
        assert_eq!(
            assignment_from_str("x=").unwrap(),
            ("x".to_string(), Value::from(""))
        );
        assert!(matches!(
            assignment_from_str("x"),
            Err(LoadError::MalformedAssignment(raw)) if raw == "x"
        ));
        assert!(matches!(
            assignment_from_str("x=1.5"),
            Err(LoadError::UnsupportedValue { kind: "a floating-point number", .. })
        ));
    }

    #[test]
    fn loads_named_variant() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"A": {{"name": "$$", "age": "$!$$+25"}}, "B": {{"class": 1}}, "C": 5}}"#
        )
        .unwrap();

        let templates = load_templates(file.path(), "A").unwrap();
        assert_eq!(templates.keys().collect::<Vec<_>>(), vec!["name", "age"]);

        assert!(matches!(
            load_templates(file.path(), "Z"),
            Err(LoadError::MissingVariant { variant, .. }) if variant == "Z"
        ));
        assert!(matches!(
            load_templates(file.path(), "C"),
            Err(LoadError::NotAnObject { .. })
        ));
    }

    #[test]
    fn load_errors() {
        assert!(matches!(
            load_reference("/definitely/not/here.json", "A"),
            Err(LoadError::Io { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            load_reference(file.path(), "A"),
            Err(LoadError::Json { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();
        assert!(matches!(
            load_reference(file.path(), "A"),
            Err(LoadError::NotAnObject { .. })
        ));
    }
}
