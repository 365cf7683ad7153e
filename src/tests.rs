use pretty_assertions::assert_eq;

use crate::command::CommandOptions;
use crate::from_json::{reference_from_json, templates_from_json, value_from_json};
use crate::interpreter::eval_source;
use crate::scanner::{scan, ScanResult};
use crate::value::*;
use crate::{resolve, resolve_files, ResolveError};

// ── Shared fixture runners ──────────────────────────────────────────

/// Embed fixture files at compile time.
const RESOLVE_FIXTURES: &str = include_str!("../test-data/fixtures/resolve.json");
const EXPRESSION_FIXTURES: &str = include_str!("../test-data/fixtures/expressions.json");

fn data_path(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("test-data")
        .join(name)
}

#[test]
fn test_fixture_resolve() {
    let fixtures: Vec<serde_json::Value> = serde_json::from_str(RESOLVE_FIXTURES).unwrap();

    for fixture in &fixtures {
        let name = fixture["name"].as_str().unwrap();
        let reference = reference_from_json(&fixture["reference"]).unwrap();
        let templates = templates_from_json(&fixture["templates"]).unwrap();

        let result = resolve(&templates, &reference).and_then(|r| r.into_record());

        if let Some(code) = fixture.get("expectError").and_then(|v| v.as_str()) {
            match result {
                Ok(record) => panic!(
                    "Fixture '{}': expected error '{}' but resolved to {:?}",
                    name, code, record
                ),
                Err(err) => assert_eq!(
                    err.code(),
                    code,
                    "Fixture '{}': wrong error: {}",
                    name,
                    err
                ),
            }
            continue;
        }

        let record = match result {
            Ok(record) => record,
            Err(err) => panic!("Fixture '{}': unexpected error: {}", name, err),
        };
        let expected = reference_from_json(&fixture["expected"]).unwrap();
        assert_eq!(record, expected, "Fixture '{}': output mismatch", name);
    }
}

#[test]
fn test_fixture_expressions() {
    let fixtures: Vec<serde_json::Value> = serde_json::from_str(EXPRESSION_FIXTURES).unwrap();

    for fixture in &fixtures {
        let source = fixture["source"].as_str().unwrap();
        let result = eval_source(source);

        if let Some(code) = fixture.get("expectError").and_then(|v| v.as_str()) {
            match result {
                Ok(v) => panic!(
                    "Expression '{}': expected error '{}' but got {:?}",
                    source, code, v
                ),
                Err(err) => assert_eq!(err.code(), code, "Expression '{}': {}", source, err),
            }
            continue;
        }

        let expected = value_from_json(source, &fixture["expected"]).unwrap();
        match result {
            Ok(v) => assert_eq!(v, expected, "Expression '{}'", source),
            Err(err) => panic!("Expression '{}': unexpected error: {}", source, err),
        }
    }
}

#[test]
fn test_long_expressions_fail_cleanly() {
    for source in [
        format!("1{}", "+1".repeat(20_000)),
        format!("[1]{}", ".len".repeat(200_000)),
    ] {
        let err = eval_source(&source).unwrap_err();
        assert_eq!(err.code(), "invalid-expression");
    }
}

// ── Variant files ───────────────────────────────────────────────────

#[test]
fn test_variant_files_resolve() {
    let resolution = resolve_files(
        data_path("template_core.json"),
        "foo1",
        data_path("template_impl.json"),
        "bar1",
    )
    .unwrap();

    let record = resolution.record().unwrap();
    assert_eq!(
        record.keys().collect::<Vec<_>>(),
        vec!["name", "age", "favourite_fruit", "class", "happy"]
    );
    assert_eq!(record.get("name"), Some(&Value::from("John Williams")));
    assert_eq!(record.get("age"), Some(&Value::Int(35)));

    assert_eq!(
        resolution.to_command(&CommandOptions::default()).unwrap(),
        "--name=John Williams --age=35 --favourite_fruit=apple_and_banana --class=4 --happy"
    );
    assert_eq!(
        resolution
            .to_command(&CommandOptions {
                start: None,
                show_booleans: true,
            })
            .unwrap(),
        "--name=John Williams --age=35 --favourite_fruit=apple_and_banana --class=4 --happy=true"
    );
}

#[test]
fn test_variant_files_unresolved_session() {
    let mut resolution = resolve_files(
        data_path("template_core.json"),
        "foo2",
        data_path("template_impl.json"),
        "bar2",
    )
    .unwrap();

    let err = resolution
        .to_command(&CommandOptions::with_start("echo"))
        .unwrap_err();
    assert_eq!(err, ResolveError::UnresolvedEntryRemaining("?".to_string()));

    resolution.patch_unresolved("?", 123).unwrap();
    assert_eq!(
        resolution.patch_unresolved("?", 456),
        Err(ResolveError::PatchTargetInvalid("?".to_string()))
    );

    assert_eq!(
        resolution
            .to_command(&CommandOptions::with_start("echo"))
            .unwrap(),
        "echo --name=John --age=10 --favourite_fruit=apple --class=1 --human --?=123"
    );
}

#[test]
fn test_variant_files_missing_variant() {
    let err = resolve_files(
        data_path("template_core.json"),
        "foo9",
        data_path("template_impl.json"),
        "bar1",
    )
    .unwrap_err();
    assert!(matches!(
        err,
        crate::Error::Load(crate::LoadError::MissingVariant { .. })
    ));
}

// ── Scanner properties ──────────────────────────────────────────────

fn sample_values() -> Vec<Value> {
    vec![
        Value::Null,
        Value::Bool(true),
        Value::Bool(false),
        Value::Int(0),
        Value::Int(-42),
        Value::from("text with $ and \\"),
        Value::from(""),
        Value::List(vec![]),
        Value::List(vec![Value::Int(1), Value::from(vec!["a", "b"])]),
    ]
}

#[test]
fn test_own_key_substitution_is_type_preserving() {
    for value in sample_values() {
        let reference: ReferenceRecord = [("k", value.clone())].into_iter().collect();
        assert_eq!(
            scan("$$", &reference, "k").unwrap(),
            ScanResult::Value(value.clone())
        );
        assert_eq!(
            scan("$k$", &reference, "other").unwrap(),
            ScanResult::Value(value)
        );
    }
}

#[test]
fn test_text_without_markers_is_unchanged() {
    let reference = ReferenceRecord::new();
    for text in [
        "",
        "plain",
        "with spaces and punctuation!?",
        "unicode: héllo wörld ✓",
        "multi\nline",
        "[1, 2].len",
    ] {
        assert_eq!(
            scan(text, &reference, "k").unwrap(),
            ScanResult::Text(text.to_string())
        );
    }
}

#[test]
fn test_substituted_lists_reparse_as_literals() {
    for value in sample_values() {
        if !matches!(value, Value::List(_)) {
            continue;
        }
        let reference: ReferenceRecord = [("k", value.clone())].into_iter().collect();
        let templates = [("k", crate::Template::from("$!$$"))].into_iter().collect();
        let record = resolve(&templates, &reference)
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(record.get("k"), Some(&value));
    }
}

#[test]
fn test_reference_record_is_untouched() {
    let reference: ReferenceRecord = [("age", Value::Int(10))].into_iter().collect();
    let before = reference.clone();
    let templates = [
        ("age", crate::Template::from("$!$$ + 1")),
        ("again", crate::Template::from("$age$")),
    ]
    .into_iter()
    .collect();
    let record = resolve(&templates, &reference)
        .unwrap()
        .into_record()
        .unwrap();
    assert_eq!(reference, before);
    assert_eq!(record.get("age"), Some(&Value::Int(11)));
    assert_eq!(record.get("again"), Some(&Value::Int(10)));
}
