//! Value coercion between configuration values and their remote encoding

use crate::error::{Result, TfmapError};
use crate::schema::{Field, FieldType, NumberKind};
use crate::types::{AttributePath, Diagnostics, Dynamic};
use chrono::{DateTime, SecondsFormat};
use serde_json::{Map, Number, Value};

/// Encode a set configuration value. Failures are recorded in `diagnostics`
/// and yield `None` so the caller keeps collecting.
pub(crate) fn expand_value(
    value: &Dynamic,
    ty: &FieldType,
    path: &AttributePath,
    diagnostics: &mut Diagnostics,
) -> Option<Value> {
    match (ty, value) {
        (FieldType::String, Dynamic::String(s)) => Some(Value::String(s.clone())),
        (FieldType::Bool, Dynamic::Bool(b)) => Some(Value::Bool(*b)),
        (FieldType::Int, Dynamic::Number(n)) => match integral(*n) {
            Some(i) => Some(Value::from(i)),
            None => {
                diagnostics.add_attribute_error(
                    path,
                    "Invalid integer value",
                    format!("{} must be a whole number, got {}", path, n),
                );
                None
            }
        },
        (FieldType::Float, Dynamic::Number(n)) => float(*n, path, diagnostics),
        (FieldType::Decimal, Dynamic::Number(n)) => {
            if n.is_finite() {
                Some(Value::String(n.to_string()))
            } else {
                diagnostics.add_attribute_error(
                    path,
                    "Invalid decimal value",
                    format!("{} must be a finite number", path),
                );
                None
            }
        }
        (FieldType::NumericString(kind), Dynamic::String(s)) => {
            let parsed = match kind {
                NumberKind::Int => s.trim().parse::<i64>().ok().map(Value::from),
                NumberKind::Float => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number),
            };
            if parsed.is_none() {
                diagnostics.add_attribute_error(
                    path,
                    "Invalid numeric string",
                    format!(
                        "{} must be a string representing {} (e.g. \"52\"), got \"{}\"",
                        path,
                        match kind {
                            NumberKind::Int => "an integer",
                            NumberKind::Float => "a number",
                        },
                        s
                    ),
                );
            }
            parsed
        }
        (FieldType::Timestamp, Dynamic::String(s)) => match DateTime::parse_from_rfc3339(s) {
            Ok(t) => Some(Value::from(t.timestamp())),
            Err(e) => {
                diagnostics.add_attribute_error(
                    path,
                    "Invalid timestamp",
                    format!(
                        "can't convert time \"{}\" to unix timestamp, it must be RFC3339-compliant: {}",
                        s, e
                    ),
                );
                None
            }
        },
        (FieldType::Metadata, Dynamic::Map(m)) => {
            expand_map(m, &FieldType::String, path, diagnostics)
        }
        (FieldType::Map(element), Dynamic::Map(m)) => expand_map(m, element, path, diagnostics),
        (FieldType::List(element) | FieldType::Set(element), Dynamic::List(items)) => {
            let mut out = Vec::with_capacity(items.len());
            let mut ok = true;
            for (i, item) in items.iter().enumerate() {
                let item_path = path.clone().index(i as i64);
                if !item.is_set() {
                    diagnostics.add_attribute_error(
                        &item_path,
                        "Null value in collection",
                        format!("{} elements may not be null", path),
                    );
                    ok = false;
                    continue;
                }
                match expand_value(item, element, &item_path, diagnostics) {
                    Some(v) => out.push(v),
                    None => ok = false,
                }
            }
            ok.then_some(Value::Array(out))
        }
        (FieldType::Object(fields), Dynamic::Map(m)) => expand_object(m, fields, path, diagnostics),
        (ty, value) => {
            diagnostics.add_attribute_error(
                path,
                "Incorrect attribute value type",
                format!("{} must be {}, got {}", path, ty.name(), value.type_name()),
            );
            None
        }
    }
}

fn expand_map(
    m: &std::collections::HashMap<String, Dynamic>,
    element: &FieldType,
    path: &AttributePath,
    diagnostics: &mut Diagnostics,
) -> Option<Value> {
    let mut out = Map::new();
    let mut ok = true;
    for (k, v) in m {
        let key_path = path.clone().key(k);
        if !v.is_set() {
            diagnostics.add_attribute_error(
                &key_path,
                "Null value in map",
                format!("{} values may not be null", path),
            );
            ok = false;
            continue;
        }
        match expand_value(v, element, &key_path, diagnostics) {
            Some(encoded) => {
                out.insert(k.clone(), encoded);
            }
            None => ok = false,
        }
    }
    ok.then_some(Value::Object(out))
}

fn expand_object(
    m: &std::collections::HashMap<String, Dynamic>,
    fields: &[Field],
    path: &AttributePath,
    diagnostics: &mut Diagnostics,
) -> Option<Value> {
    let before = diagnostics.errors.len();
    let mut keys: Vec<&String> = m.keys().collect();
    keys.sort();
    for key in keys {
        if !fields.iter().any(|f| &f.name == key) {
            diagnostics.add_attribute_error(
                &path.clone().key(key),
                "Unsupported argument",
                format!("An argument named \"{}\" is not expected here.", key),
            );
        }
    }

    let mut out = Map::new();
    for field in fields {
        let field_path = path.clone().key(&field.name);
        match m.get(&field.name).filter(|v| v.is_set()) {
            None if field.required => diagnostics.add_attribute_error(
                &field_path,
                "Missing required argument",
                format!("The argument \"{}\" is required, but no definition was found.", field.name),
            ),
            None => {}
            Some(_) if field.is_computed_only() => {}
            Some(v) => {
                for validator in &field.validators {
                    validator.validate(v, &field_path, diagnostics);
                }
                if let Some(encoded) = expand_value(v, &field.r#type, &field_path, diagnostics) {
                    out.insert(field.remote_name.clone(), encoded);
                }
            }
        }
    }
    (diagnostics.errors.len() == before).then_some(Value::Object(out))
}

/// Decode a remote value back into its configuration form
pub(crate) fn flatten_value(value: &Value, ty: &FieldType, path: &AttributePath) -> Result<Dynamic> {
    match (ty, value) {
        (_, Value::Null) => Ok(Dynamic::Null),
        (FieldType::String, Value::String(s)) => Ok(Dynamic::String(s.clone())),
        (FieldType::Bool, Value::Bool(b)) => Ok(Dynamic::Bool(*b)),
        (FieldType::Int | FieldType::Float | FieldType::Decimal, Value::Number(n)) => n
            .as_f64()
            .map(Dynamic::Number)
            .ok_or_else(|| mismatch(path, ty, value)),
        (FieldType::Decimal, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Dynamic::Number)
            .map_err(|_| mismatch(path, ty, value)),
        (FieldType::NumericString(_), Value::Number(n)) => Ok(Dynamic::String(n.to_string())),
        (FieldType::NumericString(_), Value::String(s)) => Ok(Dynamic::String(s.clone())),
        (FieldType::Timestamp, Value::Number(n)) => {
            let rendered = n
                .as_i64()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                .ok_or_else(|| mismatch(path, ty, value))?;
            Ok(Dynamic::String(rendered))
        }
        (FieldType::Metadata, Value::Object(o)) => flatten_map(o, &FieldType::String, path),
        (FieldType::Map(element), Value::Object(o)) => flatten_map(o, element, path),
        (FieldType::List(element) | FieldType::Set(element), Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| flatten_value(item, element, &path.clone().index(i as i64)))
            .collect::<Result<Vec<_>>>()
            .map(Dynamic::List),
        (FieldType::Object(fields), Value::Object(o)) => {
            let mut out = std::collections::HashMap::new();
            for field in fields.iter().filter(|f| !f.write_only) {
                match o.get(&field.remote_name) {
                    None | Some(Value::Null) => {}
                    Some(v) => {
                        let decoded = flatten_value(v, &field.r#type, &path.clone().key(&field.name))?;
                        out.insert(field.name.clone(), decoded);
                    }
                }
            }
            Ok(Dynamic::Map(out))
        }
        _ => Err(mismatch(path, ty, value)),
    }
}

fn flatten_map(o: &Map<String, Value>, element: &FieldType, path: &AttributePath) -> Result<Dynamic> {
    let mut out = std::collections::HashMap::with_capacity(o.len());
    for (k, v) in o {
        out.insert(k.clone(), flatten_value(v, element, &path.clone().key(k))?);
    }
    Ok(Dynamic::Map(out))
}

fn integral(n: f64) -> Option<i64> {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

fn float(n: f64, path: &AttributePath, diagnostics: &mut Diagnostics) -> Option<Value> {
    let encoded = Number::from_f64(n).map(Value::Number);
    if encoded.is_none() {
        diagnostics.add_attribute_error(
            path,
            "Invalid number",
            format!("{} must be a finite number", path),
        );
    }
    encoded
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(path: &AttributePath, ty: &FieldType, value: &Value) -> TfmapError {
    TfmapError::TypeMismatch {
        path: path.to_string(),
        expected: ty.name().to_string(),
        actual: json_type_name(value).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldBuilder;
    use serde_json::json;
    use std::collections::HashMap;

    fn expand_ok(value: Dynamic, ty: &FieldType) -> Value {
        let mut diags = Diagnostics::new();
        let out = expand_value(&value, ty, &AttributePath::new("field"), &mut diags);
        assert!(!diags.has_errors(), "unexpected errors: {}", diags);
        out.unwrap()
    }

    fn expand_err(value: Dynamic, ty: &FieldType) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let out = expand_value(&value, ty, &AttributePath::new("field"), &mut diags);
        assert!(out.is_none());
        diags
    }

    #[test]
    fn int_requires_whole_numbers() {
        assert_eq!(expand_ok(Dynamic::Number(1000.0), &FieldType::Int), json!(1000));

        let diags = expand_err(Dynamic::Number(10.5), &FieldType::Int);
        assert_eq!(diags.errors[0].summary, "Invalid integer value");
    }

    #[test]
    fn decimal_encodes_as_string() {
        assert_eq!(expand_ok(Dynamic::Number(12.5), &FieldType::Decimal), json!("12.5"));
        assert_eq!(expand_ok(Dynamic::Number(100.0), &FieldType::Decimal), json!("100"));
        let diags = expand_err(Dynamic::from("1.50"), &FieldType::Decimal);
        assert_eq!(diags.errors[0].summary, "Incorrect attribute value type");
        assert_eq!(
            flatten_value(&json!("0.0125"), &FieldType::Decimal, &AttributePath::root()).unwrap(),
            Dynamic::Number(0.0125)
        );
    }

    #[test]
    fn numeric_string_parses_to_number() {
        let ty = FieldType::NumericString(NumberKind::Int);
        assert_eq!(expand_ok(Dynamic::from("52"), &ty), json!(52));

        let diags = expand_err(Dynamic::from("fifty-two"), &ty);
        assert_eq!(diags.errors[0].summary, "Invalid numeric string");
        assert!(diags.errors[0].detail.contains("fifty-two"));

        assert_eq!(
            flatten_value(&json!(52), &ty, &AttributePath::root()).unwrap(),
            Dynamic::from("52")
        );
    }

    #[test]
    fn timestamp_round_trips_through_unix_seconds() {
        let encoded = expand_ok(Dynamic::from("2030-01-01T00:00:00Z"), &FieldType::Timestamp);
        assert_eq!(encoded, json!(1893456000));

        let decoded = flatten_value(&encoded, &FieldType::Timestamp, &AttributePath::root()).unwrap();
        assert_eq!(decoded, Dynamic::from("2030-01-01T00:00:00Z"));

        let diags = expand_err(Dynamic::from("next tuesday"), &FieldType::Timestamp);
        assert!(diags.errors[0].detail.contains("RFC3339"));
    }

    #[test]
    fn metadata_requires_string_values() {
        let mut m = HashMap::new();
        m.insert("team".to_string(), Dynamic::from("billing"));
        assert_eq!(
            expand_ok(Dynamic::Map(m.clone()), &FieldType::Metadata),
            json!({"team": "billing"})
        );

        m.insert("count".to_string(), Dynamic::Number(3.0));
        let diags = expand_err(Dynamic::Map(m), &FieldType::Metadata);
        assert_eq!(
            diags.errors[0].attribute,
            Some(AttributePath::new("field").key("count"))
        );
    }

    #[test]
    fn object_maps_remote_names_and_rejects_unknown_keys() {
        let ty = FieldType::Object(vec![
            FieldBuilder::string("interval").required().build(),
            FieldBuilder::new("interval_count", FieldType::NumericString(NumberKind::Int))
                .optional()
                .build(),
        ]);

        let mut m = HashMap::new();
        m.insert("interval".to_string(), Dynamic::from("month"));
        m.insert("interval_count".to_string(), Dynamic::from("3"));
        assert_eq!(
            expand_ok(Dynamic::Map(m.clone()), &ty),
            json!({"interval": "month", "interval_count": 3})
        );

        m.insert("cadence".to_string(), Dynamic::from("weekly"));
        let diags = expand_err(Dynamic::Map(m), &ty);
        assert_eq!(diags.errors[0].summary, "Unsupported argument");
    }

    #[test]
    fn list_collects_every_element_error() {
        let ty = FieldType::List(Box::new(FieldType::Int));
        let diags = expand_err(
            Dynamic::List(vec![
                Dynamic::Number(1.5),
                Dynamic::Number(2.0),
                Dynamic::from("three"),
            ]),
            &ty,
        );
        assert_eq!(diags.errors.len(), 2);
    }

    #[test]
    fn flatten_reports_type_mismatch_with_path() {
        let err = flatten_value(&json!("abc"), &FieldType::Int, &AttributePath::new("amount"))
            .unwrap_err();
        match err {
            TfmapError::TypeMismatch { path, expected, actual } => {
                assert_eq!(path, "amount");
                assert_eq!(expected, "int");
                assert_eq!(actual, "string");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn flatten_null_clears() {
        assert_eq!(
            flatten_value(&Value::Null, &FieldType::String, &AttributePath::root()).unwrap(),
            Dynamic::Null
        );
    }
}
