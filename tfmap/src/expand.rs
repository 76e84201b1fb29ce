//! Configuration tree to remote params
//!
//! `expand` walks a `FieldSpec` depth-first and attaches every explicitly set
//! value under its remote name after coercion. Every problem found in one call
//! is collected; the call either yields the complete params or fails with all
//! of them.

use crate::coerce;
use crate::diff::Diff;
use crate::error::{Result, TfmapError};
use crate::remote::RemoteParams;
use crate::schema::{Block, FieldSpec, FieldType, NestingMode};
use crate::types::{AttributePath, Diagnostics, Dynamic, DynamicValue};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Expand a full configuration for a create call
pub fn expand(config: &DynamicValue, spec: &FieldSpec) -> Result<RemoteParams> {
    let values = config.attributes()?;
    let mut diagnostics = Diagnostics::new();
    let params = expand_block(&values, &spec.block, &AttributePath::root(), &mut diagnostics);
    if diagnostics.has_errors() {
        return Err(TfmapError::Validation(diagnostics));
    }
    Ok(RemoteParams::from(params))
}

/// Run expand's checks without keeping the output
pub fn validate(config: &DynamicValue, spec: &FieldSpec) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    match config.attributes() {
        Ok(values) => {
            expand_block(&values, &spec.block, &AttributePath::root(), &mut diagnostics);
        }
        Err(e) => diagnostics.add_error("Invalid configuration", Some(e.to_string())),
    }
    diagnostics
}

/// Expand only what an in-place update needs to send.
///
/// The whole desired tree is validated first. Of the changed fields, only
/// updatable ones are emitted: metadata as a key-level merge, cleared strings
/// as `""`, nested blocks in full.
pub fn expand_update(diff: &Diff, spec: &FieldSpec) -> Result<RemoteParams> {
    let previous = diff.previous.attributes()?;
    let desired = diff.desired.attributes()?;

    let mut diagnostics = Diagnostics::new();
    let full = expand_block(&desired, &spec.block, &AttributePath::root(), &mut diagnostics);
    if diagnostics.has_errors() {
        return Err(TfmapError::Validation(diagnostics));
    }

    let mut params = RemoteParams::new();
    for field in &spec.block.attributes {
        if !field.is_updatable() || !diff.has_change(&field.name) {
            continue;
        }
        let path = AttributePath::new(&field.name);
        match field.r#type {
            FieldType::Metadata => {
                let before = metadata_map(previous.get(&field.name), &path)?;
                let after = metadata_map(desired.get(&field.name), &path)?;
                let merged: Map<String, Value> = expand_metadata(&before, &after)
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect();
                params.insert(field.remote_name.clone(), Value::Object(merged));
            }
            _ => match full.get(&field.remote_name) {
                Some(value) => params.insert(field.remote_name.clone(), value.clone()),
                None if matches!(field.r#type, FieldType::String) => {
                    tracing::debug!("Clearing {} with an empty string", field.name);
                    params.insert(field.remote_name.clone(), Value::String(String::new()));
                }
                None => {
                    tracing::debug!("{} was unset; the API keeps its current value", field.name);
                }
            },
        }
    }

    for nested in &spec.block.block_types {
        if nested.force_new || !diff.has_change(&nested.type_name) {
            continue;
        }
        if let Some(value) = full.get(&nested.remote_name) {
            params.insert(nested.remote_name.clone(), value.clone());
        }
    }

    Ok(params)
}

/// Key-level metadata merge: every desired key with its value, plus `""` for
/// each key dropped since `previous` so the API deletes it
pub fn expand_metadata(
    previous: &HashMap<String, String>,
    desired: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut out = desired.clone();
    for key in previous.keys() {
        if !desired.contains_key(key) {
            tracing::trace!("Removing metadata key {}", key);
            out.insert(key.clone(), String::new());
        }
    }
    out
}

/// Read a metadata value from the tree as a plain string map
pub fn metadata_map(
    value: Option<&Dynamic>,
    path: &AttributePath,
) -> Result<HashMap<String, String>> {
    match value {
        None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(HashMap::new()),
        Some(Dynamic::Map(m)) => m
            .iter()
            .filter(|(_, v)| v.is_set())
            .map(|(k, v)| match v {
                Dynamic::String(s) => Ok((k.clone(), s.clone())),
                other => Err(TfmapError::TypeMismatch {
                    path: path.clone().key(k).to_string(),
                    expected: "string".to_string(),
                    actual: other.type_name().to_string(),
                }),
            })
            .collect(),
        Some(other) => Err(TfmapError::TypeMismatch {
            path: path.to_string(),
            expected: "map".to_string(),
            actual: other.type_name().to_string(),
        }),
    }
}

fn expand_block(
    values: &HashMap<String, Dynamic>,
    block: &Block,
    path: &AttributePath,
    diagnostics: &mut Diagnostics,
) -> Map<String, Value> {
    let mut keys: Vec<&String> = values.keys().collect();
    keys.sort();
    for key in keys {
        if !block.has_key(key) {
            diagnostics.add_attribute_error(
                &path.child(key),
                "Unsupported argument",
                format!("An argument named \"{}\" is not expected here.", key),
            );
        }
    }

    let mut out = Map::new();
    for field in &block.attributes {
        let field_path = path.child(&field.name);
        let Some(value) = values.get(&field.name).filter(|v| v.is_set()) else {
            if field.required {
                diagnostics.add_attribute_error(
                    &field_path,
                    "Missing required argument",
                    format!(
                        "The argument \"{}\" is required, but no definition was found.",
                        field.name
                    ),
                );
            }
            continue;
        };
        if field.is_computed_only() {
            tracing::trace!("Skipping computed field {}", field_path);
            continue;
        }
        for validator in &field.validators {
            validator.validate(value, &field_path, diagnostics);
        }
        if let Some(encoded) = coerce::expand_value(value, &field.r#type, &field_path, diagnostics) {
            out.insert(field.remote_name.clone(), encoded);
        }
    }

    for nested in &block.block_types {
        let nested_path = path.child(&nested.type_name);
        let items: Vec<Dynamic> = match values.get(&nested.type_name) {
            None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Vec::new(),
            Some(Dynamic::List(items)) => items.clone(),
            Some(single @ Dynamic::Map(_)) if nested.nesting == NestingMode::Single => {
                vec![single.clone()]
            }
            Some(other) => {
                diagnostics.add_attribute_error(
                    &nested_path,
                    "Incorrect attribute value type",
                    format!("{} must be a list of blocks, got {}", nested_path, other.type_name()),
                );
                continue;
            }
        };

        if items.len() < nested.min_items {
            diagnostics.add_attribute_error(
                &nested_path,
                format!("Insufficient {} blocks", nested.type_name),
                format!(
                    "At least {} \"{}\" blocks are required.",
                    nested.min_items, nested.type_name
                ),
            );
        }
        if let Some(max) = nested.max_items {
            if items.len() > max {
                diagnostics.add_attribute_error(
                    &nested_path,
                    format!("Too many {} blocks", nested.type_name),
                    format!("No more than {} \"{}\" blocks are allowed.", max, nested.type_name),
                );
            }
        }
        if items.is_empty() {
            continue;
        }

        let list = Dynamic::List(items);
        for validator in &nested.validators {
            validator.validate(&list, &nested_path, diagnostics);
        }

        let mut expanded = Vec::new();
        for (i, item) in list.as_list().unwrap_or_default().iter().enumerate() {
            let item_path = nested_path.clone().index(i as i64);
            match item {
                Dynamic::Map(m) => {
                    expanded.push(Value::Object(expand_block(m, &nested.block, &item_path, diagnostics)))
                }
                other => diagnostics.add_attribute_error(
                    &item_path,
                    "Incorrect attribute value type",
                    format!("{} must be a block, got {}", item_path, other.type_name()),
                ),
            }
        }

        let encoded = match nested.nesting {
            NestingMode::Single => expanded.into_iter().next(),
            NestingMode::List | NestingMode::Set => Some(Value::Array(expanded)),
        };
        if let Some(encoded) = encoded {
            out.insert(nested.remote_name.clone(), encoded);
        }
    }

    for constraint in &block.constraints {
        constraint.check(values, path, diagnostics);
    }

    for rule in &block.omissions {
        if !rule.applies(values) {
            continue;
        }
        for name in &rule.fields {
            if let Some(remote) = block.remote_name(name) {
                if out.remove(remote).is_some() {
                    tracing::debug!(
                        "Omitting {} because {} is one of [{}]",
                        path.child(name),
                        rule.when,
                        rule.values.join(", ")
                    );
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{Constraint, OmitWhen};
    use crate::schema::{FieldBuilder, FieldSpecBuilder, NestedBlockBuilder, NumberKind};
    use crate::validator::OneOfValidator;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> DynamicValue {
        DynamicValue::new(serde_json::from_value(value).unwrap())
    }

    fn price_spec() -> FieldSpec {
        FieldSpecBuilder::new()
            .attribute(FieldBuilder::string("price_id").remote("id").computed().build())
            .attribute(FieldBuilder::string("currency").required().force_new().build())
            .attribute(FieldBuilder::string("nickname").optional().build())
            .attribute(FieldBuilder::bool("active").optional().default(true).build())
            .attribute(FieldBuilder::int("unit_amount").optional().force_new().build())
            .attribute(FieldBuilder::decimal("unit_amount_decimal").optional().force_new().build())
            .attribute(
                FieldBuilder::string("billing_scheme")
                    .optional()
                    .force_new()
                    .validator(OneOfValidator::new(&["per_unit", "tiered"]))
                    .build(),
            )
            .attribute(FieldBuilder::metadata("metadata").build())
            .attribute(
                FieldBuilder::object(
                    "recurring",
                    vec![
                        FieldBuilder::string("interval").required().build(),
                        FieldBuilder::new("interval_count", FieldType::NumericString(NumberKind::Int))
                            .optional()
                            .build(),
                    ],
                )
                .optional()
                .force_new()
                .build(),
            )
            .block(
                NestedBlockBuilder::list("tier")
                    .remote("tiers")
                    .write_only()
                    .force_new()
                    .attribute(FieldBuilder::int("up_to").optional().build())
                    .attribute(FieldBuilder::int("flat_amount").optional().build())
                    .attribute(FieldBuilder::decimal("flat_amount_decimal").optional().build())
                    .attribute(FieldBuilder::int("unit_amount").optional().build())
                    .constraint(Constraint::conflicts(&["flat_amount", "flat_amount_decimal"]))
                    .build(),
            )
            .constraint(Constraint::conflicts(&["unit_amount", "unit_amount_decimal"]))
            .omit(OmitWhen::new(
                &["unit_amount", "unit_amount_decimal"],
                "billing_scheme",
                &["tiered"],
            ))
            .build()
    }

    #[test]
    fn expand_sends_only_set_fields_under_remote_names() {
        let params = expand(
            &tree(json!({
                "currency": "usd",
                "unit_amount": 0,
                "nickname": null,
                "recurring": {"interval": "month", "interval_count": "3"}
            })),
            &price_spec(),
        )
        .unwrap();

        assert_eq!(
            params.into_value(),
            json!({
                "currency": "usd",
                "unit_amount": 0,
                "recurring": {"interval": "month", "interval_count": 3}
            })
        );
    }

    #[test]
    fn expand_never_sends_computed_fields() {
        let params = expand(
            &tree(json!({"currency": "usd", "price_id": "price_123"})),
            &price_spec(),
        )
        .unwrap();

        assert!(!params.contains_key("id"));
    }

    #[test]
    fn expand_keeps_tier_order() {
        let params = expand(
            &tree(json!({
                "currency": "usd",
                "billing_scheme": "tiered",
                "tier": [
                    {"up_to": 10, "unit_amount": 100},
                    {"up_to": 20, "unit_amount": 90},
                    {"unit_amount": 80}
                ]
            })),
            &price_spec(),
        )
        .unwrap();

        assert_eq!(
            params.get("tiers"),
            Some(&json!([
                {"up_to": 10, "unit_amount": 100},
                {"up_to": 20, "unit_amount": 90},
                {"unit_amount": 80}
            ]))
        );
    }

    #[test]
    fn expand_omits_unit_amounts_when_tiered() {
        let params = expand(
            &tree(json!({
                "currency": "usd",
                "billing_scheme": "tiered",
                "unit_amount_decimal": 12.5,
                "tier": [{"up_to": 10, "unit_amount": 100}]
            })),
            &price_spec(),
        )
        .unwrap();

        assert!(!params.contains_key("unit_amount"));
        assert!(!params.contains_key("unit_amount_decimal"));
        assert!(params.contains_key("tiers"));
    }

    #[test]
    fn expand_collects_every_failure() {
        let err = expand(
            &tree(json!({
                "billing_scheme": "volume",
                "unit_amount": 100,
                "unit_amount_decimal": 100.5,
                "recurring": {"interval": "month", "interval_count": "often"},
                "tier": [{"flat_amount": 100, "flat_amount_decimal": 100.5}],
                "colour": "blue"
            })),
            &price_spec(),
        )
        .unwrap_err();

        let diags = err.diagnostics().unwrap();
        let summaries: Vec<&str> = diags.errors.iter().map(|d| d.summary.as_str()).collect();
        assert!(summaries.contains(&"Unsupported argument"));
        assert!(summaries.contains(&"Missing required argument"));
        assert!(summaries.contains(&"Invalid numeric string"));
        assert!(summaries.iter().any(|s| s.contains("must be one of")));
        assert_eq!(
            summaries
                .iter()
                .filter(|s| **s == "Conflicting configuration arguments")
                .count(),
            2
        );
        assert_eq!(
            diags.errors_at(&AttributePath::new("tier").index(0).attribute("flat_amount")).len(),
            1
        );
    }

    #[test]
    fn expand_rejects_too_many_single_blocks() {
        let spec = FieldSpecBuilder::new()
            .block(
                NestedBlockBuilder::single("business_profile")
                    .required()
                    .attribute(FieldBuilder::string("headline").optional().build())
                    .build(),
            )
            .build();

        let err = expand(
            &tree(json!({"business_profile": [{"headline": "a"}, {"headline": "b"}]})),
            &spec,
        )
        .unwrap_err();
        assert!(err.diagnostics().unwrap().errors[0].summary.contains("Too many"));

        let err = expand(&tree(json!({})), &spec).unwrap_err();
        assert!(err.diagnostics().unwrap().errors[0].summary.contains("Insufficient"));

        let params = expand(&tree(json!({"business_profile": [{"headline": "Hi"}]})), &spec).unwrap();
        assert_eq!(params.get("business_profile"), Some(&json!({"headline": "Hi"})));
    }

    #[test]
    fn validate_returns_diagnostics_without_output() {
        let diags = validate(&tree(json!({"unit_amount": 1.5})), &price_spec());
        assert_eq!(diags.errors.len(), 2);

        assert!(validate(&tree(json!({"currency": "usd"})), &price_spec()).is_empty());
    }

    #[test]
    fn expand_metadata_examples() {
        let map = |pairs: &[(&str, &str)]| -> HashMap<String, String> {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };

        assert_eq!(
            expand_metadata(&map(&[("a", "1"), ("b", "2")]), &map(&[("a", "1"), ("c", "3")])),
            map(&[("a", "1"), ("b", ""), ("c", "3")])
        );
        assert_eq!(expand_metadata(&map(&[]), &map(&[("x", "y")])), map(&[("x", "y")]));
        assert_eq!(expand_metadata(&map(&[("x", "y")]), &map(&[])), map(&[("x", "")]));
    }

    #[test]
    fn expand_update_sends_changed_updatable_fields() {
        let diff = Diff::new(
            tree(json!({
                "price_id": "price_123",
                "currency": "usd",
                "nickname": "Old",
                "active": true,
                "metadata": {"a": "1", "b": "2"}
            })),
            tree(json!({
                "price_id": "price_123",
                "currency": "usd",
                "active": false,
                "metadata": {"a": "1", "c": "3"}
            })),
        );

        let params = expand_update(&diff, &price_spec()).unwrap();
        assert_eq!(
            params.into_value(),
            json!({
                "nickname": "",
                "active": false,
                "metadata": {"a": "1", "b": "", "c": "3"}
            })
        );
    }

    #[test]
    fn expand_update_skips_force_new_changes() {
        let diff = Diff::new(
            tree(json!({"currency": "usd", "unit_amount": 100})),
            tree(json!({"currency": "eur", "unit_amount": 200})),
        );

        assert!(expand_update(&diff, &price_spec()).unwrap().is_empty());
    }

    #[test]
    fn expand_update_validates_desired_tree() {
        let diff = Diff::new(
            tree(json!({"currency": "usd"})),
            tree(json!({"nickname": "No currency"})),
        );

        assert!(matches!(
            expand_update(&diff, &price_spec()),
            Err(TfmapError::Validation(_))
        ));
    }
}
