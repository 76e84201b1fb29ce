//! Remote object back to a configuration tree

use crate::coerce;
use crate::diff::values_equal;
use crate::error::{Result, TfmapError};
use crate::remote::RemoteObject;
use crate::schema::{Block, FieldSpec, NestingMode};
use crate::types::{AttributePath, Dynamic, DynamicValue};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Reflect a remote object onto the prior tree.
///
/// Fields the object does not carry, and write-only fields, keep their prior
/// value. A remote `null` clears the key. Set elements are paired with their
/// prior element by required attributes rather than by position.
pub fn flatten(object: &RemoteObject, spec: &FieldSpec, prior: &DynamicValue) -> Result<DynamicValue> {
    let mut values = prior.attributes()?;
    flatten_block(object.fields(), &spec.block, &AttributePath::root(), &mut values)?;
    Ok(DynamicValue::from(values))
}

fn flatten_block(
    remote: &Map<String, Value>,
    block: &Block,
    path: &AttributePath,
    values: &mut HashMap<String, Dynamic>,
) -> Result<()> {
    for field in &block.attributes {
        let field_path = path.child(&field.name);
        if field.write_only {
            tracing::trace!("Keeping write-only field {}", field_path);
            continue;
        }
        let Some(value) = remote.get(&field.remote_name) else {
            continue;
        };
        let decoded = coerce::flatten_value(value, &field.r#type, &field_path)?;
        values.insert(field.name.clone(), decoded);
    }

    for nested in &block.block_types {
        let nested_path = path.child(&nested.type_name);
        if nested.write_only {
            tracing::trace!("Keeping write-only block {}", nested_path);
            continue;
        }
        let Some(value) = remote.get(&nested.remote_name) else {
            tracing::trace!("{} not returned, keeping prior value", nested_path);
            continue;
        };

        let elements: Vec<&Map<String, Value>> = match (nested.nesting, value) {
            (_, Value::Null) => Vec::new(),
            (NestingMode::Single, Value::Object(o)) => vec![o],
            (NestingMode::List | NestingMode::Set, Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    item.as_object().ok_or_else(|| TfmapError::TypeMismatch {
                        path: nested_path.clone().index(i as i64).to_string(),
                        expected: "object".to_string(),
                        actual: coerce::json_type_name(item).to_string(),
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            (nesting, other) => {
                return Err(TfmapError::TypeMismatch {
                    path: nested_path.to_string(),
                    expected: match nesting {
                        NestingMode::Single => "object",
                        NestingMode::List | NestingMode::Set => "array",
                    }
                    .to_string(),
                    actual: coerce::json_type_name(other).to_string(),
                })
            }
        };

        let mut unmatched: Vec<Option<HashMap<String, Dynamic>>> = values
            .get(&nested.type_name)
            .and_then(Dynamic::as_list)
            .map(|items| items.iter().map(|item| item.as_map().cloned()).collect())
            .unwrap_or_default();

        let mut items = Vec::with_capacity(elements.len());
        for (i, element) in elements.into_iter().enumerate() {
            let element_path = nested_path.clone().index(i as i64);
            let prior = match nested.nesting {
                NestingMode::Set => {
                    take_matching(&mut unmatched, i, element, &nested.block, &element_path)?
                }
                NestingMode::List | NestingMode::Single => {
                    unmatched.get_mut(i).and_then(Option::take)
                }
            };
            let mut item = prior.unwrap_or_default();
            flatten_block(element, &nested.block, &element_path, &mut item)?;
            items.push(Dynamic::Map(item));
        }
        values.insert(nested.type_name.clone(), Dynamic::List(items));
    }

    Ok(())
}

/// Set elements come back in any order, so the prior element is the one
/// whose required attributes match. Without required attributes the
/// position is all there is to go on.
fn take_matching(
    unmatched: &mut [Option<HashMap<String, Dynamic>>],
    index: usize,
    element: &Map<String, Value>,
    block: &Block,
    path: &AttributePath,
) -> Result<Option<HashMap<String, Dynamic>>> {
    let keys: Vec<&str> = block
        .attributes
        .iter()
        .filter(|f| f.required && !f.write_only)
        .map(|f| f.name.as_str())
        .collect();
    if keys.is_empty() {
        return Ok(unmatched.get_mut(index).and_then(Option::take));
    }

    let mut remote = HashMap::new();
    flatten_block(element, block, path, &mut remote)?;
    let position = unmatched.iter().position(|candidate| {
        candidate.as_ref().is_some_and(|prior| {
            keys.iter().all(|key| {
                remote.get(*key).is_some_and(|value| {
                    values_equal(value, prior.get(*key).unwrap_or(&Dynamic::Null))
                })
            })
        })
    });
    Ok(position.and_then(|p| unmatched[p].take()))
}
