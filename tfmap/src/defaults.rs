//! Declared default values
//!
//! Defaults only fill keys that are absent or null. An explicitly configured
//! value, including a zero value such as `false`, is never replaced.

use crate::error::Result;
use crate::schema::{Block, FieldSpec};
use crate::types::{AttributePath, Dynamic, DynamicValue};
use std::collections::HashMap;

/// Fill every declared default the configuration leaves unset, including
/// inside nested block elements. A null tree (a planned destroy) stays null.
pub fn apply_defaults(config: &DynamicValue, spec: &FieldSpec) -> Result<DynamicValue> {
    if config.is_null() || config.is_unknown() {
        return Ok(config.clone());
    }
    let mut values = config.attributes()?;
    apply_block(&mut values, &spec.block, &AttributePath::root());
    Ok(DynamicValue::from(values))
}

fn apply_block(values: &mut HashMap<String, Dynamic>, block: &Block, path: &AttributePath) {
    for field in &block.attributes {
        let Some(default) = &field.default else {
            continue;
        };
        let unset = matches!(values.get(&field.name), None | Some(Dynamic::Null));
        if unset {
            tracing::trace!("Applying default for {}", path.child(&field.name));
            values.insert(field.name.clone(), default.clone());
        }
    }

    for nested in &block.block_types {
        if let Some(Dynamic::List(items)) = values.get_mut(&nested.type_name) {
            for (i, item) in items.iter_mut().enumerate() {
                if let Dynamic::Map(m) = item {
                    apply_block(m, &nested.block, &path.child(&nested.type_name).index(i as i64));
                }
            }
        }
    }
}
