use crate::schema::FieldSpec;
use crate::types::{AttributePath, Dynamic, DynamicValue};

/// Previous and desired attribute trees of one resource
#[derive(Debug, Clone, PartialEq)]
pub struct Diff {
    pub previous: DynamicValue,
    pub desired: DynamicValue,
}

impl Diff {
    pub fn new(previous: DynamicValue, desired: DynamicValue) -> Self {
        Self { previous, desired }
    }

    /// A diff for a resource that does not exist yet
    pub fn create(desired: DynamicValue) -> Self {
        Self {
            previous: DynamicValue::null(),
            desired,
        }
    }

    /// Previous and desired value of a top-level key; absent reads as null
    pub fn get_change(&self, key: &str) -> (Dynamic, Dynamic) {
        let path = AttributePath::new(key);
        (
            self.previous.get(&path).cloned().unwrap_or(Dynamic::Null),
            self.desired.get(&path).cloned().unwrap_or(Dynamic::Null),
        )
    }

    pub fn has_change(&self, key: &str) -> bool {
        let (previous, desired) = self.get_change(key);
        !values_equal(&previous, &desired)
    }

    /// Top-level keys declared by the field spec whose value changed, in declaration order
    pub fn changed_fields<'a>(&self, spec: &'a FieldSpec) -> Vec<&'a str> {
        let attributes = spec.block.attributes.iter().map(|a| a.name.as_str());
        let blocks = spec.block.block_types.iter().map(|b| b.type_name.as_str());
        attributes
            .chain(blocks)
            .filter(|name| self.has_change(name))
            .collect()
    }

    /// Changed force-new keys of an existing resource. Unknown desired values
    /// are left to the apply step. Creates and destroys replace nothing.
    pub fn requires_replace(&self, spec: &FieldSpec) -> Vec<AttributePath> {
        if self.previous.is_null() || self.desired.is_null() {
            return Vec::new();
        }
        let attributes = spec
            .block
            .attributes
            .iter()
            .filter(|a| a.force_new)
            .map(|a| a.name.as_str());
        let blocks = spec
            .block
            .block_types
            .iter()
            .filter(|b| b.force_new)
            .map(|b| b.type_name.as_str());
        attributes
            .chain(blocks)
            .filter(|name| {
                let (previous, desired) = self.get_change(name);
                !matches!(desired, Dynamic::Unknown) && !values_equal(&previous, &desired)
            })
            .map(AttributePath::new)
            .collect()
    }
}

/// Structural equality where null, unknown, an empty list and an empty map
/// all read as "not set"
pub(crate) fn values_equal(a: &Dynamic, b: &Dynamic) -> bool {
    match (a, b) {
        (a, b) if is_empty(a) && is_empty(b) => true,
        (Dynamic::Bool(a), Dynamic::Bool(b)) => a == b,
        (Dynamic::Number(a), Dynamic::Number(b)) => a == b,
        (Dynamic::String(a), Dynamic::String(b)) => a == b,
        (Dynamic::List(a), Dynamic::List(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        }
        (Dynamic::Map(a), Dynamic::Map(b)) => {
            let set_keys = |m: &std::collections::HashMap<String, Dynamic>| {
                m.values().filter(|v| !is_empty(v)).count()
            };
            set_keys(a) == set_keys(b)
                && a.iter().all(|(k, v)| {
                    values_equal(v, b.get(k).unwrap_or(&Dynamic::Null))
                })
        }
        _ => false,
    }
}

fn is_empty(value: &Dynamic) -> bool {
    match value {
        Dynamic::Null | Dynamic::Unknown => true,
        Dynamic::List(items) => items.is_empty(),
        Dynamic::Map(m) => m.is_empty(),
        _ => false,
    }
}
