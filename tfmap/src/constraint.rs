//! Declarative cross-field rules checked within one block

use crate::types::{AttributePath, Diagnostics, Dynamic};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// At most one of the named keys may be set
    ConflictsWith(Vec<String>),
    /// Exactly one of the named keys must be set
    ExactlyOneOf(Vec<String>),
    /// When `field` is set, `requires` must be set too
    RequiredWith { field: String, requires: String },
    /// `field` must be set while `when` holds one of `values`
    RequiredWhen {
        field: String,
        when: String,
        values: Vec<String>,
    },
    /// `field` may only be set while `when` holds one of `values`
    OnlyWhen {
        field: String,
        when: String,
        values: Vec<String>,
    },
}

impl Constraint {
    pub fn conflicts(keys: &[&str]) -> Self {
        Constraint::ConflictsWith(to_strings(keys))
    }

    pub fn exactly_one_of(keys: &[&str]) -> Self {
        Constraint::ExactlyOneOf(to_strings(keys))
    }

    pub fn required_with(field: &str, requires: &str) -> Self {
        Constraint::RequiredWith {
            field: field.to_string(),
            requires: requires.to_string(),
        }
    }

    pub fn required_when(field: &str, when: &str, values: &[&str]) -> Self {
        Constraint::RequiredWhen {
            field: field.to_string(),
            when: when.to_string(),
            values: to_strings(values),
        }
    }

    pub fn only_when(field: &str, when: &str, values: &[&str]) -> Self {
        Constraint::OnlyWhen {
            field: field.to_string(),
            when: when.to_string(),
            values: to_strings(values),
        }
    }

    /// Check the rule against the values of one block, attributing failures
    /// to keys under `path`
    pub fn check(
        &self,
        values: &HashMap<String, Dynamic>,
        path: &AttributePath,
        diagnostics: &mut Diagnostics,
    ) {
        match self {
            Constraint::ConflictsWith(keys) => {
                let set: Vec<&String> = keys.iter().filter(|k| is_present(values, k)).collect();
                if set.len() > 1 {
                    diagnostics.add_attribute_error(
                        &path.child(set[0]),
                        "Conflicting configuration arguments",
                        format!(
                            "\"{}\": only one of [{}] can be specified",
                            set[0],
                            join(keys)
                        ),
                    );
                }
            }
            Constraint::ExactlyOneOf(keys) => {
                let set: Vec<&String> = keys.iter().filter(|k| is_present(values, k)).collect();
                match set.len() {
                    1 => {}
                    0 => diagnostics.add_attribute_error(
                        path,
                        "Invalid combination of arguments",
                        format!("one of [{}] must be specified", join(keys)),
                    ),
                    _ => diagnostics.add_attribute_error(
                        &path.child(set[0]),
                        "Invalid combination of arguments",
                        format!(
                            "\"{}\": only one of [{}] can be specified, but [{}] were specified",
                            set[0],
                            join(keys),
                            set.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
                        ),
                    ),
                }
            }
            Constraint::RequiredWith { field, requires } => {
                if is_present(values, field) && !is_present(values, requires) {
                    diagnostics.add_attribute_error(
                        &path.child(field),
                        "Missing required argument",
                        format!("\"{}\": all of [{}, {}] must be specified", field, field, requires),
                    );
                }
            }
            Constraint::RequiredWhen {
                field,
                when,
                values: allowed,
            } => {
                if let Some(current) = scalar(values, when) {
                    if allowed.contains(&current) && !is_present(values, field) {
                        diagnostics.add_attribute_error(
                            &path.child(field),
                            "Missing required argument",
                            format!(
                                "\"{}\" is required when {} is \"{}\"",
                                field, when, current
                            ),
                        );
                    }
                }
            }
            Constraint::OnlyWhen {
                field,
                when,
                values: allowed,
            } => {
                if !is_present(values, field) {
                    return;
                }
                let current = scalar(values, when);
                if !current.as_ref().is_some_and(|c| allowed.contains(c)) {
                    diagnostics.add_attribute_error(
                        &path.child(field),
                        "Invalid combination of arguments",
                        format!(
                            "\"{}\" can only be specified when {} is one of [{}]",
                            field,
                            when,
                            join(allowed)
                        ),
                    );
                }
            }
        }
    }
}

/// Drops fields from the remote params while a condition holds.
/// Unlike a constraint this never fails: the remote side simply never sees them.
#[derive(Debug, Clone, PartialEq)]
pub struct OmitWhen {
    pub fields: Vec<String>,
    pub when: String,
    pub values: Vec<String>,
}

impl OmitWhen {
    pub fn new(fields: &[&str], when: &str, values: &[&str]) -> Self {
        Self {
            fields: to_strings(fields),
            when: when.to_string(),
            values: to_strings(values),
        }
    }

    pub fn applies(&self, values: &HashMap<String, Dynamic>) -> bool {
        scalar(values, &self.when).is_some_and(|v| self.values.contains(&v))
    }
}

/// Nested blocks count as present only with at least one element
pub(crate) fn is_present(values: &HashMap<String, Dynamic>, key: &str) -> bool {
    match values.get(key) {
        Some(Dynamic::List(items)) => !items.is_empty(),
        Some(v) => v.is_set(),
        None => false,
    }
}

fn scalar(values: &HashMap<String, Dynamic>, key: &str) -> Option<String> {
    match values.get(key)? {
        Dynamic::String(s) => Some(s.clone()),
        Dynamic::Bool(b) => Some(b.to_string()),
        Dynamic::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn join(keys: &[String]) -> String {
    keys.join(", ")
}
