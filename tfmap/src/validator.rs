use crate::types::{AttributePath, Diagnostics, Dynamic};

/// Validators check a single configured value. Unset values never reach them.
pub trait Validator: Send + Sync {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics);
}

pub struct StringLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for StringLengthValidator {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        if let Some(s) = value.as_string() {
            if let Some(min) = self.min {
                if s.len() < min {
                    diagnostics.add_attribute_error(
                        path,
                        format!("{} must have minimum length of {}", path, min),
                        format!("Got length {}", s.len()),
                    );
                }
            }
            if let Some(max) = self.max {
                if s.len() > max {
                    diagnostics.add_attribute_error(
                        path,
                        format!("{} must have maximum length of {}", path, max),
                        format!("Got length {}", s.len()),
                    );
                }
            }
        }
    }
}

pub struct StringPatternValidator {
    pattern: Result<regex::Regex, regex::Error>,
    description: String,
}

impl StringPatternValidator {
    /// An invalid pattern is reported on every validated value
    pub fn new(pattern: &str, description: &str) -> Self {
        Self {
            pattern: regex::Regex::new(pattern),
            description: description.to_string(),
        }
    }
}

impl Validator for StringPatternValidator {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        let Some(s) = value.as_string() else {
            return;
        };
        match &self.pattern {
            Ok(pattern) if pattern.is_match(s) => {}
            Ok(_) => diagnostics.add_attribute_error(
                path,
                format!("{} must match {}", path, self.description),
                format!("Value '{}' does not match pattern", s),
            ),
            Err(e) => diagnostics.add_attribute_error(
                path,
                format!("Invalid validation pattern for {}", path),
                e.to_string(),
            ),
        }
    }
}

pub struct NumberRangeValidator {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Validator for NumberRangeValidator {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        if let Some(n) = value.as_number() {
            if let Some(min) = self.min {
                if n < min {
                    diagnostics.add_attribute_error(
                        path,
                        format!("{} must be at least {}", path, min),
                        format!("Got {}", n),
                    );
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    diagnostics.add_attribute_error(
                        path,
                        format!("{} must be at most {}", path, max),
                        format!("Got {}", n),
                    );
                }
            }
        }
    }
}

pub struct ListLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for ListLengthValidator {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        if let Dynamic::List(items) = value {
            if let Some(min) = self.min {
                if items.len() < min {
                    diagnostics.add_attribute_error(
                        path,
                        format!("{} must have at least {} items", path, min),
                        format!("Got {} items", items.len()),
                    );
                }
            }
            if let Some(max) = self.max {
                if items.len() > max {
                    diagnostics.add_attribute_error(
                        path,
                        format!("{} must have at most {} items", path, max),
                        format!("Got {} items", items.len()),
                    );
                }
            }
        }
    }
}

/// Enumerated string values
pub struct OneOfValidator {
    pub allowed: Vec<String>,
}

impl OneOfValidator {
    pub fn new(allowed: &[&str]) -> Self {
        Self {
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Validator for OneOfValidator {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        if let Some(s) = value.as_string() {
            if !self.allowed.iter().any(|a| a == s) {
                diagnostics.add_attribute_error(
                    path,
                    format!("{} must be one of [{}]", path, self.allowed.join(", ")),
                    format!("Got '{}'", s),
                );
            }
        }
    }
}

/// Applies the inner validator to every element of a list or set
pub struct EachElementValidator<V> {
    pub inner: V,
}

impl<V: Validator> EachElementValidator<V> {
    pub fn new(inner: V) -> Self {
        Self { inner }
    }
}

impl<V: Validator> Validator for EachElementValidator<V> {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        if let Dynamic::List(items) = value {
            for (i, item) in items.iter().enumerate() {
                if item.is_set() {
                    self.inner
                        .validate(item, &path.clone().index(i as i64), diagnostics);
                }
            }
        }
    }
}

pub struct Rfc3339Validator;

impl Validator for Rfc3339Validator {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        if let Some(s) = value.as_string() {
            if let Err(e) = chrono::DateTime::parse_from_rfc3339(s) {
                diagnostics.add_attribute_error(
                    path,
                    format!("{} must be an RFC 3339 timestamp", path),
                    format!("Value '{}' could not be parsed: {}", s, e),
                );
            }
        }
    }
}
