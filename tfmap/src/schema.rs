//! Field specifications and builders for tfmap
//!
//! A `FieldSpec` describes one resource kind: which configuration keys exist,
//! the remote field each maps to, how values are coerced on the way out and
//! back, and which cross-field rules apply. Specs are built once per process
//! and shared read-only by every expand/flatten call.

use crate::constraint::{Constraint, OmitWhen};
use crate::types::Dynamic;
use crate::validator::Validator;
use std::sync::Arc;

/// Numeric target for string-encoded numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Int,
    Float,
}

/// FieldType pairs the configuration-side shape with its remote encoding
#[derive(Debug, Clone)]
pub enum FieldType {
    String,
    /// Whole number; configuration numbers must be integral
    Int,
    Float,
    Bool,
    /// Number in configuration, decimal string on the wire
    Decimal,
    /// String in configuration, number on the wire
    NumericString(NumberKind),
    /// RFC 3339 string in configuration, unix seconds on the wire
    Timestamp,
    /// String map merged key-by-key on the remote side; removals are sent as ""
    Metadata,
    List(Box<FieldType>),
    Set(Box<FieldType>),
    Map(Box<FieldType>),
    /// Map with a fixed set of keys, each mapped to its own remote field
    Object(Vec<Field>),
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Decimal => "decimal",
            FieldType::NumericString(NumberKind::Int) => "integer string",
            FieldType::NumericString(NumberKind::Float) => "number string",
            FieldType::Timestamp => "timestamp",
            FieldType::Metadata => "metadata",
            FieldType::List(_) => "list",
            FieldType::Set(_) => "set",
            FieldType::Map(_) => "map",
            FieldType::Object(_) => "object",
        }
    }
}

/// Field describes a single configuration attribute
#[derive(Clone)]
pub struct Field {
    pub name: String,
    pub remote_name: String,
    pub r#type: FieldType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    /// Changing the value replaces the remote object
    pub force_new: bool,
    /// The API never echoes this value back
    pub write_only: bool,
    pub default: Option<Dynamic>,
    pub validators: Vec<Arc<dyn Validator>>,
}

impl Field {
    /// Computed-only fields are reported by the API and never sent to it
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }

    /// Whether an in-place update may carry this field
    pub fn is_updatable(&self) -> bool {
        !self.force_new && !self.is_computed_only()
    }
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("remote_name", &self.remote_name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field("force_new", &self.force_new)
            .field("write_only", &self.write_only)
            .field("default", &self.default)
            .field(
                "validators",
                &format!("{} validators", self.validators.len()),
            )
            .finish()
    }
}

/// Block groups fields, nested blocks and the rules that tie them together
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub attributes: Vec<Field>,
    pub block_types: Vec<NestedBlock>,
    pub constraints: Vec<Constraint>,
    pub omissions: Vec<OmitWhen>,
    pub description: String,
}

impl Block {
    pub fn attribute(&self, name: &str) -> Option<&Field> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn nested(&self, name: &str) -> Option<&NestedBlock> {
        self.block_types.iter().find(|b| b.type_name == name)
    }

    pub fn has_key(&self, name: &str) -> bool {
        self.attribute(name).is_some() || self.nested(name).is_some()
    }

    /// Remote field name for a configuration key
    pub fn remote_name(&self, name: &str) -> Option<&str> {
        self.attribute(name)
            .map(|a| a.remote_name.as_str())
            .or_else(|| self.nested(name).map(|b| b.remote_name.as_str()))
    }
}

/// NestingMode defines how a nested block maps onto the remote shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestingMode {
    /// At most one element in configuration, a plain object remotely
    Single,
    /// Ordered elements, a remote array in the same order
    List,
    /// Unordered elements, a remote array
    Set,
}

/// NestedBlock represents a repeated configuration block
#[derive(Clone)]
pub struct NestedBlock {
    pub type_name: String,
    pub remote_name: String,
    pub block: Block,
    pub nesting: NestingMode,
    pub min_items: usize,
    pub max_items: Option<usize>,
    pub force_new: bool,
    pub write_only: bool,
    /// Validators run against the whole element list
    pub validators: Vec<Arc<dyn Validator>>,
}

impl std::fmt::Debug for NestedBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NestedBlock")
            .field("type_name", &self.type_name)
            .field("remote_name", &self.remote_name)
            .field("block", &self.block)
            .field("nesting", &self.nesting)
            .field("min_items", &self.min_items)
            .field("max_items", &self.max_items)
            .field("force_new", &self.force_new)
            .field("write_only", &self.write_only)
            .field(
                "validators",
                &format!("{} validators", self.validators.len()),
            )
            .finish()
    }
}

/// FieldSpec is the static description of one resource kind
/// Version is used for state migration
#[derive(Debug, Clone, Default)]
pub struct FieldSpec {
    pub version: i64,
    pub block: Block,
}

/// FieldBuilder provides fluent API for building fields
/// ALWAYS use this instead of constructing Field directly
pub struct FieldBuilder {
    field: Field,
}

impl FieldBuilder {
    pub fn new(name: &str, type_: FieldType) -> Self {
        Self {
            field: Field {
                name: name.to_string(),
                remote_name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                force_new: false,
                write_only: false,
                default: None,
                validators: Vec::new(),
            },
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn int(name: &str) -> Self {
        Self::new(name, FieldType::Int)
    }

    pub fn float(name: &str) -> Self {
        Self::new(name, FieldType::Float)
    }

    pub fn bool(name: &str) -> Self {
        Self::new(name, FieldType::Bool)
    }

    pub fn decimal(name: &str) -> Self {
        Self::new(name, FieldType::Decimal)
    }

    pub fn timestamp(name: &str) -> Self {
        Self::new(name, FieldType::Timestamp)
    }

    /// Optional metadata map, the shape every billing object shares
    pub fn metadata(name: &str) -> Self {
        Self::new(name, FieldType::Metadata).optional()
    }

    pub fn list(name: &str, element: FieldType) -> Self {
        Self::new(name, FieldType::List(Box::new(element)))
    }

    pub fn set(name: &str, element: FieldType) -> Self {
        Self::new(name, FieldType::Set(Box::new(element)))
    }

    pub fn map(name: &str, element: FieldType) -> Self {
        Self::new(name, FieldType::Map(Box::new(element)))
    }

    pub fn object(name: &str, fields: Vec<Field>) -> Self {
        Self::new(name, FieldType::Object(fields))
    }

    /// Remote field name when it differs from the configuration key
    pub fn remote(mut self, remote_name: &str) -> Self {
        self.field.remote_name = remote_name.to_string();
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.field.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.field.required = true;
        self.field.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.field.optional = true;
        self.field.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.field.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.field.sensitive = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.field.force_new = true;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.field.write_only = true;
        self
    }

    pub fn default(mut self, value: impl Into<Dynamic>) -> Self {
        self.field.default = Some(value.into());
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.field.validators.push(Arc::new(validator));
        self
    }

    pub fn build(self) -> Field {
        self.field
    }
}

/// NestedBlockBuilder provides fluent API for nested blocks
pub struct NestedBlockBuilder {
    nested: NestedBlock,
}

impl NestedBlockBuilder {
    pub fn new(type_name: &str, nesting: NestingMode) -> Self {
        Self {
            nested: NestedBlock {
                type_name: type_name.to_string(),
                remote_name: type_name.to_string(),
                block: Block::default(),
                nesting,
                min_items: 0,
                max_items: match nesting {
                    NestingMode::Single => Some(1),
                    NestingMode::List | NestingMode::Set => None,
                },
                force_new: false,
                write_only: false,
                validators: Vec::new(),
            },
        }
    }

    pub fn single(type_name: &str) -> Self {
        Self::new(type_name, NestingMode::Single)
    }

    pub fn list(type_name: &str) -> Self {
        Self::new(type_name, NestingMode::List)
    }

    pub fn set(type_name: &str) -> Self {
        Self::new(type_name, NestingMode::Set)
    }

    pub fn remote(mut self, remote_name: &str) -> Self {
        self.nested.remote_name = remote_name.to_string();
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.nested.block.description = desc.to_string();
        self
    }

    pub fn attribute(mut self, field: Field) -> Self {
        self.nested.block.attributes.push(field);
        self
    }

    pub fn block(mut self, nested: NestedBlock) -> Self {
        self.nested.block.block_types.push(nested);
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.nested.block.constraints.push(constraint);
        self
    }

    /// Shorthand for `min_items(1)`
    pub fn required(self) -> Self {
        self.min_items(1)
    }

    pub fn min_items(mut self, min: usize) -> Self {
        self.nested.min_items = min;
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.nested.max_items = Some(max);
        self
    }

    pub fn force_new(mut self) -> Self {
        self.nested.force_new = true;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.nested.write_only = true;
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.nested.validators.push(Arc::new(validator));
        self
    }

    pub fn build(self) -> NestedBlock {
        self.nested
    }
}

/// FieldSpecBuilder provides fluent API for building specs
/// ALWAYS use this for consistency
pub struct FieldSpecBuilder {
    spec: FieldSpec,
}

impl FieldSpecBuilder {
    pub fn new() -> Self {
        Self {
            spec: FieldSpec::default(),
        }
    }

    pub fn version(mut self, version: i64) -> Self {
        self.spec.version = version;
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.spec.block.description = desc.to_string();
        self
    }

    pub fn attribute(mut self, field: Field) -> Self {
        self.spec.block.attributes.push(field);
        self
    }

    pub fn block(mut self, nested: NestedBlock) -> Self {
        self.spec.block.block_types.push(nested);
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.spec.block.constraints.push(constraint);
        self
    }

    pub fn omit(mut self, rule: OmitWhen) -> Self {
        self.spec.block.omissions.push(rule);
        self
    }

    pub fn build(self) -> FieldSpec {
        self.spec
    }
}

impl std::default::Default for FieldSpecBuilder {
    fn default() -> Self {
        Self::new()
    }
}
