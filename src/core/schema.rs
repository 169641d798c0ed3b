//! Parameter field schemas and their aggregation over the handler hierarchy

use crate::core::{handler::Parameters, registry::HandlerRegistry};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Fields of one handler type, keyed by field name
pub type FieldSchema = IndexMap<String, FieldSpec>;

/// Merged schemas of every concrete action, keyed by action name
pub type FieldCatalog = IndexMap<String, FieldSchema>;

/// Whether a field must be present
///
/// Serializes as `true`/`false`, or as the list of fields of which at least
/// one must be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Requirement {
    Flag(bool),
    OneOf(Vec<String>),
}

impl Default for Requirement {
    fn default() -> Self {
        Requirement::Flag(false)
    }
}

/// Declaration of a single parameter field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(default)]
    pub required: Requirement,

    #[serde(default)]
    pub default: Value,

    #[serde(default)]
    pub help: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
}

impl FieldSpec {
    pub fn optional(help: impl Into<String>) -> Self {
        Self {
            help: help.into(),
            ..Self::default()
        }
    }

    pub fn required(help: impl Into<String>) -> Self {
        Self {
            required: Requirement::Flag(true),
            help: help.into(),
            ..Self::default()
        }
    }

    /// Required unless another member of `group` is present
    pub fn one_of<I, S>(group: I, help: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: Requirement::OneOf(group.into_iter().map(Into::into).collect()),
            help: help.into(),
            ..Self::default()
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    pub fn with_options<I, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }
}

/// Merge the fields visible to `type_name`: ancestors first, the most-derived
/// declaration of a field winning
///
/// `memo` holds already merged types so shared ancestors in a diamond are
/// merged once.
pub fn merged_fields(
    registry: &HandlerRegistry,
    type_name: &str,
    memo: &mut HashMap<String, FieldSchema>,
) -> FieldSchema {
    if let Some(fields) = memo.get(type_name) {
        return fields.clone();
    }

    let Some(handler_type) = registry.get(type_name) else {
        return FieldSchema::new();
    };

    let mut fields = FieldSchema::new();
    for parent in handler_type.parents() {
        for (name, spec) in merged_fields(registry, parent, memo) {
            fields.insert(name, spec);
        }
    }
    for (name, spec) in handler_type.declared_fields() {
        fields.insert(name.clone(), spec.clone());
    }

    memo.insert(type_name.to_string(), fields.clone());
    fields
}

/// Catalog of merged schemas for every concrete type, in hierarchy order
pub fn field_catalog(registry: &HandlerRegistry) -> FieldCatalog {
    let mut memo = HashMap::new();
    let mut catalog = FieldCatalog::new();

    for handler_type in registry.walk() {
        let fields = merged_fields(registry, handler_type.type_name(), &mut memo);
        if handler_type.is_abstract() {
            continue;
        }
        catalog.insert(handler_type.action_name().to_string(), fields);
    }

    catalog
}

/// A parameter set that does not satisfy a schema
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaViolation {
    MissingField(String),
    MissingOneOf(Vec<String>),
    NotAnOption { field: String, value: Value },
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaViolation::MissingField(field) => write!(f, "missing required field '{}'", field),
            SchemaViolation::MissingOneOf(group) => {
                write!(f, "one of [{}] must be present", group.join(", "))
            }
            SchemaViolation::NotAnOption { field, value } => {
                write!(f, "value {} is not a valid option for '{}'", value, field)
            }
        }
    }
}

/// Check parameters against a merged schema
///
/// Unknown parameters are allowed; handlers receive them verbatim.
pub fn validate(schema: &FieldSchema, parameters: &Parameters) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();
    let mut reported_groups: Vec<&Vec<String>> = Vec::new();

    for (name, spec) in schema {
        let value = parameters.get(name).filter(|v| !v.is_null());

        match &spec.required {
            Requirement::Flag(true) if value.is_none() => {
                violations.push(SchemaViolation::MissingField(name.clone()));
            }
            Requirement::OneOf(group) => {
                let satisfied = group
                    .iter()
                    .any(|member| parameters.get(member).is_some_and(|v| !v.is_null()));
                if !satisfied && !reported_groups.contains(&group) {
                    reported_groups.push(group);
                    violations.push(SchemaViolation::MissingOneOf(group.clone()));
                }
            }
            _ => {}
        }

        if let (Some(value), Some(options)) = (value, &spec.options) {
            if !options.contains(value) {
                violations.push(SchemaViolation::NotAnOption {
                    field: name.clone(),
                    value: value.clone(),
                });
            }
        }
    }

    violations
}
