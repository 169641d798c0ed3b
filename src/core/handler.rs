//! Handler contract and handler type descriptors

use crate::core::{config::BootstrapConfig, schema::{FieldSchema, FieldSpec}};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Parameters of a single action, keyed by field name
pub type Parameters = Map<String, Value>;

/// Name of the abstract type every handler hierarchy is rooted at
pub const BASE_ACTION: &str = "BaseAction";

/// Executable logic bound to an action name
///
/// `Ok(true)` means the step succeeded and `Ok(false)` is a recorded, non-fatal
/// failure. Any `Err` is a hard fault that halts the whole run.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn execute(&self, parameters: &Parameters, config: &BootstrapConfig) -> anyhow::Result<bool>;
}

/// Builds a fresh handler for each action instance
pub type HandlerFactory = Arc<dyn Fn() -> Arc<dyn ActionHandler> + Send + Sync>;

/// A registered handler type: its place in the hierarchy, its declared fields,
/// and how to build it
#[derive(Clone)]
pub struct HandlerType {
    type_name: String,
    action_name: Option<String>,
    parents: Vec<String>,
    is_abstract: bool,
    fields: FieldSchema,
    factory: Option<HandlerFactory>,
}

impl HandlerType {
    /// A concrete type built by `factory`
    pub fn concrete<F, H>(type_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> H + Send + Sync + 'static,
        H: ActionHandler + 'static,
    {
        Self {
            type_name: type_name.into(),
            action_name: None,
            parents: Vec::new(),
            is_abstract: false,
            fields: FieldSchema::new(),
            factory: Some(Arc::new(move || Arc::new(factory()) as Arc<dyn ActionHandler>)),
        }
    }

    /// An abstract type: contributes fields, is never instantiated or resolved
    pub fn abstract_type(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            action_name: None,
            parents: Vec::new(),
            is_abstract: true,
            fields: FieldSchema::new(),
            factory: None,
        }
    }

    /// Override the resolvable action name (defaults to the type name)
    pub fn with_action_name(mut self, action_name: impl Into<String>) -> Self {
        self.action_name = Some(action_name.into());
        self
    }

    /// Add a parent type; may be called more than once
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        let parent = parent.into();
        if !self.parents.contains(&parent) {
            self.parents.push(parent);
        }
        self
    }

    /// Declare a parameter field
    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Name this type resolves under
    pub fn action_name(&self) -> &str {
        self.action_name.as_deref().unwrap_or(&self.type_name)
    }

    /// Declared parents; empty only for the hierarchy root
    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Fields declared directly on this type (not inherited ones)
    pub fn declared_fields(&self) -> &FieldSchema {
        &self.fields
    }

    pub(crate) fn factory(&self) -> Option<&HandlerFactory> {
        self.factory.as_ref()
    }

    /// Build a handler, or `None` for abstract types
    pub fn instantiate(&self) -> Option<Arc<dyn ActionHandler>> {
        self.factory.as_ref().map(|factory| factory())
    }

    pub(crate) fn set_default_parent(&mut self) {
        if self.parents.is_empty() && self.type_name != BASE_ACTION {
            self.parents.push(BASE_ACTION.to_string());
        }
    }
}

impl fmt::Debug for HandlerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerType")
            .field("type_name", &self.type_name)
            .field("action_name", &self.action_name())
            .field("parents", &self.parents)
            .field("is_abstract", &self.is_abstract)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Read a string parameter
pub fn param_str<'a>(parameters: &'a Parameters, key: &str) -> Option<&'a str> {
    parameters.get(key).and_then(Value::as_str)
}
