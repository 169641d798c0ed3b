//! Handler registry - maps action names to handler types

use crate::core::{
    error::{PipelineError, RegistryError},
    handler::{ActionHandler, HandlerType, BASE_ACTION},
    schema::{self, FieldCatalog, FieldSchema},
};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Registration table of handler types
///
/// Types are kept in registration order. Every registry is rooted at the
/// abstract [`BASE_ACTION`] type; a type registered without a parent extends
/// it. Only concrete types are reachable by action name.
#[derive(Debug)]
pub struct HandlerRegistry {
    types: IndexMap<String, HandlerType>,
    by_action_name: HashMap<String, String>,
}

impl HandlerRegistry {
    /// A registry holding only the abstract root type
    pub fn new() -> Self {
        let mut types = IndexMap::new();
        types.insert(BASE_ACTION.to_string(), HandlerType::abstract_type(BASE_ACTION));
        Self {
            types,
            by_action_name: HashMap::new(),
        }
    }

    /// A registry with the built-in handler catalog registered
    pub fn with_builtin_handlers() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for handler_type in crate::handlers::builtin_types() {
            registry.register(handler_type)?;
        }
        Ok(registry)
    }

    /// Register a handler type
    ///
    /// Parents must be registered first. The name index is updated here, so
    /// types registered later are immediately resolvable.
    pub fn register(&mut self, mut handler_type: HandlerType) -> Result<(), RegistryError> {
        handler_type.set_default_parent();
        let type_name = handler_type.type_name().to_string();

        if self.types.contains_key(&type_name) {
            return Err(RegistryError::DuplicateType(type_name));
        }

        for parent in handler_type.parents() {
            if !self.types.contains_key(parent) {
                return Err(RegistryError::UnknownParent {
                    type_name,
                    parent: parent.clone(),
                });
            }
        }

        if !handler_type.is_abstract() {
            if handler_type.factory().is_none() {
                return Err(RegistryError::MissingFactory(type_name));
            }
            let action_name = handler_type.action_name().to_string();
            if let Some(existing) = self.by_action_name.get(&action_name) {
                return Err(RegistryError::DuplicateActionName {
                    action_name,
                    existing: existing.clone(),
                });
            }
            self.by_action_name.insert(action_name, type_name.clone());
        }

        debug!(
            "Registered handler type {} (action name: {}, abstract: {})",
            type_name,
            handler_type.action_name(),
            handler_type.is_abstract()
        );
        self.types.insert(type_name, handler_type);
        Ok(())
    }

    /// Resolve an action name to its concrete handler type
    pub fn resolve(&self, action_name: &str) -> Result<&HandlerType, PipelineError> {
        self.by_action_name
            .get(action_name)
            .and_then(|type_name| self.types.get(type_name))
            .ok_or_else(|| PipelineError::UnresolvedActionType(action_name.to_string()))
    }

    /// Resolve an action name and build its handler
    pub fn instantiate(&self, action_name: &str) -> Result<Arc<dyn ActionHandler>, PipelineError> {
        self.resolve(action_name)?
            .instantiate()
            .ok_or_else(|| PipelineError::UnresolvedActionType(action_name.to_string()))
    }

    /// Look up a type by its type name, abstract types included
    pub fn get(&self, type_name: &str) -> Option<&HandlerType> {
        self.types.get(type_name)
    }

    /// Direct descendants of a type, in registration order
    pub fn children<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a HandlerType> + 'a {
        self.types
            .values()
            .filter(move |t| t.parents().iter().any(|p| p == type_name))
    }

    /// Depth-first pre-order walk from the root, each type visited once
    pub fn walk(&self) -> Vec<&HandlerType> {
        let mut order = Vec::with_capacity(self.types.len());
        let mut visited = HashSet::new();
        let mut stack = vec![BASE_ACTION];

        while let Some(type_name) = stack.pop() {
            if !visited.insert(type_name) {
                continue;
            }
            let Some(handler_type) = self.types.get(type_name) else {
                continue;
            };
            order.push(handler_type);

            let children: Vec<&str> = self.children(type_name).map(|t| t.type_name()).collect();
            stack.extend(children.into_iter().rev());
        }

        order
    }

    /// Names of every resolvable (concrete) action, in hierarchy order
    pub fn action_names(&self) -> Vec<&str> {
        self.walk()
            .into_iter()
            .filter(|t| !t.is_abstract())
            .map(|t| t.action_name())
            .collect()
    }

    /// Number of registered types, the root included
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Merged field schema of one type
    pub fn fields_for(&self, type_name: &str) -> FieldSchema {
        schema::merged_fields(self, type_name, &mut HashMap::new())
    }

    /// Catalog of merged schemas for every concrete action
    pub fn field_catalog(&self) -> FieldCatalog {
        schema::field_catalog(self)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{config::BootstrapConfig, handler::Parameters};
    use async_trait::async_trait;

    struct Dummy;

    #[async_trait]
    impl ActionHandler for Dummy {
        async fn execute(&self, _parameters: &Parameters, _config: &BootstrapConfig) -> anyhow::Result<bool> {
            Ok(true)
        }
    }

    fn sample_registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry.register(HandlerType::concrete("AssociateEip", || Dummy)).unwrap();
        registry.register(HandlerType::abstract_type("LogSyncBase")).unwrap();
        registry
            .register(HandlerType::concrete("LogSyncUp", || Dummy).extends("LogSyncBase"))
            .unwrap();
        registry
            .register(
                HandlerType::concrete("LogSyncDownHandler", || Dummy)
                    .extends("LogSyncBase")
                    .with_action_name("LogSyncDown"),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_every_concrete_type_resolves_to_itself() {
        let registry = sample_registry();
        for handler_type in registry.walk() {
            if handler_type.is_abstract() {
                continue;
            }
            let resolved = registry.resolve(handler_type.action_name()).unwrap();
            assert_eq!(resolved.type_name(), handler_type.type_name());
        }
    }

    #[test]
    fn test_declared_name_overrides_type_name() {
        let registry = sample_registry();
        assert_eq!(
            registry.resolve("LogSyncDown").unwrap().type_name(),
            "LogSyncDownHandler"
        );
        assert!(matches!(
            registry.resolve("LogSyncDownHandler"),
            Err(PipelineError::UnresolvedActionType(name)) if name == "LogSyncDownHandler"
        ));
    }

    #[test]
    fn test_unknown_name_fails() {
        let registry = sample_registry();
        assert!(matches!(
            registry.resolve("DoesNotExist"),
            Err(PipelineError::UnresolvedActionType(name)) if name == "DoesNotExist"
        ));
    }

    #[test]
    fn test_abstract_types_do_not_resolve() {
        let registry = sample_registry();
        assert!(registry.resolve(BASE_ACTION).is_err());
        assert!(registry.resolve("LogSyncBase").is_err());
        assert!(registry.get("LogSyncBase").is_some());
    }

    #[test]
    fn test_late_registration_is_resolvable() {
        let mut registry = sample_registry();
        assert!(registry.resolve("CronJob").is_err());

        registry.register(HandlerType::concrete("CronJob", || Dummy)).unwrap();
        assert_eq!(registry.resolve("CronJob").unwrap().type_name(), "CronJob");
    }

    #[test]
    fn test_registration_errors() {
        let mut registry = sample_registry();

        assert_eq!(
            registry.register(HandlerType::concrete("AssociateEip", || Dummy)),
            Err(RegistryError::DuplicateType("AssociateEip".to_string()))
        );
        assert_eq!(
            registry.register(HandlerType::concrete("Other", || Dummy).with_action_name("LogSyncUp")),
            Err(RegistryError::DuplicateActionName {
                action_name: "LogSyncUp".to_string(),
                existing: "LogSyncUp".to_string(),
            })
        );
        assert_eq!(
            registry.register(HandlerType::concrete("Orphan", || Dummy).extends("Missing")),
            Err(RegistryError::UnknownParent {
                type_name: "Orphan".to_string(),
                parent: "Missing".to_string(),
            })
        );
    }

    #[test]
    fn test_walk_is_depth_first_in_registration_order() {
        let registry = sample_registry();
        let order: Vec<&str> = registry.walk().iter().map(|t| t.type_name()).collect();
        assert_eq!(
            order,
            vec![BASE_ACTION, "AssociateEip", "LogSyncBase", "LogSyncUp", "LogSyncDownHandler"]
        );
        assert_eq!(
            registry.action_names(),
            vec!["AssociateEip", "LogSyncUp", "LogSyncDown"]
        );
    }

    #[test]
    fn test_builtin_handlers_registered() {
        let registry = HandlerRegistry::with_builtin_handlers().unwrap();
        for name in ["Noop", "CustomScript", "SetConfig", "SystemdServiceConf", "CronJob"] {
            assert!(registry.resolve(name).is_ok(), "{name} should resolve");
        }
    }
}
