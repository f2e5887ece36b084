//! Handler registry
//!
//! Maps resource type tags to the handler that provisions them. Adding a
//! resource kind means writing a [`ResourceHandler`] and registering it;
//! the provisioning loop itself does not change.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use keyseed_core::{
    PrincipalIssuer, ProvisionResult, ProvisioningOptions, ResourceConfig, SecretStore,
};

use crate::handlers::ContainerAppHandler;

/// Dependencies and switches handed to a handler for one resource.
pub struct ProvisionContext<'a> {
    pub store: &'a dyn SecretStore,
    pub issuer: &'a dyn PrincipalIssuer,
    pub options: &'a ProvisioningOptions,
}

/// What a handler did with a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// Dry run: actions were logged, nothing was called.
    Simulated,
    /// A secret was already present; nothing was issued or written.
    AlreadyProvisioned,
    /// A principal was issued and its credential stored.
    Provisioned,
}

impl fmt::Display for ProvisionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simulated => write!(f, "simulated"),
            Self::AlreadyProvisioned => write!(f, "already_provisioned"),
            Self::Provisioned => write!(f, "provisioned"),
        }
    }
}

/// Provisions resources of one type.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Type tag this handler is registered under, e.g. `azure_container_app`.
    fn resource_type(&self) -> &str;

    /// Checks required fields without any I/O.
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::Configuration` for missing or empty fields.
    fn validate(&self, resource: &ResourceConfig) -> ProvisionResult<()>;

    /// Ensures the resource's credential secret exists.
    async fn provision(
        &self,
        resource: &ResourceConfig,
        ctx: &ProvisionContext<'_>,
    ) -> ProvisionResult<ProvisionOutcome>;
}

/// Type tag -> handler lookup.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ResourceHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in handler.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ContainerAppHandler));
        registry
    }

    /// Registers a handler under its own type tag, replacing any previous one.
    pub fn register(&mut self, handler: Arc<dyn ResourceHandler>) {
        self.handlers
            .insert(handler.resource_type().to_string(), handler);
    }

    pub fn get(&self, resource_type: &str) -> Option<&Arc<dyn ResourceHandler>> {
        self.handlers.get(resource_type)
    }

    pub fn contains(&self, resource_type: &str) -> bool {
        self.handlers.contains_key(resource_type)
    }

    /// Registered type tags, sorted.
    pub fn resource_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("resource_types", &self.resource_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::CONTAINER_APP_TYPE;
    use keyseed_core::{InMemorySecretStore, IssuedCredential, IssuerError, VaultReference};
    use tokio_test::block_on;

    struct NoopHandler;

    #[async_trait]
    impl ResourceHandler for NoopHandler {
        fn resource_type(&self) -> &str {
            "noop"
        }

        fn validate(&self, _resource: &ResourceConfig) -> ProvisionResult<()> {
            Ok(())
        }

        async fn provision(
            &self,
            _resource: &ResourceConfig,
            _ctx: &ProvisionContext<'_>,
        ) -> ProvisionResult<ProvisionOutcome> {
            Ok(ProvisionOutcome::Simulated)
        }
    }

    #[test]
    fn test_defaults_include_container_app() {
        let registry = HandlerRegistry::with_defaults();
        assert!(registry.contains(CONTAINER_APP_TYPE));
        assert!(!registry.contains("azure_web_app"));
    }

    #[test]
    fn test_register_adds_new_type() {
        let mut registry = HandlerRegistry::with_defaults();
        registry.register(Arc::new(NoopHandler));
        assert_eq!(registry.resource_types(), ["azure_container_app", "noop"]);
        assert_eq!(registry.get("noop").unwrap().resource_type(), "noop");
    }

    struct UnusedIssuer;

    #[async_trait]
    impl PrincipalIssuer for UnusedIssuer {
        async fn create_principal_with_role(
            &self,
            _name: &str,
            _role: &str,
            _scopes: &[String],
        ) -> Result<IssuedCredential, IssuerError> {
            Err(IssuerError::unknown("not expected"))
        }
    }

    #[test]
    fn test_registered_handler_is_dispatched() {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(NoopHandler));

        let store = InMemorySecretStore::new();
        let options = ProvisioningOptions::live();
        let ctx = ProvisionContext {
            store: &store,
            issuer: &UnusedIssuer,
            options: &options,
        };
        let resource = ResourceConfig::new("n1", "noop", VaultReference::new("kv", "s"));

        let handler = registry.get("noop").unwrap();
        assert_eq!(
            block_on(handler.provision(&resource, &ctx)).unwrap(),
            ProvisionOutcome::Simulated
        );
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(
            ProvisionOutcome::AlreadyProvisioned.to_string(),
            "already_provisioned"
        );
    }
}
