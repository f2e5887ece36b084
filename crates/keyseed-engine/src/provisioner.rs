//! Provisioning orchestrator.
//!
//! Walks a [`ResourceMatrix`] type by type and resource by resource,
//! strictly in order. Configuration problems abort the whole run before
//! any I/O; every other failure is contained to the resource it happened on.

use keyseed_core::{
    DynPrincipalIssuer, DynSecretStore, ProvisionError, ProvisionResult, ProvisioningOptions,
    ResourceMatrix,
};
use tracing::{Instrument, error, info, info_span, warn};

use crate::registry::{HandlerRegistry, ProvisionContext};

pub struct Provisioner {
    store: DynSecretStore,
    issuer: DynPrincipalIssuer,
    registry: HandlerRegistry,
}

impl Provisioner {
    /// Creates a provisioner with the built-in handlers.
    pub fn new(store: DynSecretStore, issuer: DynPrincipalIssuer) -> Self {
        Self {
            store,
            issuer,
            registry: HandlerRegistry::with_defaults(),
        }
    }

    /// Replaces the handler registry.
    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Checks the whole matrix without touching any backend.
    ///
    /// # Errors
    ///
    /// `ProvisionError::Configuration` when a declared type has no resources,
    /// or a resource of a registered type is missing a required field.
    pub fn validate(&self, matrix: &ResourceMatrix) -> ProvisionResult<()> {
        for (resource_type, resources) in matrix {
            if resources.is_empty() {
                return Err(ProvisionError::configuration(format!(
                    "no resources declared for type '{resource_type}'"
                )));
            }
            if let Some(handler) = self.registry.get(resource_type) {
                for resource in resources {
                    handler.validate(resource)?;
                }
            }
        }
        Ok(())
    }

    /// Ensures a credential secret exists for every configured resource.
    ///
    /// Unregistered types are skipped with a warning. Store and issuer
    /// failures are logged and the run moves on to the next resource.
    ///
    /// # Errors
    ///
    /// Only `ProvisionError::Configuration`, raised before any I/O.
    pub async fn setup_secrets(
        &self,
        matrix: &ResourceMatrix,
        options: &ProvisioningOptions,
    ) -> ProvisionResult<()> {
        self.validate(matrix)?;

        let ctx = ProvisionContext {
            store: self.store.as_ref(),
            issuer: self.issuer.as_ref(),
            options,
        };

        for (resource_type, resources) in matrix {
            let Some(handler) = self.registry.get(resource_type) else {
                let err = ProvisionError::unsupported(resource_type);
                warn!(
                    resource_type = %resource_type,
                    skipped = resources.len(),
                    "{err}, skipping"
                );
                continue;
            };

            info!(
                resource_type = %resource_type,
                count = resources.len(),
                dry_run = options.dry_run,
                "Provisioning resources"
            );

            for resource in resources {
                let span = info_span!("resource", id = %resource.id, resource_type = %resource_type);
                match handler.provision(resource, &ctx).instrument(span).await {
                    Ok(outcome) => {
                        info!(id = %resource.id, %outcome, "Resource done");
                    }
                    Err(e) => {
                        error!(
                            id = %resource.id,
                            category = %e.category(),
                            error = %e,
                            "Resource provisioning failed, continuing with next resource"
                        );
                    }
                }
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
