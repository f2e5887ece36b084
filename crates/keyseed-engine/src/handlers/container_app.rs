//! Azure Container App handler.
//!
//! Issues a service principal with Contributor rights over the container
//! app and stores its SDK-auth JSON in the configured Key Vault secret.

use async_trait::async_trait;
use keyseed_core::{
    ContentType, ProvisionError, ProvisionResult, ResourceConfig, ResourceLocation,
    ResourceLocator, SecretLookup, SecretMetadata, SecretType, VaultReference,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::registry::{ProvisionContext, ProvisionOutcome, ResourceHandler};

pub const CONTAINER_APP_TYPE: &str = "azure_container_app";

// TODO: Contributor is broader than a deploy needs; switch to a custom role
// limited to container app revisions once one is defined.
pub const CONTAINER_APP_ROLE: &str = "Contributor";

/// Typed view of an `azure_container_app` resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerAppResourceConfig {
    pub id: String,
    pub name: String,
    pub resource_group: String,
    pub credential: VaultReference,
    pub service_principal_name: String,
    pub subscription_id: String,
    pub metadata: Map<String, Value>,
}

impl ContainerAppResourceConfig {
    /// Role-assignment scope: the container app's resource ID.
    pub fn scope(&self) -> String {
        ResourceLocator::container_app(&ResourceLocation::new(
            &self.subscription_id,
            &self.resource_group,
            &self.name,
        ))
    }
}

impl TryFrom<&ResourceConfig> for ContainerAppResourceConfig {
    type Error = ProvisionError;

    fn try_from(resource: &ResourceConfig) -> Result<Self, Self::Error> {
        let field = |value: Option<&str>, path: &str| -> ProvisionResult<String> {
            match value {
                Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
                _ => Err(ProvisionError::configuration(format!(
                    "resource '{}' ({}) is missing required field '{path}'",
                    resource.id, resource.resource_type
                ))),
            }
        };

        Ok(Self {
            id: resource.id.clone(),
            name: field(resource.property_str("name"), "name")?,
            resource_group: field(resource.property_str("resource_group"), "resource_group")?,
            credential: resource.credential.clone(),
            service_principal_name: field(
                resource.metadata_str("service_principal_name"),
                "metadata.service_principal_name",
            )?,
            subscription_id: field(
                resource.metadata_str("subscription_id"),
                "metadata.subscription_id",
            )?,
            metadata: resource.metadata.clone(),
        })
    }
}

pub struct ContainerAppHandler;

#[async_trait]
impl ResourceHandler for ContainerAppHandler {
    fn resource_type(&self) -> &str {
        CONTAINER_APP_TYPE
    }

    fn validate(&self, resource: &ResourceConfig) -> ProvisionResult<()> {
        ContainerAppResourceConfig::try_from(resource).map(|_| ())
    }

    async fn provision(
        &self,
        resource: &ResourceConfig,
        ctx: &ProvisionContext<'_>,
    ) -> ProvisionResult<ProvisionOutcome> {
        let config = ContainerAppResourceConfig::try_from(resource)?;
        setup_secrets_for_container_app(&config, ctx).await
    }
}

/// Ensures the container app's service principal secret exists.
///
/// Dry runs only log. Live runs check the vault first and never issue a
/// principal when a secret is already there.
pub async fn setup_secrets_for_container_app(
    config: &ContainerAppResourceConfig,
    ctx: &ProvisionContext<'_>,
) -> ProvisionResult<ProvisionOutcome> {
    let vault_name = config.credential.vault_name.as_str();
    let secret_name = config.credential.secret_name.as_str();

    if ctx.options.dry_run {
        info!(
            principal = %config.service_principal_name,
            role = CONTAINER_APP_ROLE,
            "(dry run) Create service principal and assign role"
        );
        info!(
            vault = vault_name,
            secret = secret_name,
            "(dry run) Set secret in Azure Key Vault"
        );
        return Ok(ProvisionOutcome::Simulated);
    }

    if let SecretLookup::Found(_) = ctx.store.lookup_secret(vault_name, secret_name).await? {
        warn!(
            vault = vault_name,
            secret = secret_name,
            "Secret already exists, skipping setup"
        );
        return Ok(ProvisionOutcome::AlreadyProvisioned);
    }

    info!(principal = %config.service_principal_name, "Setting up secret");

    let scope = config.scope();
    let credential = ctx
        .issuer
        .create_principal_with_role(&config.service_principal_name, CONTAINER_APP_ROLE, &[scope])
        .await?;

    let metadata = SecretMetadata::new(SecretType::ServicePrincipal, ContentType::Json)
        .with_display_name(&config.service_principal_name);
    ctx.store
        .set_secret(
            vault_name,
            secret_name,
            &credential.to_secret_value(),
            &metadata,
        )
        .await?;

    info!(
        secret = secret_name,
        secret_type = %metadata.secret_type,
        purpose = metadata.purpose_or_default(),
        "Credential provisioned"
    );
    Ok(ProvisionOutcome::Provisioned)
}
