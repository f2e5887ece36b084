//! Canonical Azure resource ID rendering.
//!
//! Resource IDs double as role-assignment scopes, so the output must match
//! the provider's format byte for byte. Inputs are not validated.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The pieces needed to address a resource inside a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLocation {
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

impl ResourceLocation {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            name: name.into(),
        }
    }
}

/// Resource kinds with a fixed provider namespace and type segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    KeyVault,
    ContainerApp,
    StorageAccount,
}

impl ResourceKind {
    /// Provider namespace and resource type segment, e.g. `Microsoft.App/containerApps`.
    pub fn provider_path(&self) -> &'static str {
        match self {
            Self::KeyVault => "Microsoft.KeyVault/vaults",
            Self::ContainerApp => "Microsoft.App/containerApps",
            Self::StorageAccount => "Microsoft.Storage/storageAccounts",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.provider_path())
    }
}

/// Builds resource IDs of the form
/// `/subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/{type}/{name}`.
pub struct ResourceLocator;

impl ResourceLocator {
    pub fn format(kind: ResourceKind, location: &ResourceLocation) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}/{}",
            location.subscription_id,
            location.resource_group,
            kind.provider_path(),
            location.name
        )
    }

    pub fn key_vault(location: &ResourceLocation) -> String {
        Self::format(ResourceKind::KeyVault, location)
    }

    pub fn container_app(location: &ResourceLocation) -> String {
        Self::format(ResourceKind::ContainerApp, location)
    }

    pub fn storage_account(location: &ResourceLocation) -> String {
        Self::format(ResourceKind::StorageAccount, location)
    }
}

/// Subscription-level scope. Built-in role definitions are looked up here.
pub fn subscription_scope(subscription_id: &str) -> String {
    format!("/subscriptions/{subscription_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> ResourceLocation {
        ResourceLocation::new("sub1", "rg1", "app1")
    }

    #[test]
    fn test_container_app_id() {
        assert_eq!(
            ResourceLocator::container_app(&location()),
            "/subscriptions/sub1/resourceGroups/rg1/providers/Microsoft.App/containerApps/app1"
        );
    }

    #[test]
    fn test_key_vault_id() {
        assert_eq!(
            ResourceLocator::key_vault(&location()),
            "/subscriptions/sub1/resourceGroups/rg1/providers/Microsoft.KeyVault/vaults/app1"
        );
    }

    #[test]
    fn test_storage_account_id() {
        assert_eq!(
            ResourceLocator::storage_account(&location()),
            "/subscriptions/sub1/resourceGroups/rg1/providers/Microsoft.Storage/storageAccounts/app1"
        );
    }

    #[test]
    fn test_inputs_are_not_validated() {
        let odd = ResourceLocation::new("", "rg/with/slash", "");
        assert_eq!(
            ResourceLocator::container_app(&odd),
            "/subscriptions//resourceGroups/rg/with/slash/providers/Microsoft.App/containerApps/"
        );
    }

    #[test]
    fn test_subscription_scope() {
        assert_eq!(subscription_scope("sub1"), "/subscriptions/sub1");
    }
}
