//! # keyseed-core
//!
//! Shared vocabulary for keyseed: the resource and secret data model,
//! canonical resource IDs, and the backend traits the provisioning
//! pipeline is written against.
//!
//! ## Overview
//!
//! - [`SecretStore`]: get/set secrets by vault and name, with
//!   [`SecretStore::lookup_secret`] turning "not found" into
//!   [`SecretLookup::Absent`]
//! - [`PrincipalIssuer`]: create a scoped identity and return its credential
//! - [`ResourceLocator`]: render resource IDs used as role-assignment scopes
//!
//! Backends live in other crates (`keyseed-azure`); this crate only ships
//! [`InMemorySecretStore`].
//!
//! ## Example
//!
//! ```ignore
//! use keyseed_core::{ResourceLocation, ResourceLocator};
//!
//! let scope = ResourceLocator::container_app(&ResourceLocation::new("sub1", "rg1", "app1"));
//! assert_eq!(scope, "/subscriptions/sub1/resourceGroups/rg1/providers/Microsoft.App/containerApps/app1");
//! ```

mod error;
pub mod memory;
pub mod resource_id;
mod traits;
mod types;

pub use error::{ErrorCategory, IssuerError, ProvisionError, StoreError};
pub use memory::InMemorySecretStore;
pub use resource_id::{ResourceKind, ResourceLocation, ResourceLocator, subscription_scope};
pub use traits::{PrincipalIssuer, SecretStore};
pub use types::{
    ContentType, DEFAULT_PURPOSE, IssuedCredential, KEY_VAULT_TYPE, ProvisioningOptions,
    ResourceConfig, ResourceMatrix, Secret, SecretLookup, SecretMetadata, SecretType,
    VaultReference, group_by_type,
};

/// Type alias for a provisioning result.
pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// Shareable secret store handle.
pub type DynSecretStore = std::sync::Arc<dyn SecretStore>;

/// Shareable principal issuer handle.
pub type DynPrincipalIssuer = std::sync::Arc<dyn PrincipalIssuer>;
