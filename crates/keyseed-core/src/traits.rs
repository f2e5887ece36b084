//! Backend traits consumed by the provisioning pipeline.
//!
//! The pipeline never talks to a provider directly; it receives a
//! [`SecretStore`] and a [`PrincipalIssuer`] at construction time.

use async_trait::async_trait;

use crate::error::{IssuerError, StoreError};
use crate::types::{IssuedCredential, Secret, SecretLookup, SecretMetadata};

/// A vault-addressed key/value store for sensitive values.
///
/// Implementations must be thread-safe (`Send + Sync`).
///
/// # Example
///
/// ```ignore
/// use keyseed_core::{SecretLookup, SecretStore, StoreError};
///
/// async fn exists(store: &dyn SecretStore, vault: &str, name: &str) -> Result<bool, StoreError> {
///     Ok(store.lookup_secret(vault, name).await?.is_found())
/// }
/// ```
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Reads the current version of a secret.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the secret does not exist.
    /// Returns `Unauthorized`, `Transient` or `Unknown` for every other failure.
    async fn get_secret(&self, vault_name: &str, secret_name: &str) -> Result<Secret, StoreError>;

    /// Existence check: like [`get_secret`](Self::get_secret), but a missing
    /// secret is `SecretLookup::Absent` instead of an error.
    ///
    /// # Errors
    ///
    /// Every error other than `NotFound` is returned unchanged.
    async fn lookup_secret(
        &self,
        vault_name: &str,
        secret_name: &str,
    ) -> Result<SecretLookup, StoreError> {
        match self.get_secret(vault_name, secret_name).await {
            Ok(secret) => Ok(SecretLookup::Found(secret)),
            Err(e) if e.is_not_found() => Ok(SecretLookup::Absent),
            Err(e) => Err(e),
        }
    }

    /// Writes a new version of a secret and tags it with `metadata`.
    ///
    /// Does not check whether the secret already exists.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` or `Unknown` on provider failure. Not retried.
    async fn set_secret(
        &self,
        vault_name: &str,
        secret_name: &str,
        value: &str,
        metadata: &SecretMetadata,
    ) -> Result<(), StoreError>;
}

/// Creates scoped identities and hands back their authentication material.
#[async_trait]
pub trait PrincipalIssuer: Send + Sync {
    /// Creates a principal named `name` and grants it `role` on every scope.
    ///
    /// Not idempotent: a second call with the same name may create a
    /// duplicate identity.
    ///
    /// # Errors
    ///
    /// Any provider failure. Role assignments already applied are not rolled back.
    async fn create_principal_with_role(
        &self,
        name: &str,
        role: &str,
        scopes: &[String],
    ) -> Result<IssuedCredential, IssuerError>;
}
