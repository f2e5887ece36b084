//! In-memory secret store.
//!
//! Keeps every written version per `(vault, secret)` key. Useful as a
//! backend for local runs and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::traits::SecretStore;
use crate::types::{Secret, SecretMetadata};

type StoreKey = (String, String);

#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    secrets: RwLock<HashMap<StoreKey, Vec<Secret>>>,
    version_counter: AtomicU64,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a secret without going through [`SecretStore::set_secret`].
    pub async fn insert(&self, vault_name: &str, secret: Secret) {
        let key = (vault_name.to_string(), secret.name.clone());
        self.secrets.write().await.entry(key).or_default().push(secret);
    }

    /// Number of versions written for a secret.
    pub async fn version_count(&self, vault_name: &str, secret_name: &str) -> usize {
        let key = (vault_name.to_string(), secret_name.to_string());
        self.secrets.read().await.get(&key).map_or(0, Vec::len)
    }

    fn next_version(&self) -> String {
        (self.version_counter.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get_secret(&self, vault_name: &str, secret_name: &str) -> Result<Secret, StoreError> {
        let key = (vault_name.to_string(), secret_name.to_string());
        self.secrets
            .read()
            .await
            .get(&key)
            .and_then(|versions| versions.last())
            .cloned()
            .ok_or_else(|| StoreError::not_found(vault_name, secret_name))
    }

    async fn set_secret(
        &self,
        vault_name: &str,
        secret_name: &str,
        value: &str,
        metadata: &SecretMetadata,
    ) -> Result<(), StoreError> {
        let secret = Secret {
            name: secret_name.to_string(),
            value: value.to_string(),
            version: Some(self.next_version()),
            content_type: Some(metadata.content_type.as_str().to_string()),
            tags: metadata.tags(),
        };
        tracing::debug!(vault = vault_name, secret = secret_name, "stored secret in memory");
        self.insert(vault_name, secret).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentType, SecretLookup, SecretType};

    fn metadata() -> SecretMetadata {
        SecretMetadata::new(SecretType::ServicePrincipal, ContentType::Json)
            .with_display_name("sp-dev")
    }

    #[tokio::test]
    async fn test_get_missing_secret_is_not_found() {
        let store = InMemorySecretStore::new();
        let err = store.get_secret("kv", "missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_lookup_translates_not_found_to_absent() {
        let store = InMemorySecretStore::new();
        assert_eq!(
            store.lookup_secret("kv", "missing").await.unwrap(),
            SecretLookup::Absent
        );
    }

    #[tokio::test]
    async fn test_set_then_get_returns_latest_version() {
        let store = InMemorySecretStore::new();
        store.set_secret("kv", "sp", "v1", &metadata()).await.unwrap();
        store.set_secret("kv", "sp", "v2", &metadata()).await.unwrap();

        let secret = store.get_secret("kv", "sp").await.unwrap();
        assert_eq!(secret.value, "v2");
        assert_eq!(secret.version.as_deref(), Some("2"));
        assert_eq!(secret.content_type.as_deref(), Some("json"));
        assert_eq!(secret.tags["displayName"], "sp-dev");
        assert_eq!(store.version_count("kv", "sp").await, 2);
    }

    #[tokio::test]
    async fn test_vaults_are_separate_namespaces() {
        let store = InMemorySecretStore::new();
        store.insert("kv-a", Secret::new("sp", "a")).await;

        assert!(store.lookup_secret("kv-a", "sp").await.unwrap().is_found());
        assert!(!store.lookup_secret("kv-b", "sp").await.unwrap().is_found());
    }
}
