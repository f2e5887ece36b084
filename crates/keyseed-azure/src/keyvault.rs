//! Key Vault secrets over REST (api-version 7.4).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use keyseed_core::{Secret, SecretMetadata, SecretStore, StoreError};
use serde::{Deserialize, Serialize};

use crate::cloud::AzureCloud;
use crate::credential::TokenCredential;
use crate::error::{AzureError, read_body, read_json};

const API_VERSION: &str = "7.4";

/// Key Vault secrets REST client.
pub struct KeyVaultClient {
    http: reqwest::Client,
    cloud: AzureCloud,
    credential: Arc<dyn TokenCredential>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretBundle {
    value: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    tags: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SetSecretRequest<'a> {
    value: &'a str,
    content_type: &'a str,
    tags: BTreeMap<String, String>,
}

impl KeyVaultClient {
    pub fn new(cloud: AzureCloud, credential: Arc<dyn TokenCredential>) -> Self {
        Self {
            http: reqwest::Client::new(),
            cloud,
            credential,
        }
    }

    fn secret_url(&self, vault_name: &str, secret_name: &str) -> String {
        format!(
            "{}/secrets/{}?api-version={API_VERSION}",
            self.cloud.vault_url(vault_name),
            secret_name
        )
    }

    async fn request(
        &self,
        method: reqwest::Method,
        url: &str,
    ) -> Result<reqwest::RequestBuilder, AzureError> {
        let token = self.credential.token(self.cloud.key_vault_scope()).await?;
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(token)
            .header("Accept", "application/json"))
    }

    async fn fetch(&self, vault_name: &str, secret_name: &str) -> Result<Secret, AzureError> {
        let url = self.secret_url(vault_name, secret_name);
        tracing::debug!(vault = vault_name, secret = secret_name, "GET secret");
        let resp = self.request(reqwest::Method::GET, &url).await?.send().await?;
        let bundle: SecretBundle = read_json(resp).await?;

        // id is https://{vault}/secrets/{name}/{version}
        let version = bundle
            .id
            .as_deref()
            .and_then(|id| id.rsplit('/').next())
            .filter(|v| !v.is_empty() && *v != secret_name)
            .map(str::to_string);

        Ok(Secret {
            name: secret_name.to_string(),
            value: bundle.value,
            version,
            content_type: bundle.content_type,
            tags: bundle.tags.unwrap_or_default(),
        })
    }

    async fn store(
        &self,
        vault_name: &str,
        secret_name: &str,
        value: &str,
        metadata: &SecretMetadata,
    ) -> Result<(), AzureError> {
        let url = self.secret_url(vault_name, secret_name);
        let body = SetSecretRequest {
            value,
            content_type: metadata.content_type.as_str(),
            tags: metadata.tags(),
        };
        tracing::debug!(vault = vault_name, secret = secret_name, "PUT secret");
        let resp = self
            .request(reqwest::Method::PUT, &url)
            .await?
            .json(&body)
            .send()
            .await?;
        read_body(resp).await.map(|_| ())
    }
}

#[async_trait]
impl SecretStore for KeyVaultClient {
    async fn get_secret(&self, vault_name: &str, secret_name: &str) -> Result<Secret, StoreError> {
        self.fetch(vault_name, secret_name)
            .await
            .map_err(|e| e.into_store_error(vault_name, secret_name))
    }

    async fn set_secret(
        &self,
        vault_name: &str,
        secret_name: &str,
        value: &str,
        metadata: &SecretMetadata,
    ) -> Result<(), StoreError> {
        self.store(vault_name, secret_name, value, metadata)
            .await
            .map_err(|e| e.into_store_error(vault_name, secret_name))?;

        tracing::info!(
            vault = vault_name,
            secret = secret_name,
            secret_type = %metadata.secret_type,
            purpose = metadata.purpose_or_default(),
            "Secret stored in Key Vault"
        );
        Ok(())
    }
}
