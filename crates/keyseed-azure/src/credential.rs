//! Entra ID token acquisition.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::cloud::AzureCloud;
use crate::error::{AzureError, read_json};

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(300);

/// Source of bearer tokens for a given OAuth scope.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn token(&self, scope: &str) -> Result<String, AzureError>;
}

/// Always returns the same token. For tests and pre-issued tokens.
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn token(&self, _scope: &str) -> Result<String, AzureError> {
        Ok(self.token.clone())
    }
}

/// The SDK-auth JSON document (`az ad sp create-for-rbac --sdk-auth`).
///
/// Read from `AZURE_CREDENTIALS` to authenticate, and produced by the
/// principal issuer as the stored secret value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub subscription_id: String,
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_directory_endpoint_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_manager_endpoint_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_directory_graph_resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_management_endpoint_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gallery_endpoint_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_endpoint_url: Option<String>,
}

impl SdkAuthCredentials {
    /// A document whose endpoint URLs point at `cloud`.
    ///
    /// The legacy service endpoints have no counterpart in [`AzureCloud`], so
    /// they are only filled in for the public cloud.
    pub fn for_cloud(
        cloud: &AzureCloud,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        subscription_id: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        let public = *cloud == AzureCloud::public();
        let legacy = |url: &str| public.then(|| url.to_string());
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            subscription_id: subscription_id.into(),
            tenant_id: tenant_id.into(),
            active_directory_endpoint_url: Some(
                cloud.authority_host.trim_end_matches('/').to_string(),
            ),
            resource_manager_endpoint_url: Some(format!(
                "{}/",
                cloud.resource_manager_endpoint.trim_end_matches('/')
            )),
            active_directory_graph_resource_id: legacy("https://graph.windows.net/"),
            sql_management_endpoint_url: legacy("https://management.core.windows.net:8443/"),
            gallery_endpoint_url: legacy("https://gallery.azure.com/"),
            management_endpoint_url: legacy("https://management.core.windows.net/"),
        }
    }
}

impl fmt::Debug for SdkAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdkAuthCredentials")
            .field("client_id", &self.client_id)
            .field("subscription_id", &self.subscription_id)
            .field("tenant_id", &self.tenant_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// OAuth2 client-credentials grant against Entra ID, cached per scope.
pub struct ClientSecretCredential {
    http: reqwest::Client,
    authority_host: String,
    tenant_id: String,
    client_id: String,
    client_secret: String,
    cache: Mutex<HashMap<String, CachedToken>>,
}

impl ClientSecretCredential {
    pub fn new(
        cloud: &AzureCloud,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            authority_host: cloud.authority_host.trim_end_matches('/').to_string(),
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_sdk_auth(cloud: &AzureCloud, creds: &SdkAuthCredentials) -> Self {
        Self::new(
            cloud,
            &creds.tenant_id,
            &creds.client_id,
            &creds.client_secret,
        )
    }

    /// Reads `AZURE_CREDENTIALS` (SDK-auth JSON) or, failing that,
    /// `AZURE_TENANT_ID` / `AZURE_CLIENT_ID` / `AZURE_CLIENT_SECRET`.
    pub fn from_env(cloud: &AzureCloud) -> Result<Self, AzureError> {
        if let Ok(json) = std::env::var("AZURE_CREDENTIALS") {
            let creds: SdkAuthCredentials = serde_json::from_str(&json)
                .map_err(|e| AzureError::Config(format!("AZURE_CREDENTIALS is not valid: {e}")))?;
            return Ok(Self::from_sdk_auth(cloud, &creds));
        }

        let var = |name: &str| {
            std::env::var(name)
                .map_err(|_| AzureError::Config(format!("{name} is not set")))
        };
        Ok(Self::new(
            cloud,
            var("AZURE_TENANT_ID")?,
            var("AZURE_CLIENT_ID")?,
            var("AZURE_CLIENT_SECRET")?,
        ))
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    async fn request_token(&self, scope: &str) -> Result<TokenResponse, AzureError> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host, self.tenant_id
        );
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "client_credentials")
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", &self.client_secret)
            .append_pair("scope", scope)
            .finish();

        tracing::debug!(scope, tenant = %self.tenant_id, "requesting access token");
        let resp = self
            .http
            .post(url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        read_json(resp).await.map_err(|e| match e {
            AzureError::Status { status, code, message } => {
                AzureError::Auth(format!("token request rejected (HTTP {status}) {code}: {message}"))
            }
            other => other,
        })
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn token(&self, scope: &str) -> Result<String, AzureError> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.get(scope)
            && Instant::now() < cached.refresh_at
        {
            return Ok(cached.token.clone());
        }

        let resp = self.request_token(scope).await?;
        let lifetime = Duration::from_secs(resp.expires_in).saturating_sub(EXPIRY_MARGIN);
        cache.insert(
            scope.to_string(),
            CachedToken {
                token: resp.access_token.clone(),
                refresh_at: Instant::now() + lifetime,
            },
        );
        Ok(resp.access_token)
    }
}
