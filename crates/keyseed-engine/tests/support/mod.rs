//! Recording test doubles for the secret store and principal issuer.

#![allow(dead_code)]

use std::collections::HashSet;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use keyseed_core::{
    InMemorySecretStore, IssuedCredential, IssuerError, PrincipalIssuer, ProvisionError,
    ProvisionResult, ResourceConfig, Secret, SecretLookup, SecretMetadata, SecretStore,
    StoreError, VaultReference,
};
use keyseed_engine::{ProvisionContext, ProvisionOutcome, ResourceHandler};
use serde_json::json;
use tracing_subscriber::fmt::MakeWriter;

/// Every call made against a double, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetSecret { vault: String, secret: String },
    LookupSecret { vault: String, secret: String },
    SetSecret { vault: String, secret: String },
    CreatePrincipal { name: String },
}

#[derive(Default)]
pub struct CallLog {
    calls: Mutex<Vec<Call>>,
}

impl CallLog {
    pub fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn all(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

/// In-memory store that records calls and can be told to fail lookups.
#[derive(Default)]
pub struct RecordingStore {
    inner: InMemorySecretStore,
    pub log: CallLog,
    failing_lookups: Mutex<HashSet<String>>,
    failing_writes: Mutex<HashSet<String>>,
}

impl RecordingStore {
    pub async fn seed(&self, vault: &str, secret: &str, value: &str) {
        self.inner.insert(vault, Secret::new(secret, value)).await;
    }

    pub fn fail_lookup(&self, secret: &str) {
        self.failing_lookups.lock().unwrap().insert(secret.to_string());
    }

    pub fn fail_write(&self, secret: &str) {
        self.failing_writes.lock().unwrap().insert(secret.to_string());
    }

    pub async fn stored(&self, vault: &str, secret: &str) -> Option<Secret> {
        self.inner.get_secret(vault, secret).await.ok()
    }

    pub fn set_calls(&self) -> usize {
        self.log
            .all()
            .iter()
            .filter(|c| matches!(c, Call::SetSecret { .. }))
            .count()
    }

    pub fn read_calls(&self) -> usize {
        self.log
            .all()
            .iter()
            .filter(|c| matches!(c, Call::GetSecret { .. } | Call::LookupSecret { .. }))
            .count()
    }
}

#[async_trait]
impl SecretStore for RecordingStore {
    async fn get_secret(&self, vault_name: &str, secret_name: &str) -> Result<Secret, StoreError> {
        self.log.push(Call::GetSecret {
            vault: vault_name.to_string(),
            secret: secret_name.to_string(),
        });
        self.inner.get_secret(vault_name, secret_name).await
    }

    async fn lookup_secret(
        &self,
        vault_name: &str,
        secret_name: &str,
    ) -> Result<SecretLookup, StoreError> {
        self.log.push(Call::LookupSecret {
            vault: vault_name.to_string(),
            secret: secret_name.to_string(),
        });
        if self.failing_lookups.lock().unwrap().contains(secret_name) {
            return Err(StoreError::transient("vault throttled"));
        }
        self.inner.lookup_secret(vault_name, secret_name).await
    }

    async fn set_secret(
        &self,
        vault_name: &str,
        secret_name: &str,
        value: &str,
        metadata: &SecretMetadata,
    ) -> Result<(), StoreError> {
        self.log.push(Call::SetSecret {
            vault: vault_name.to_string(),
            secret: secret_name.to_string(),
        });
        if self.failing_writes.lock().unwrap().contains(secret_name) {
            return Err(StoreError::unauthorized("write denied"));
        }
        self.inner
            .set_secret(vault_name, secret_name, value, metadata)
            .await
    }
}

/// Issuer that records requests and fails for selected principal names.
#[derive(Default)]
pub struct RecordingIssuer {
    pub log: CallLog,
    requests: Mutex<Vec<(String, String, Vec<String>)>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingIssuer {
    pub fn fail_for(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    pub fn requests(&self) -> Vec<(String, String, Vec<String>)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl PrincipalIssuer for RecordingIssuer {
    async fn create_principal_with_role(
        &self,
        name: &str,
        role: &str,
        scopes: &[String],
    ) -> Result<IssuedCredential, IssuerError> {
        self.log.push(Call::CreatePrincipal {
            name: name.to_string(),
        });
        self.requests
            .lock()
            .unwrap()
            .push((name.to_string(), role.to_string(), scopes.to_vec()));
        if self.failing.lock().unwrap().contains(name) {
            return Err(IssuerError::unknown("graph request failed"));
        }
        Ok(IssuedCredential::new(json!({
            "clientId": format!("{name}-client"),
            "clientSecret": "generated",
            "subscriptionId": "sub1",
            "tenantId": "tenant1",
        })))
    }
}

/// A valid container app resource whose secret and principal share `name`.
pub fn container_app(id: &str, name: &str) -> ResourceConfig {
    ResourceConfig::new(
        id,
        "azure_container_app",
        VaultReference::new("kv-dev", name).with_gh_secret_name("AZURE_CREDENTIALS_DEV"),
    )
    .with_property("name", format!("app-{id}"))
    .with_property("resource_group", "rg-dev")
    .with_property("location", "eastus")
    .with_metadata("service_principal_name", name)
    .with_metadata("subscription_id", "sub1")
}

pub const WEB_APP_TYPE: &str = "azure_web_app";

/// Handler for a resource kind the engine does not ship. Requires a `name`
/// property, checks the vault, and records which resources it saw.
#[derive(Default)]
pub struct RecordingHandler {
    provisioned: Mutex<Vec<String>>,
}

impl RecordingHandler {
    pub fn provisioned(&self) -> Vec<String> {
        self.provisioned.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResourceHandler for RecordingHandler {
    fn resource_type(&self) -> &str {
        WEB_APP_TYPE
    }

    fn validate(&self, resource: &ResourceConfig) -> ProvisionResult<()> {
        match resource.property_str("name") {
            Some(_) => Ok(()),
            None => Err(ProvisionError::configuration(format!(
                "resource '{}' is missing required field 'name'",
                resource.id
            ))),
        }
    }

    async fn provision(
        &self,
        resource: &ResourceConfig,
        ctx: &ProvisionContext<'_>,
    ) -> ProvisionResult<ProvisionOutcome> {
        self.provisioned.lock().unwrap().push(resource.id.clone());
        ctx.store
            .lookup_secret(&resource.credential.vault_name, &resource.credential.secret_name)
            .await?;
        Ok(ProvisionOutcome::Provisioned)
    }
}

/// A web app resource handled by [`RecordingHandler`].
pub fn web_app(id: &str) -> ResourceConfig {
    ResourceConfig::new(
        id,
        WEB_APP_TYPE,
        VaultReference::new("kv-dev", format!("publish-profile-{id}")),
    )
    .with_property("name", format!("web-{id}"))
}

/// Formatted log output, shared with a `tracing` fmt subscriber.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Installs a WARN-and-above subscriber on the current thread.
    pub fn capture_warnings(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
