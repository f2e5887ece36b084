//! Endpoints of an Azure cloud instance.

use serde::{Deserialize, Serialize};

/// Base URLs for the services keyseed talks to.
///
/// Every field can be overridden, which is how tests point the adapters at
/// a mock server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureCloud {
    /// Entra ID token authority, e.g. `https://login.microsoftonline.com`.
    pub authority_host: String,
    /// Microsoft Graph base URL.
    pub graph_endpoint: String,
    /// Azure Resource Manager base URL.
    pub resource_manager_endpoint: String,
    /// DNS suffix appended to vault names.
    pub key_vault_suffix: String,
    /// Fixed Key Vault base URL; when set, vault names are not used to build the host.
    pub key_vault_endpoint: Option<String>,
}

impl Default for AzureCloud {
    fn default() -> Self {
        Self::public()
    }
}

impl AzureCloud {
    /// Azure public cloud.
    pub fn public() -> Self {
        Self {
            authority_host: "https://login.microsoftonline.com".to_string(),
            graph_endpoint: "https://graph.microsoft.com".to_string(),
            resource_manager_endpoint: "https://management.azure.com".to_string(),
            key_vault_suffix: "vault.azure.net".to_string(),
            key_vault_endpoint: None,
        }
    }

    /// Every endpoint served from one base URL. Used against mock servers.
    pub fn single_host(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        Self {
            authority_host: base.clone(),
            graph_endpoint: base.clone(),
            resource_manager_endpoint: base.clone(),
            key_vault_suffix: String::new(),
            key_vault_endpoint: Some(base),
        }
    }

    /// Base URL of a vault.
    pub fn vault_url(&self, vault_name: &str) -> String {
        match &self.key_vault_endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{vault_name}.{}", self.key_vault_suffix),
        }
    }

    pub fn key_vault_scope(&self) -> &'static str {
        "https://vault.azure.net/.default"
    }

    pub fn graph_scope(&self) -> &'static str {
        "https://graph.microsoft.com/.default"
    }

    pub fn resource_manager_scope(&self) -> &'static str {
        "https://management.azure.com/.default"
    }
}
