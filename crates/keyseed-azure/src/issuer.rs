//! Service principal issuance over Microsoft Graph and Azure Resource Manager.
//!
//! One call performs, in order:
//! 1. `POST /v1.0/applications` (app registration)
//! 2. `POST /v1.0/servicePrincipals` (enterprise app for that registration)
//! 3. `POST /v1.0/applications/{id}/addPassword` (client secret)
//! 4. per scope: role definition lookup by name, then a role assignment `PUT`
//!
//! Nothing is rolled back if a later step fails.

use std::sync::Arc;

use async_trait::async_trait;
use keyseed_core::{IssuedCredential, IssuerError, PrincipalIssuer, subscription_scope};
use serde::Deserialize;
use serde_json::json;

use crate::cloud::AzureCloud;
use crate::credential::{SdkAuthCredentials, TokenCredential};
use crate::error::{AzureError, read_json};

const ROLE_API_VERSION: &str = "2022-04-01";
const PASSWORD_DISPLAY_NAME: &str = "keyseed";

pub struct ServicePrincipalIssuer {
    http: reqwest::Client,
    cloud: AzureCloud,
    credential: Arc<dyn TokenCredential>,
    tenant_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Application {
    id: String,
    app_id: String,
}

#[derive(Debug, Deserialize)]
struct ServicePrincipal {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordCredential {
    secret_text: String,
}

#[derive(Debug, Deserialize)]
struct RoleDefinitionList {
    value: Vec<RoleDefinition>,
}

#[derive(Debug, Deserialize)]
struct RoleDefinition {
    id: String,
}

impl ServicePrincipalIssuer {
    pub fn new(
        cloud: AzureCloud,
        credential: Arc<dyn TokenCredential>,
        tenant_id: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            cloud,
            credential,
            tenant_id: tenant_id.into(),
        }
    }

    fn graph_url(&self, path: &str) -> String {
        format!(
            "{}/v1.0/{}",
            self.cloud.graph_endpoint.trim_end_matches('/'),
            path
        )
    }

    fn arm_url(&self, scope: &str, path: &str) -> String {
        format!(
            "{}{}/providers/Microsoft.Authorization/{}",
            self.cloud.resource_manager_endpoint.trim_end_matches('/'),
            scope,
            path
        )
    }

    async fn graph_post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, AzureError> {
        let token = self.credential.token(self.cloud.graph_scope()).await?;
        tracing::debug!(path, "POST graph");
        let resp = self
            .http
            .post(self.graph_url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        read_json(resp).await
    }

    /// Resolves a role name. Built-in roles are defined at subscription level,
    /// so the lookup goes there when `scope` names a subscription.
    async fn role_definition_id(&self, scope: &str, role: &str) -> Result<String, IssuerError> {
        let lookup_scope = subscription_from_scope(scope)
            .map(subscription_scope)
            .unwrap_or_else(|| scope.to_string());
        let token = self
            .credential
            .token(self.cloud.resource_manager_scope())
            .await
            .map_err(AzureError::into_issuer_error)?;
        let filter = format!("roleName eq '{role}'");
        let resp = self
            .http
            .get(self.arm_url(&lookup_scope, "roleDefinitions"))
            .query(&[("$filter", filter.as_str()), ("api-version", ROLE_API_VERSION)])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AzureError::from(e).into_issuer_error())?;
        let list: RoleDefinitionList = read_json(resp)
            .await
            .map_err(AzureError::into_issuer_error)?;

        list.value
            .into_iter()
            .next()
            .map(|definition| definition.id)
            .ok_or_else(|| IssuerError::role_not_found(role, scope))
    }

    async fn assign_role(
        &self,
        scope: &str,
        role_definition_id: &str,
        principal_id: &str,
    ) -> Result<(), AzureError> {
        let token = self
            .credential
            .token(self.cloud.resource_manager_scope())
            .await?;
        let assignment = uuid::Uuid::new_v4();
        let url = self.arm_url(scope, &format!("roleAssignments/{assignment}"));
        let body = json!({
            "properties": {
                "roleDefinitionId": role_definition_id,
                "principalId": principal_id,
                // Skips the directory lookup that fails while a new principal replicates.
                "principalType": "ServicePrincipal"
            }
        });
        tracing::debug!(scope, %assignment, "PUT role assignment");
        let resp = self
            .http
            .put(url)
            .query(&[("api-version", ROLE_API_VERSION)])
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        read_json::<serde_json::Value>(resp).await.map(|_| ())
    }
}

/// Subscription ID embedded in a scope such as `/subscriptions/{id}/resourceGroups/...`.
fn subscription_from_scope(scope: &str) -> Option<&str> {
    let mut segments = scope.trim_start_matches('/').split('/');
    match (segments.next(), segments.next()) {
        (Some(s), Some(id)) if s.eq_ignore_ascii_case("subscriptions") && !id.is_empty() => {
            Some(id)
        }
        _ => None,
    }
}

#[async_trait]
impl PrincipalIssuer for ServicePrincipalIssuer {
    async fn create_principal_with_role(
        &self,
        name: &str,
        role: &str,
        scopes: &[String],
    ) -> Result<IssuedCredential, IssuerError> {
        let app: Application = self
            .graph_post("applications", &json!({ "displayName": name }))
            .await
            .map_err(AzureError::into_issuer_error)?;
        tracing::info!(principal = name, app_id = %app.app_id, "Created app registration");

        let principal: ServicePrincipal = self
            .graph_post("servicePrincipals", &json!({ "appId": app.app_id }))
            .await
            .map_err(AzureError::into_issuer_error)?;

        let password: PasswordCredential = self
            .graph_post(
                &format!("applications/{}/addPassword", app.id),
                &json!({ "passwordCredential": { "displayName": PASSWORD_DISPLAY_NAME } }),
            )
            .await
            .map_err(AzureError::into_issuer_error)?;

        for scope in scopes {
            let role_definition_id = self.role_definition_id(scope, role).await?;
            self.assign_role(scope, &role_definition_id, &principal.id)
                .await
                .map_err(AzureError::into_issuer_error)?;
            tracing::info!(principal = name, role, scope = %scope, "Assigned role");
        }

        let subscription_id = scopes
            .first()
            .and_then(|s| subscription_from_scope(s))
            .unwrap_or_default();
        let creds = SdkAuthCredentials::for_cloud(
            &self.cloud,
            app.app_id,
            password.secret_text,
            subscription_id,
            &self.tenant_id,
        );
        let payload = serde_json::to_value(&creds)
            .map_err(|e| IssuerError::unknown(format!("failed to encode credentials: {e}")))?;
        Ok(IssuedCredential::new(payload))
    }
}
