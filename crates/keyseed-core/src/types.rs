//! Data model for the provisioning pipeline.
//!
//! Everything here is read from static configuration or returned by a
//! backend, and never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Purpose tag written when the caller does not supply one.
pub const DEFAULT_PURPOSE: &str = "Deploy with GitHub Actions";

/// Vault type tag carried by [`VaultReference`].
pub const KEY_VAULT_TYPE: &str = "key_vault";

/// Resource configurations keyed by type tag, in declaration order.
pub type ResourceMatrix = IndexMap<String, Vec<ResourceConfig>>;

/// Groups a flat resource list by its `type` tag, keeping first-appearance order.
pub fn group_by_type(resources: impl IntoIterator<Item = ResourceConfig>) -> ResourceMatrix {
    let mut matrix = ResourceMatrix::new();
    for resource in resources {
        matrix
            .entry(resource.resource_type.clone())
            .or_default()
            .push(resource);
    }
    matrix
}

/// Where the provisioned credential lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultReference {
    #[serde(rename = "type", default = "default_vault_type")]
    pub store_type: String,
    /// Automation-host secret holding the credentials used to reach the vault.
    #[serde(default)]
    pub gh_secret_name: String,
    pub vault_name: String,
    pub secret_name: String,
}

fn default_vault_type() -> String {
    KEY_VAULT_TYPE.to_string()
}

impl VaultReference {
    pub fn new(vault_name: impl Into<String>, secret_name: impl Into<String>) -> Self {
        Self {
            store_type: default_vault_type(),
            gh_secret_name: String::new(),
            vault_name: vault_name.into(),
            secret_name: secret_name.into(),
        }
    }

    pub fn with_gh_secret_name(mut self, name: impl Into<String>) -> Self {
        self.gh_secret_name = name.into();
        self
    }
}

/// A configured resource, as read from the resource table.
///
/// Type-specific fields such as `name` or `resource_group` stay in
/// `properties`; handlers convert the record into their own typed view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub credential: VaultReference,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl ResourceConfig {
    pub fn new(
        id: impl Into<String>,
        resource_type: impl Into<String>,
        credential: VaultReference,
    ) -> Self {
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            credential,
            metadata: Map::new(),
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Top-level string property, `None` when absent or not a string.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Metadata string field, `None` when absent or not a string.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// Kind of material stored in a secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SecretType {
    ServicePrincipal,
    PublishProfile,
    Other(String),
}

impl SecretType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ServicePrincipal => "service-principal",
            Self::PublishProfile => "publish-profile",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for SecretType {
    fn from(s: &str) -> Self {
        match s {
            "service-principal" => Self::ServicePrincipal,
            "publish-profile" => Self::PublishProfile,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SecretType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SecretType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// Encoding of the secret value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentType {
    Json,
    Xml,
    Other(String),
}

impl ContentType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for ContentType {
    fn from(s: &str) -> Self {
        match s {
            "json" => Self::Json,
            "xml" => Self::Xml,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ContentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ContentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// Descriptive metadata attached to a secret as tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretMetadata {
    pub secret_type: SecretType,
    pub content_type: ContentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

impl SecretMetadata {
    pub fn new(secret_type: SecretType, content_type: ContentType) -> Self {
        Self {
            secret_type,
            content_type,
            display_name: None,
            purpose: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn purpose_or_default(&self) -> &str {
        self.purpose.as_deref().unwrap_or(DEFAULT_PURPOSE)
    }

    /// Tags written alongside the secret. All four keys are always present.
    pub fn tags(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("type".to_string(), self.secret_type.as_str().to_string()),
            ("purpose".to_string(), self.purpose_or_default().to_string()),
            (
                "displayName".to_string(),
                self.display_name.clone().unwrap_or_default(),
            ),
            (
                "contentType".to_string(),
                self.content_type.as_str().to_string(),
            ),
        ])
    }
}

/// A secret read back from a store.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret {
    pub name: String,
    pub value: String,
    pub version: Option<String>,
    pub content_type: Option<String>,
    pub tags: BTreeMap<String, String>,
}

impl Secret {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            version: None,
            content_type: None,
            tags: BTreeMap::new(),
        }
    }
}

// The value is left out on purpose so secrets never reach logs.
impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("content_type", &self.content_type)
            .field("tags", &self.tags)
            .finish()
    }
}

/// Outcome of an existence check against a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretLookup {
    Found(Secret),
    Absent,
}

impl SecretLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Authentication material returned by a principal issuer.
///
/// The pipeline does not look inside; it only renders the payload as JSON text.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssuedCredential(Value);

impl IssuedCredential {
    pub fn new(payload: Value) -> Self {
        Self(payload)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// Compact JSON text, the form written to the store.
    pub fn to_secret_value(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Debug for IssuedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IssuedCredential(<redacted>)")
    }
}

/// Per-invocation switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningOptions {
    #[serde(default)]
    pub dry_run: bool,
}

impl ProvisioningOptions {
    pub fn live() -> Self {
        Self { dry_run: false }
    }

    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }
}
