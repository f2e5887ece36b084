//! Error types for the provisioning pipeline.
//!
//! Store and issuer backends report [`StoreError`] and [`IssuerError`]; the
//! pipeline wraps both in [`ProvisionError`] together with configuration
//! failures.

use std::fmt;

/// Errors that can occur while talking to a secret store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The requested secret does not exist in the vault.
    #[error("Secret not found: {vault_name}/{secret_name}")]
    NotFound {
        /// Vault that was queried.
        vault_name: String,
        /// Secret that was not found.
        secret_name: String,
    },

    /// The caller is not allowed to read or write the secret.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description returned by the store.
        message: String,
    },

    /// A failure that may succeed on a later attempt (throttling, outage, timeout).
    #[error("Transient store error: {message}")]
    Transient {
        /// Description of the transient failure.
        message: String,
    },

    /// Any other store-side failure.
    #[error("Store error: {message}")]
    Unknown {
        /// Description of the failure.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(vault_name: impl Into<String>, secret_name: impl Into<String>) -> Self {
        Self::NotFound {
            vault_name: vault_name.into(),
            secret_name: secret_name.into(),
        }
    }

    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `Transient` error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Creates a new `Unknown` error.
    #[must_use]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Unauthorized { .. } => ErrorCategory::Unauthorized,
            Self::Transient { .. } => ErrorCategory::Transient,
            Self::Unknown { .. } => ErrorCategory::Internal,
        }
    }
}

/// Errors that can occur while issuing a scoped principal.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IssuerError {
    /// The issuing identity lacks permission to create principals or assign roles.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description returned by the provider.
        message: String,
    },

    /// The requested role does not exist at the given scope.
    #[error("Role '{role}' not found at scope {scope}")]
    RoleNotFound {
        /// Role name that was looked up.
        role: String,
        /// Scope the role was to be assigned at.
        scope: String,
    },

    /// Any other provider-side failure.
    #[error("Principal issuance failed: {message}")]
    Unknown {
        /// Description of the failure.
        message: String,
    },
}

impl IssuerError {
    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `RoleNotFound` error.
    #[must_use]
    pub fn role_not_found(role: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::RoleNotFound {
            role: role.into(),
            scope: scope.into(),
        }
    }

    /// Creates a new `Unknown` error.
    #[must_use]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized { .. } => ErrorCategory::Unauthorized,
            Self::RoleNotFound { .. } | Self::Unknown { .. } => ErrorCategory::Issuance,
        }
    }
}

/// Errors raised by the provisioning pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// The resource matrix is malformed: an empty list under a declared type,
    /// or a resource missing a required field.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of what is wrong with the configuration.
        message: String,
    },

    /// No handler is registered for the resource type.
    #[error("Unsupported resource type: {resource_type}")]
    UnsupportedResourceType {
        /// The unregistered type tag.
        resource_type: String,
    },

    /// The secret store failed for a reason other than "not found".
    #[error("Credential store error: {0}")]
    CredentialStore(#[from] StoreError),

    /// The principal issuer failed.
    #[error("Principal issuance error: {0}")]
    PrincipalIssuance(#[from] IssuerError),
}

impl ProvisionError {
    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `UnsupportedResourceType` error.
    #[must_use]
    pub fn unsupported(resource_type: impl Into<String>) -> Self {
        Self::UnsupportedResourceType {
            resource_type: resource_type.into(),
        }
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::UnsupportedResourceType { .. } => ErrorCategory::Unsupported,
            Self::CredentialStore(e) => e.category(),
            Self::PrincipalIssuance(e) => e.category(),
        }
    }
}

/// Categories of provisioning errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Invalid or incomplete configuration.
    Configuration,
    /// No handler for the resource type.
    Unsupported,
    /// Secret absent.
    NotFound,
    /// Authentication or authorization failure.
    Unauthorized,
    /// Retryable provider failure.
    Transient,
    /// Principal creation or role assignment failure.
    Issuance,
    /// Anything else.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Unsupported => write!(f, "unsupported"),
            Self::NotFound => write!(f, "not_found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Transient => write!(f, "transient"),
            Self::Issuance => write!(f, "issuance"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
