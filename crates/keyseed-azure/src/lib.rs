//! # keyseed-azure
//!
//! Azure backends for the keyseed provisioning pipeline.
//!
//! - [`KeyVaultClient`]: [`keyseed_core::SecretStore`] over the Key Vault secrets REST API
//! - [`ServicePrincipalIssuer`]: [`keyseed_core::PrincipalIssuer`] over Microsoft Graph
//!   and Azure Resource Manager role assignments
//! - [`ClientSecretCredential`]: client-credentials tokens from Entra ID
//!
//! Endpoints come from [`AzureCloud`], so every adapter can be pointed at a
//! mock server.

pub mod cloud;
pub mod credential;
pub mod error;
pub mod issuer;
pub mod keyvault;

pub use cloud::AzureCloud;
pub use credential::{
    ClientSecretCredential, SdkAuthCredentials, StaticTokenCredential, TokenCredential,
};
pub use error::AzureError;
pub use issuer::ServicePrincipalIssuer;
pub use keyvault::KeyVaultClient;
