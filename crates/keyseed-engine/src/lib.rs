//! # keyseed-engine
//!
//! The idempotent credential provisioning pipeline.
//!
//! [`Provisioner::setup_secrets`] takes a [`ResourceMatrix`](keyseed_core::ResourceMatrix)
//! (type tag -> resources) and, for each resource, makes sure its credential
//! secret exists exactly once:
//!
//! ```text
//! lookup_secret ──Found──▶ skip
//!      │
//!    Absent
//!      ▼
//! create_principal_with_role ──▶ set_secret
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use keyseed_core::{ProvisioningOptions, group_by_type};
//! use keyseed_engine::Provisioner;
//!
//! let provisioner = Provisioner::new(Arc::new(store), Arc::new(issuer));
//! provisioner
//!     .setup_secrets(&group_by_type(resources), &ProvisioningOptions::dry_run())
//!     .await?;
//! ```

pub mod handlers;
mod provisioner;
mod registry;

pub use handlers::{
    CONTAINER_APP_ROLE, CONTAINER_APP_TYPE, ContainerAppHandler, ContainerAppResourceConfig,
};
pub use provisioner::Provisioner;
pub use registry::{HandlerRegistry, ProvisionContext, ProvisionOutcome, ResourceHandler};
