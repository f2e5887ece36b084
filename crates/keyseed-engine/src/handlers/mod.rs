//! Built-in resource handlers.

mod container_app;

pub use container_app::{
    CONTAINER_APP_ROLE, CONTAINER_APP_TYPE, ContainerAppHandler, ContainerAppResourceConfig,
    setup_secrets_for_container_app,
};
