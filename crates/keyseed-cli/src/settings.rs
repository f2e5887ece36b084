//! Layered settings: configuration file, then `KEYSEED__*` environment
//! variables, then command-line flags.

use std::path::Path;

use keyseed_azure::AzureCloud;
use keyseed_core::{ResourceConfig, ResourceMatrix, group_by_type};
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "KEYSEED";
const VALID_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("configuration file not found: {0}")]
    NotFound(String),

    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub azure: AzureCloud,
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_output_name")]
    pub name: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            name: default_output_name(),
        }
    }
}

fn default_output_name() -> String {
    "matrix".into()
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub dry_run: Option<bool>,
    pub log_level: Option<String>,
    pub output_name: Option<String>,
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let lvl = self.logging.level.to_ascii_lowercase();
        if !VALID_LEVELS.contains(&lvl.as_str()) {
            return Err(SettingsError::Invalid(format!(
                "logging.level must be one of {VALID_LEVELS:?}"
            )));
        }
        let name = &self.output.name;
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(SettingsError::Invalid(
                "output.name must be non-empty and contain only letters, digits, '_' or '-'"
                    .into(),
            ));
        }
        Ok(())
    }

    /// Resources grouped by type tag, in file order.
    pub fn matrix(&self) -> ResourceMatrix {
        group_by_type(self.resources.iter().cloned())
    }
}

pub mod loader {
    use super::*;
    use config::{Config, Environment, File};

    pub fn environment() -> Environment {
        // e.g. KEYSEED__OUTPUT__NAME=deploy_matrix
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    pub fn load_settings(path: &Path, overrides: &Overrides) -> Result<Settings, SettingsError> {
        load_settings_with_env(path, overrides, environment())
    }

    pub fn load_settings_with_env(
        path: &Path,
        overrides: &Overrides,
        env: Environment,
    ) -> Result<Settings, SettingsError> {
        if !path.exists() {
            return Err(SettingsError::NotFound(path.display().to_string()));
        }
        let cfg = Config::builder()
            .add_source(File::from(path))
            .add_source(env)
            .set_override_option("dry_run", overrides.dry_run)?
            .set_override_option("logging.level", overrides.log_level.clone())?
            .set_override_option("output.name", overrides.output_name.clone())?
            .build()?;
        let settings: Settings = cfg.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::loader::*;
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const DEV: &str = r#"
[output]
name = "matrix"

[[resources]]
id = "dev-dev-001"
type = "azure_container_app"
name = "app-dev-001"
resource_group = "rg-dev"
location = "eastus"

[resources.credential]
type = "key_vault"
gh_secret_name = "AZURE_CREDENTIALS_DEV"
vault_name = "kv-dev"
secret_name = "sp-dev-001"

[resources.metadata]
subscription_id = "sub1"
service_principal_name = "sp-dev-001"
"#;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn no_env() -> config::Environment {
        environment().source(Some(HashMap::new()))
    }

    #[test]
    fn test_loads_resources_from_file() {
        let file = write_config(DEV);
        let settings =
            load_settings_with_env(file.path(), &Overrides::default(), no_env()).unwrap();

        assert!(!settings.dry_run);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.resources.len(), 1);

        let resource = &settings.resources[0];
        assert_eq!(resource.id, "dev-dev-001");
        assert_eq!(resource.resource_type, "azure_container_app");
        assert_eq!(resource.property_str("resource_group"), Some("rg-dev"));
        assert_eq!(resource.credential.vault_name, "kv-dev");
        assert_eq!(resource.metadata_str("subscription_id"), Some("sub1"));
    }

    #[test]
    fn test_matrix_groups_by_type() {
        let file = write_config(DEV);
        let settings =
            load_settings_with_env(file.path(), &Overrides::default(), no_env()).unwrap();
        let matrix = settings.matrix();
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix["azure_container_app"][0].id, "dev-dev-001");
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_config(DEV);
        let env = environment().source(Some(HashMap::from([
            ("KEYSEED__DRY_RUN".to_string(), "true".to_string()),
            ("KEYSEED__OUTPUT__NAME".to_string(), "deploy_matrix".to_string()),
        ])));
        let settings = load_settings_with_env(file.path(), &Overrides::default(), env).unwrap();
        assert!(settings.dry_run);
        assert_eq!(settings.output.name, "deploy_matrix");
    }

    #[test]
    fn test_flags_override_env() {
        let file = write_config(DEV);
        let env = environment().source(Some(HashMap::from([(
            "KEYSEED__LOGGING__LEVEL".to_string(),
            "warn".to_string(),
        )])));
        let overrides = Overrides {
            dry_run: Some(true),
            log_level: Some("debug".into()),
            output_name: None,
        };
        let settings = load_settings_with_env(file.path(), &overrides, env).unwrap();
        assert!(settings.dry_run);
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.output.name, "matrix");
    }

    #[test]
    fn test_missing_file() {
        let err = load_settings_with_env(
            Path::new("/nonexistent/keyseed.toml"),
            &Overrides::default(),
            no_env(),
        )
        .unwrap_err();
        assert!(matches!(err, SettingsError::NotFound(_)));
    }

    #[test]
    fn test_rejects_bad_log_level() {
        let file = write_config("[logging]\nlevel = \"loud\"\n");
        let err = load_settings_with_env(file.path(), &Overrides::default(), no_env())
            .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn test_rejects_bad_output_name() {
        let file = write_config("[output]\nname = \"deploy matrix\"\n");
        let err = load_settings_with_env(file.path(), &Overrides::default(), no_env())
            .unwrap_err();
        assert!(err.to_string().contains("output.name"));
    }
}
