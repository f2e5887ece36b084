use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use keyseed_azure::{
    ClientSecretCredential, KeyVaultClient, ServicePrincipalIssuer, StaticTokenCredential,
    TokenCredential,
};
use keyseed_core::ProvisioningOptions;
use keyseed_engine::Provisioner;

use crate::cli::SetupArgs;
use crate::output::{export_output, print_success};
use crate::settings::Settings;

pub async fn setup(settings: &Settings, args: &SetupArgs) -> Result<()> {
    println!();
    println!("{}", "Starting secret setup".bold().cyan());
    if settings.dry_run {
        println!("{}", "(dry run: Azure will not be called)".yellow());
    }
    println!();

    let provisioner = build_provisioner(settings)?;
    let options = ProvisioningOptions {
        dry_run: settings.dry_run,
    };
    provisioner
        .setup_secrets(&settings.matrix(), &options)
        .await
        .context("Secret setup aborted")?;

    if !args.no_export {
        let value = serde_json::to_value(&settings.resources)?;
        export_output(value, &settings.output.name)?;
    }

    println!();
    print_success("Secret setup process completed");
    Ok(())
}

fn build_provisioner(settings: &Settings) -> Result<Provisioner> {
    let cloud = settings.azure.clone();
    let (credential, tenant_id): (Arc<dyn TokenCredential>, String) =
        match ClientSecretCredential::from_env(&cloud) {
            Ok(credential) => {
                let tenant_id = credential.tenant_id().to_string();
                (Arc::new(credential) as Arc<dyn TokenCredential>, tenant_id)
            }
            // A dry run never reaches Azure.
            Err(e) if settings.dry_run => {
                tracing::debug!(error = %e, "No Azure credentials in environment");
                (Arc::new(StaticTokenCredential::new("")) as _, String::new())
            }
            Err(e) => return Err(e).context("Azure credentials are required unless --dry-run"),
        };

    let store = Arc::new(KeyVaultClient::new(cloud.clone(), credential.clone()));
    let issuer = Arc::new(ServicePrincipalIssuer::new(cloud, credential, tenant_id));
    Ok(Provisioner::new(store, issuer))
}
