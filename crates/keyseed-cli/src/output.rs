use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use keyseed_core::ResourceMatrix;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_matrix(matrix: &ResourceMatrix, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(matrix)?),
        OutputFormat::Toml => println!("{}", toml::to_string_pretty(matrix)?),
        OutputFormat::Table => println!("{}", matrix_table(matrix)),
    }
    Ok(())
}

fn matrix_table(matrix: &ResourceMatrix) -> String {
    if matrix.is_empty() {
        return "No resources configured.".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(["Type", "ID", "Name", "Vault", "Secret", "GitHub secret"]);
    for (resource_type, resources) in matrix {
        for r in resources {
            builder.push_record([
                resource_type.as_str(),
                r.id.as_str(),
                r.property_str("name").unwrap_or("-"),
                r.credential.vault_name.as_str(),
                r.credential.secret_name.as_str(),
                r.credential.gh_secret_name.as_str(),
            ]);
        }
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Publishes `value` as the automation output `name` and hands it back.
///
/// Appends to the file named by `GITHUB_OUTPUT` when set, otherwise prints
/// the legacy `::set-output` workflow command.
pub fn export_output(value: Value, name: &str) -> Result<Value> {
    let target = std::env::var_os("GITHUB_OUTPUT");
    export_output_to(
        value,
        name,
        target.as_deref().map(Path::new),
        &mut std::io::stdout(),
    )
}

pub fn export_output_to(
    value: Value,
    name: &str,
    output_file: Option<&Path>,
    stdout: &mut impl Write,
) -> Result<Value> {
    tracing::info!(output = name, "Setting automation output");
    tracing::info!(
        "Deployment matrix:\n{}",
        serde_json::to_string_pretty(&value)?
    );

    let compact = serde_json::to_string(&value)?;
    match output_file {
        Some(path) => {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open output file {}", path.display()))?;
            // Compact JSON is a single line, so the plain `name=value` form suffices.
            writeln!(file, "{name}={compact}")
                .with_context(|| format!("Failed to write output file {}", path.display()))?;
        }
        None => writeln!(stdout, "::set-output name={name}::{compact}")?,
    }

    tracing::info!(output = name, "Output set");
    Ok(value)
}
