use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::OutputFormat;
use crate::output::print_matrix;
use crate::settings::{Overrides, loader};

pub fn show(config: &Path, format: OutputFormat) -> Result<()> {
    let settings = loader::load_settings(config, &Overrides::default())
        .with_context(|| format!("Failed to load {}", config.display()))?;
    print_matrix(&settings.matrix(), format)
}
