use std::path::Path;

use anyhow::{bail, Context, Result};

use nous_notion::notion::ImportSettings;

pub fn run(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    ImportSettings::default()
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Wrote default settings to {}", path.display());
    Ok(())
}
