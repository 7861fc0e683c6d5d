//! `wasabi-backup init`: scaffold a `.env` file.
//!
//! The template lists every variable the resolver reads, with the secrets
//! left blank (blank values count as unset) and the optional settings
//! commented out at their defaults.  On Unix the file is created `0600` since
//! it is meant to hold credentials.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::Path,
};

use anyhow::{Context, Result, bail};
use console::style;

use crate::config::{
    ACCESS_KEY_VAR, DEFAULT_ENDPOINT, DEFAULT_PREFIX, ENDPOINT_VAR, PASSWORD_VAR, PREFIX_VAR,
    REGION_VAR, SECRET_KEY_VAR,
};

/// Render the template.
pub fn template() -> String {
    format!(
        "# Credentials for wasabi-backup.  Keep this file out of version control.\n\
         # Single-quote values containing '$', e.g. {PASSWORD_VAR}='pa$word'.\n\
         {ACCESS_KEY_VAR}=\n\
         {SECRET_KEY_VAR}=\n\
         {PASSWORD_VAR}=\n\
         \n\
         # Optional settings (CLI flags win over these).\n\
         # {ENDPOINT_VAR}={DEFAULT_ENDPOINT}\n\
         # {REGION_VAR}=us-east-1\n\
         # {PREFIX_VAR}={DEFAULT_PREFIX}\n"
    )
}

/// Write the template to `path`, refusing to overwrite an existing file.
pub fn run(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("'{}' already exists, refusing to overwrite", path.display());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("creating {}", path.display()))?;
    file.write_all(template().as_bytes())
        .with_context(|| format!("writing {}", path.display()))?;

    println!(
        "  {}  {} {}",
        style("✓").green().bold(),
        style("Created").bold(),
        path.display()
    );
    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
