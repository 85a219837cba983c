//! `check` and `init` subcommands.

use anyhow::{Context, Result, bail};
use rec_cue_config::{Config, FolderStatus};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

fn resolve_path(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::config_path)
}

/// Print one line per configured folder. Returns true if at least one folder
/// can be monitored.
pub fn check_cli(config_path: Option<&Path>) -> Result<bool> {
    let path = resolve_path(config_path);
    let config = Config::load_from(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    let mut stdout = io::stdout().lock();
    write_check_report(&mut stdout, &path, &config)?;
    Ok(config.has_any_valid_monitored_folder())
}

/// Body of `check`, split out so it can be rendered into a buffer.
pub fn write_check_report(out: &mut impl Write, path: &Path, config: &Config) -> io::Result<()> {
    writeln!(out, "Config: {}", path.display())?;
    let statuses = config.folder_statuses();
    if statuses.is_empty() {
        writeln!(out, "  (no folders configured)")?;
    }
    for (folder, status) in statuses {
        let shown = if status == FolderStatus::Blank {
            "<blank>"
        } else {
            folder
        };
        writeln!(out, "  [{:<7}] {}", status.label(), shown)?;
    }
    writeln!(
        out,
        "Timing: inactivity {} ms, poll {} ms",
        config.inactivity_timeout_ms, config.poll_interval_ms
    )
}

/// Write a default config file at `config_path` (or the default location).
pub fn init_cli(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = resolve_path(config_path);
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    Config::default()
        .save_to(&path)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
