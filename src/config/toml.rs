//! TOML configuration file parsing
//!
//! Every key is optional; missing keys take the [`ReplayConfig`] defaults.
//!
//! ```toml
//! trace_path = "T7-disk0.txt"
//! device_path = "/dev/sdb"
//! worker_count = 64
//! respect_timing = true
//! ```

use super::cli::Cli;
use super::cli_convert::apply_cli;
use super::ReplayConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<ReplayConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<ReplayConfig> {
    let config: ReplayConfig =
        ::toml::from_str(contents).context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Build the effective configuration: TOML file (if given), then CLI overrides
pub fn load_config(cli: &Cli) -> Result<ReplayConfig> {
    let base = match cli.config {
        Some(ref path) => parse_toml_file(path)?,
        None => ReplayConfig::default(),
    };
    apply_cli(cli, base)
}
