//! Identity list input and default output naming.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use std::path::{Path, PathBuf};

use crate::types::Identity;

/// Read identities from a file, one complete address per line. Blank lines
/// and surrounding whitespace are ignored.
pub fn identities_from_file(path: &Path) -> Result<Vec<Identity>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading identity list {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Default output path: `found_messages-<UTC timestamp>.json` in the working
/// directory, so repeated runs never append to each other's output.
pub fn default_output_path() -> PathBuf {
    let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    PathBuf::from(format!("found_messages-{stamp}.json"))
}
