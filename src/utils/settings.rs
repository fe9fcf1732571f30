//! Load `mailsweep.toml` (CLI only): remote endpoint, service token, and
//! directory domain. Lib callers construct a remote adapter themselves.

use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub remote: RemoteSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct RemoteSection {
    /// Base URL of the mail service API.
    pub base_url: Option<String>,
    /// Service-account bearer token. `MAILSWEEP_TOKEN` in the environment
    /// (or a `.env` file) takes precedence over this.
    pub token: Option<String>,
    /// Directory domain used by `--all` identity enumeration.
    pub domain: Option<String>,
}

/// Default settings filename, looked up in the working directory.
pub const SETTINGS_FILENAME: &str = "mailsweep.toml";

/// Read settings from `path`, or `./mailsweep.toml` when no path was given.
/// A missing file yields empty settings; a malformed file is an error (bad
/// credentials config should not silently fall through to "no token").
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let path = path.unwrap_or(Path::new(SETTINGS_FILENAME));
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Settings::default()),
        Err(e) => return Err(anyhow::anyhow!("{}: {}", path.display(), e)),
    };
    toml::from_str(&text).map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
}

/// Resolve the service token: environment (including `.env`) first, then the
/// settings file.
pub fn resolve_token(settings: &Settings) -> Option<String> {
    dotenvy::dotenv().ok();
    std::env::var("MAILSWEEP_TOKEN")
        .ok()
        .filter(|t| !t.is_empty())
        .or_else(|| settings.remote.token.clone())
}
