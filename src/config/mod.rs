//! Persisted GitHub App credentials
//!
//! Stored as TOML in `$XDG_CONFIG_HOME/github-app-cli/config.toml`, falling
//! back to `~/.config/github-app-cli/config.toml`.

use crate::error::{Error, Result};
use crate::platform::DEFAULT_API_URL;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Directory name under the config root
const CONFIG_DIR: &str = "github-app-cli";

/// Filename for the credentials file
const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the API root
pub const ENV_API_URL: &str = "GHA_API_URL";

/// GitHub App credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// GitHub App ID
    pub app_id: u64,
    /// Installation to act as; 0 means auto-detect
    #[serde(default)]
    pub installation_id: u64,
    /// Path to the app's PEM private key
    pub private_key_path: PathBuf,
    /// API root, for GitHub Enterprise Server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl Config {
    /// API root to talk to: `GHA_API_URL`, then `api_url`, then github.com
    pub fn effective_api_url(&self, env_override: Option<&str>) -> Result<String> {
        let raw = env_override
            .filter(|u| !u.is_empty())
            .or(self.api_url.as_deref())
            .unwrap_or(DEFAULT_API_URL);
        validate_api_url(raw)?;
        Ok(raw.to_string())
    }

    /// Check invariants and normalize the key path
    fn validate(mut self) -> Result<Self> {
        if self.app_id == 0 {
            return Err(Error::Config("app_id must be a positive integer".to_string()));
        }

        let key_path = self.private_key_path.to_string_lossy().trim().to_string();
        if key_path.is_empty() {
            return Err(Error::Config(
                "private_key_path is required in config".to_string(),
            ));
        }
        self.private_key_path = PathBuf::from(key_path);

        if let Some(url) = &self.api_url {
            validate_api_url(url)?;
        }
        Ok(self)
    }
}

fn validate_api_url(raw: &str) -> Result<()> {
    let url = Url::parse(raw).map_err(|e| Error::Config(format!("invalid API URL {raw:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "invalid API URL {raw:?}: scheme must be http or https"
        )));
    }
    Ok(())
}

/// Config directory for the given `XDG_CONFIG_HOME` and home directory.
pub fn config_dir_from(xdg_config_home: Option<OsString>, home: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(xdg) = xdg_config_home.filter(|x| !x.is_empty()) {
        return Ok(PathBuf::from(xdg).join(CONFIG_DIR));
    }
    let home = home.ok_or_else(|| Error::Config("cannot determine home directory".to_string()))?;
    Ok(home.join(".config").join(CONFIG_DIR))
}

/// Config directory for the current user.
pub fn config_dir() -> Result<PathBuf> {
    config_dir_from(std::env::var_os("XDG_CONFIG_HOME"), dirs::home_dir())
}

/// Path of the credentials file inside `dir`.
pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

/// Load credentials from `dir`.
pub fn load_config_from(dir: &Path) -> Result<Config> {
    let path = config_path(dir);

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(Error::ConfigNotFound),
        Err(e) => {
            return Err(Error::Config(format!(
                "failed to read {}: {e}",
                path.display()
            )));
        }
    };

    let config: Config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;

    debug!(path = %path.display(), "loaded config");
    config.validate()
}

/// Load credentials from the default location.
pub fn load_config() -> Result<Config> {
    load_config_from(&config_dir()?)
}

/// Save credentials to `dir`, readable by the owner only.
pub fn save_config_to(dir: &Path, config: &Config) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .map_err(|e| Error::Config(format!("failed to create {}: {e}", dir.display())))?;
    restrict_permissions(dir, 0o700)?;

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("failed to serialize config: {e}")))?;

    let path = config_path(dir);
    fs::write(&path, content)
        .map_err(|e| Error::Config(format!("failed to write {}: {e}", path.display())))?;
    restrict_permissions(&path, 0o600)?;

    Ok(path)
}

/// Save credentials to the default location.
pub fn save_config(config: &Config) -> Result<PathBuf> {
    save_config_to(&config_dir()?, config)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| {
        Error::Config(format!(
            "failed to set permissions on {}: {e}",
            path.display()
        ))
    })
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn restrict_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
