//! Release update notification
//!
//! Looks up the latest release tag at most once a day and caches the answer
//! next to the config. Every failure is swallowed: a broken update check
//! must never get in the way of the forwarded command.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Latest-release endpoint for this tool
pub const RELEASE_URL: &str =
    "https://api.github.com/repos/haribote-lab/github-app-cli/releases/latest";

/// Environment variable that disables the check when non-empty
pub const ENV_NO_UPDATE_CHECK: &str = "GHA_NO_UPDATE_CHECK";

const CACHE_FILE: &str = "update-check.json";
const CHECK_INTERVAL_HOURS: i64 = 24;
const HTTP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(3);
const MAX_RESPONSE_BYTES: usize = 1 << 20;

/// Cached result of the last check
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheState {
    latest_version: String,
    checked_at: DateTime<Utc>,
}

/// A newer release is available
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateNotice {
    /// Running version
    pub current: String,
    /// Latest published version
    pub latest: String,
}

impl std::fmt::Display for UpdateNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "A new version of gha is available: v{} -> v{}\nVisit https://github.com/haribote-lab/github-app-cli/releases",
            self.current, self.latest
        )
    }
}

/// Report a newer release, consulting the cache in `cache_dir` first.
pub async fn check_for_update(
    current_version: &str,
    cache_dir: &Path,
    release_url: &str,
) -> Option<UpdateNotice> {
    check_for_update_at(current_version, cache_dir, release_url, Utc::now()).await
}

/// [`check_for_update`] with an explicit clock.
pub async fn check_for_update_at(
    current_version: &str,
    cache_dir: &Path,
    release_url: &str,
    now: DateTime<Utc>,
) -> Option<UpdateNotice> {
    if current_version.is_empty() || current_version == "dev" {
        return None;
    }

    let cache_path = cache_dir.join(CACHE_FILE);
    let latest = match read_cache(&cache_path) {
        Some(cached) if now - cached.checked_at < Duration::hours(CHECK_INTERVAL_HOURS) => {
            debug!(latest = %cached.latest_version, "using cached release version");
            cached.latest_version
        }
        _ => {
            let latest = fetch_latest_version(release_url).await?;
            write_cache(
                &cache_path,
                &CacheState {
                    latest_version: latest.clone(),
                    checked_at: now,
                },
            );
            latest
        }
    };

    is_newer(&latest, current_version).then(|| UpdateNotice {
        current: current_version.trim_start_matches('v').to_string(),
        latest,
    })
}

async fn fetch_latest_version(url: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct Release {
        tag_name: String,
    }

    let client = reqwest::Client::builder()
        .user_agent(concat!("gha/", env!("CARGO_PKG_VERSION")))
        .timeout(HTTP_TIMEOUT)
        .build()
        .ok()?;

    let mut response = match client.get(url).send().await {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            debug!(status = %r.status(), "release check returned non-success");
            return None;
        }
        Err(e) => {
            debug!(error = %e, "release check failed");
            return None;
        }
    };

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.ok()? {
        if body.len() + chunk.len() > MAX_RESPONSE_BYTES {
            debug!("release response too large");
            return None;
        }
        body.extend_from_slice(&chunk);
    }

    let release: Release = serde_json::from_slice(&body).ok()?;
    let version = release.tag_name.trim_start_matches('v').to_string();
    (!version.is_empty()).then_some(version)
}

fn read_cache(path: &Path) -> Option<CacheState> {
    let data = fs::read(path).ok()?;
    serde_json::from_slice(&data).ok()
}

fn write_cache(path: &Path, state: &CacheState) {
    let Ok(data) = serde_json::to_vec(state) else {
        return;
    };
    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        debug!(error = %e, "could not create update cache directory");
        return;
    }
    if let Err(e) = fs::write(path, data) {
        debug!(error = %e, "could not write update cache");
    }
}

/// Whether `latest` is a higher version than `current`.
///
/// Uses semver when both parse, otherwise compares up to three numeric
/// `major.minor.patch` components with missing or garbled parts as 0.
pub fn is_newer(latest: &str, current: &str) -> bool {
    let latest = latest.trim_start_matches('v');
    let current = current.trim_start_matches('v');

    if let (Ok(l), Ok(c)) = (semver::Version::parse(latest), semver::Version::parse(current)) {
        return l > c;
    }

    numeric_parts(latest) > numeric_parts(current)
}

fn numeric_parts(version: &str) -> [u64; 3] {
    let mut parts = [0u64; 3];
    for (slot, part) in parts.iter_mut().zip(version.split('.')) {
        *slot = part.parse().unwrap_or(0);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_newer() {
        assert!(is_newer("1.2.0", "1.1.9"));
        assert!(is_newer("v2.0.0", "1.9.9"));
        assert!(!is_newer("1.0.0", "1.0.0"));
        assert!(!is_newer("0.9.0", "1.0.0"));
        assert!(is_newer("1.1", "1.0.5"));
        assert!(!is_newer("1.0.0-rc.1", "1.0.0"));
    }

    #[tokio::test]
    async fn test_dev_version_skips_check() {
        let temp = TempDir::new().unwrap();
        let notice = check_for_update("dev", temp.path(), "http://127.0.0.1:9/never").await;
        assert!(notice.is_none());
    }

    #[tokio::test]
    async fn test_fresh_cache_avoids_network() {
        let temp = TempDir::new().unwrap();
        let now = Utc::now();
        write_cache(
            &temp.path().join(CACHE_FILE),
            &CacheState {
                latest_version: "9.9.9".to_string(),
                checked_at: now - Duration::hours(1),
            },
        );

        let notice = check_for_update_at("1.0.0", temp.path(), "http://127.0.0.1:9/never", now)
            .await
            .unwrap();
        assert_eq!(notice.latest, "9.9.9");
        assert_eq!(notice.current, "1.0.0");
    }

    #[tokio::test]
    async fn test_stale_cache_refetches() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/releases/latest")
            .with_status(200)
            .with_body(r#"{"tag_name":"v1.5.0"}"#)
            .create_async()
            .await;

        let temp = TempDir::new().unwrap();
        let now = Utc::now();
        write_cache(
            &temp.path().join(CACHE_FILE),
            &CacheState {
                latest_version: "1.0.0".to_string(),
                checked_at: now - Duration::hours(25),
            },
        );

        let url = format!("{}/releases/latest", server.url());
        let notice = check_for_update_at("1.0.0", temp.path(), &url, now).await;

        mock.assert_async().await;
        assert_eq!(notice.map(|n| n.latest), Some("1.5.0".to_string()));
        let cached = read_cache(&temp.path().join(CACHE_FILE)).unwrap();
        assert_eq!(cached.latest_version, "1.5.0");
    }

    #[tokio::test]
    async fn test_server_error_is_silent() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/releases/latest")
            .with_status(500)
            .create_async()
            .await;

        let temp = TempDir::new().unwrap();
        let url = format!("{}/releases/latest", server.url());
        assert!(check_for_update("1.0.0", temp.path(), &url).await.is_none());
        assert!(read_cache(&temp.path().join(CACHE_FILE)).is_none());
    }
}
