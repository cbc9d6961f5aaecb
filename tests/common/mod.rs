//! Shared test helpers

#![allow(dead_code)]

mod mock_source;

pub use mock_source::MockInstallationSource;

use std::path::PathBuf;

/// Path to a file under `tests/fixtures`
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Token response body as the API returns it, expiring in an hour
pub fn token_body(token: &str) -> String {
    let expires = chrono::Utc::now() + chrono::Duration::hours(1);
    format!(
        r#"{{"token":"{token}","expires_at":"{}"}}"#,
        expires.to_rfc3339()
    )
}
