//! GitHub App API access
//!
//! Listing installations and exchanging the app assertion for an
//! installation token. Listing sits behind [`InstallationSource`] so
//! resolution can be tested without a server.

mod github;

pub use github::{
    DEFAULT_API_URL, DEFAULT_MAX_RESPONSE_BYTES, DEFAULT_TIMEOUT, GitHubAppClient,
};

use crate::error::Result;
use crate::types::Installation;
use async_trait::async_trait;

/// Something that can enumerate the app's installations
#[async_trait]
pub trait InstallationSource: Send + Sync {
    /// List every installation of the app
    async fn list_installations(&self) -> Result<Vec<Installation>>;
}
