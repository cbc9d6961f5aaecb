//! gha - run gh commands authenticated as a GitHub App installation
//!
//! The credential pipeline, in order:
//!
//! 1. [`auth::load_private_key`] reads the app's RSA key
//! 2. [`auth::sign_app_assertion`] signs a short-lived JWT
//! 3. [`resolve::resolve_installation`] picks the installation
//! 4. [`platform::GitHubAppClient::create_installation_token`] mints a token
//! 5. [`forward::forward_with`] hands the token to gh as `GH_TOKEN`
//!
//! The installation token only ever lives in memory.

pub mod auth;
pub mod config;
pub mod error;
pub mod forward;
pub mod platform;
pub mod resolve;
pub mod types;
pub mod update;
