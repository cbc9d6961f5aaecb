//! Proxy command - mint an installation token and hand off to gh

use crate::cli::args::{RawInstallationFlags, split_installation_flags};
use gha::auth::{load_private_key, sign_app_assertion};
use gha::config::{Config, ENV_API_URL};
use gha::error::Result;
use gha::forward::{Forwarder, forward_with};
use gha::platform::GitHubAppClient;
use gha::resolve::{
    ENV_INSTALLATION_ID, ENV_ORG, InstallationOverride, ResolutionInputs, resolve_installation,
};
use std::env;
use std::ffi::OsString;
use tracing::debug;

/// Everything the proxy reads from outside the process, gathered up front
pub struct ProxyRequest {
    /// Installation flags given before the gh subcommand
    pub leading_flags: RawInstallationFlags,
    /// gh arguments, possibly still containing installation flags
    pub args: Vec<OsString>,
    /// Raw `GHA_INSTALLATION_ID`
    pub env_installation_id: Option<String>,
    /// Raw `GHA_ORG`
    pub env_org: Option<String>,
    /// Raw `GHA_API_URL`
    pub env_api_url: Option<String>,
    /// `PATH` used to find gh
    pub path_var: Option<OsString>,
    /// Environment the child starts from, before scrubbing
    pub environment: Vec<(OsString, OsString)>,
}

impl ProxyRequest {
    /// Capture the request from the process environment
    pub fn from_env(leading_flags: RawInstallationFlags, args: Vec<OsString>) -> Self {
        Self {
            leading_flags,
            args,
            env_installation_id: env::var(ENV_INSTALLATION_ID).ok(),
            env_org: env::var(ENV_ORG).ok(),
            env_api_url: env::var(ENV_API_URL).ok(),
            path_var: env::var_os("PATH"),
            environment: env::vars_os().collect(),
        }
    }
}

/// Run the credential pipeline and forward to gh through `forwarder`.
///
/// Returns gh's exit status.
pub async fn run_proxy(
    request: ProxyRequest,
    config: &Config,
    forwarder: &dyn Forwarder,
) -> Result<i32> {
    let (inline_flags, gh_args) = split_installation_flags(request.args);
    let flags = request.leading_flags.merge(inline_flags);

    let flag_override =
        InstallationOverride::from_raw(flags.installation_id.as_deref(), flags.org.as_deref());
    let env_override = InstallationOverride::from_raw(
        request.env_installation_id.as_deref(),
        request.env_org.as_deref(),
    );

    let api_url = config.effective_api_url(request.env_api_url.as_deref())?;
    let key = load_private_key(&config.private_key_path)?;
    let assertion = sign_app_assertion(config.app_id, &key)?;
    let client = GitHubAppClient::new(&api_url, assertion)?;

    let inputs = ResolutionInputs {
        flag: &flag_override,
        env: &env_override,
        config_id: config.installation_id,
    };
    let installation_id = resolve_installation(&client, &inputs).await?;

    let token = client.create_installation_token(installation_id).await?;
    debug!(installation_id, expires_at = %token.expires_at, "forwarding to gh");

    forward_with(
        forwarder,
        &gh_args,
        &token.value,
        request.path_var.as_deref(),
        request.environment,
    )
}
