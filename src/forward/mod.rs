//! Forwarding to the gh CLI
//!
//! The child gets the current environment minus every credential variable
//! gh might prefer over ours, plus `GH_TOKEN` set to the freshly minted
//! installation token. How the child is launched is a [`Forwarder`]: on Unix
//! the current process image is replaced, elsewhere the child is spawned and
//! its exit status propagated.

mod backend;

#[cfg(unix)]
pub use backend::ExecForwarder;
pub use backend::SpawnForwarder;

use crate::error::{Error, Result};
use crate::types::SecretString;
use std::env;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use tracing::debug;

/// Executable that commands are forwarded to
pub const TARGET_EXECUTABLE: &str = "gh";

/// Variable the installation token is injected under
pub const TOKEN_VAR: &str = "GH_TOKEN";

/// Name prefixes of variables removed from the child environment
pub const DENIED_ENV_PREFIXES: &[&str] = &[
    "GH_TOKEN",
    "GITHUB_TOKEN",
    "GH_ENTERPRISE_TOKEN",
    "GITHUB_ENTERPRISE_TOKEN",
];

/// Launches a prepared command
pub trait Forwarder {
    /// Run `launch` with inherited stdio and return its exit status.
    ///
    /// Backends that replace the current process only return on failure.
    fn forward(&self, launch: &Launch) -> Result<i32>;
}

/// Backend used when none is chosen explicitly
#[cfg(unix)]
pub type DefaultForwarder = ExecForwarder;

/// Backend used when none is chosen explicitly
#[cfg(not(unix))]
pub type DefaultForwarder = SpawnForwarder;

/// Fully prepared child command
#[derive(Clone)]
pub struct Launch {
    /// Resolved executable path
    pub program: PathBuf,
    /// Arguments, forwarded verbatim
    pub args: Vec<OsString>,
    /// Complete child environment
    pub env: Vec<(OsString, OsString)>,
}

impl std::fmt::Debug for Launch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Launch")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("env_vars", &self.env.len())
            .finish()
    }
}

/// Reject blank tokens; gh would silently run unauthenticated.
pub fn validate_token(token: &str) -> Result<()> {
    if token.trim().is_empty() {
        return Err(Error::InvalidToken);
    }
    Ok(())
}

/// Whether `name` falls under one of [`DENIED_ENV_PREFIXES`]
pub fn is_denied_env_var(name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    // Windows environment names are case-insensitive
    let name = if cfg!(windows) {
        name.to_ascii_uppercase()
    } else {
        name.into_owned()
    };
    DENIED_ENV_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Copy `current` minus denied credential variables, then append the token.
pub fn build_child_env<I>(current: I, token: &str) -> Vec<(OsString, OsString)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut scrubbed = 0usize;
    let mut child_env: Vec<(OsString, OsString)> = current
        .into_iter()
        .filter(|(name, _)| {
            let denied = is_denied_env_var(name);
            scrubbed += usize::from(denied);
            !denied
        })
        .collect();

    debug!(scrubbed, "scrubbed credential variables from child environment");
    child_env.push((OsString::from(TOKEN_VAR), OsString::from(token)));
    child_env
}

/// Locate `name` on the search path given as `path_var`.
///
/// Only executable files match; on Windows `PATHEXT` extensions are tried.
pub fn find_executable(name: &str, path_var: Option<&OsStr>) -> Result<PathBuf> {
    let path_var = path_var.ok_or_else(|| Error::ExecutableNotFound(name.to_string()))?;
    let cwd = env::current_dir().unwrap_or_default();

    let path = which::which_in(name, Some(path_var), cwd).map_err(|e| {
        debug!(error = %e, name, "executable lookup failed");
        Error::ExecutableNotFound(name.to_string())
    })?;
    debug!(path = %path.display(), "found executable");
    Ok(path)
}

/// Validate the token, locate the target and build its environment.
///
/// Nothing is launched; a failure here means nothing ran.
pub fn prepare_launch<I>(
    args: &[OsString],
    token: &SecretString,
    path_var: Option<&OsStr>,
    current_env: I,
) -> Result<Launch>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    validate_token(token.expose())?;
    let program = find_executable(TARGET_EXECUTABLE, path_var)?;
    let env = build_child_env(current_env, token.expose());

    Ok(Launch {
        program,
        args: args.to_vec(),
        env,
    })
}

/// Forward `args` to gh through `backend` and return gh's exit status.
///
/// `path_var` and `current_env` stand in for `PATH` and the process
/// environment.
pub fn forward_with<I>(
    backend: &dyn Forwarder,
    args: &[OsString],
    token: &SecretString,
    path_var: Option<&OsStr>,
    current_env: I,
) -> Result<i32>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let launch = prepare_launch(args, token, path_var, current_env)?;
    backend.forward(&launch)
}
