//! Error types for gha

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while authenticating as a GitHub App and forwarding to gh
#[derive(Error, Debug)]
pub enum Error {
    /// No configuration file has been written yet
    #[error("configuration not found - run 'gha configure' first")]
    ConfigNotFound,

    /// Configuration exists but is unreadable or invalid
    #[error("config error: {0}")]
    Config(String),

    /// Private key file could not be read
    #[error("reading private key {}: {source}", path.display())]
    KeyRead {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// No PEM block could be decoded from the key file
    #[error("failed to decode PEM block from {}: {reason}", path.display())]
    KeyDecode {
        /// Path of the key file
        path: PathBuf,
        /// Why decoding failed
        reason: String,
    },

    /// A PEM block was decoded but does not hold an RSA private key
    #[error("unusable private key in {}: {reason}", path.display())]
    KeyFormat {
        /// Path of the key file
        path: PathBuf,
        /// Why the key was rejected
        reason: String,
    },

    /// The app assertion could not be signed
    #[error("signing JWT: {0}")]
    Signing(String),

    /// `--org` / `GHA_ORG` named an account the app is not installed on
    #[error("no installation found for org {org:?}, available:\n{}", format_candidates(available))]
    InstallationNotFound {
        /// Requested account login
        org: String,
        /// Every `(id, login)` the app is installed on
        available: Vec<(u64, String)>,
    },

    /// The app is not installed anywhere
    #[error("no installations found for this GitHub App")]
    NoInstallations,

    /// Auto-detection found more than one installation
    #[error(
        "multiple installations found, pass --installation-id or --org, or set installation_id in config:\n{}",
        format_candidates(candidates)
    )]
    AmbiguousInstallation {
        /// Every `(id, login)` the app is installed on
        candidates: Vec<(u64, String)>,
    },

    /// Network failure, timeout, oversized or unparseable response
    #[error("GitHub API request failed: {0}")]
    Transport(String),

    /// GitHub rejected the request
    #[error("GitHub API error (HTTP {status}): {body}")]
    Authority {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// GitHub answered with an empty installation token
    #[error("GitHub returned an empty installation token")]
    EmptyToken,

    /// Token handed to the forwarder was blank
    #[error("token must not be empty")]
    InvalidToken,

    /// Target executable is not on PATH
    #[error("{0} CLI not found in PATH - install it from https://cli.github.com")]
    ExecutableNotFound(String),

    /// Launching the child process failed
    #[error("running {}: {source}", program.display())]
    Forward {
        /// Resolved executable path
        program: PathBuf,
        /// Underlying launch failure
        source: std::io::Error,
    },

    /// Interactive prompt failed
    #[error("prompt failed: {0}")]
    Prompt(String),
}

fn format_candidates(candidates: &[(u64, String)]) -> String {
    candidates
        .iter()
        .map(|(id, login)| format!("  {id} ({login})"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_lists_every_candidate() {
        let err = Error::AmbiguousInstallation {
            candidates: vec![(111, "org-a".to_string()), (222, "org-b".to_string())],
        };
        let msg = err.to_string();
        assert!(msg.contains("  111 (org-a)"));
        assert!(msg.contains("  222 (org-b)"));
    }

    #[test]
    fn test_not_found_names_org_and_choices() {
        let err = Error::InstallationNotFound {
            org: "missing".to_string(),
            available: vec![(7, "present".to_string())],
        };
        let msg = err.to_string();
        assert!(msg.contains("\"missing\""));
        assert!(msg.contains("7 (present)"));
    }

    #[test]
    fn test_authority_carries_status_and_body() {
        let err = Error::Authority {
            status: 401,
            body: "Bad credentials".to_string(),
        };
        assert_eq!(err.to_string(), "GitHub API error (HTTP 401): Bad credentials");
    }
}
