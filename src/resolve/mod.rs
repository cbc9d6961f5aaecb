//! Installation resolution
//!
//! Picks the installation to act as. Sources are consulted in a fixed order
//! and the first one that yields a value wins:
//!
//! 1. `--installation-id` flag
//! 2. `--org` flag
//! 3. `GHA_INSTALLATION_ID`
//! 4. `GHA_ORG`
//! 5. `installation_id` in config (non-zero)
//! 6. auto-detect (exactly one installation)
//!
//! Selection is pure ([`select_installation`]); only org lookups and
//! auto-detection touch the network, through an [`InstallationSource`].

use crate::error::{Error, Result};
use crate::platform::InstallationSource;
use tracing::debug;

/// Environment variable holding a numeric installation override
pub const ENV_INSTALLATION_ID: &str = "GHA_INSTALLATION_ID";

/// Environment variable holding an org/user login override
pub const ENV_ORG: &str = "GHA_ORG";

/// Per-invocation installation selection from one source tier (flags or env)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallationOverride {
    /// Explicit installation ID
    pub id: Option<u64>,
    /// Account login to look up
    pub org: Option<String>,
}

impl InstallationOverride {
    /// Build an override from raw, unvalidated strings.
    ///
    /// A malformed or non-positive ID is dropped rather than rejected so a
    /// lower tier still gets a chance. A blank org counts as absent.
    pub fn from_raw(id: Option<&str>, org: Option<&str>) -> Self {
        Self {
            id: id.and_then(parse_positive_id),
            org: org.map(str::trim).filter(|o| !o.is_empty()).map(String::from),
        }
    }

    /// Whether neither field is set
    pub const fn is_empty(&self) -> bool {
        self.id.is_none() && self.org.is_none()
    }
}

/// Parse a positive app or installation ID, `None` for anything else
pub fn parse_positive_id(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().filter(|id| *id > 0)
}

/// Which tier produced the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    /// Command-line flag
    Flag,
    /// Environment variable
    Env,
    /// Persisted configuration
    Config,
    /// Nothing was configured; ask the API
    AutoDetect,
}

impl std::fmt::Display for SelectionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flag => write!(f, "flag"),
            Self::Env => write!(f, "env"),
            Self::Config => write!(f, "config"),
            Self::AutoDetect => write!(f, "auto-detect"),
        }
    }
}

/// What the winning tier asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Use this installation ID directly
    Id(u64),
    /// Look up the installation whose account login matches
    Org(String),
    /// Use the only installation there is
    AutoDetect,
}

/// Everything resolution reads, already parsed
#[derive(Debug, Clone, Copy)]
pub struct ResolutionInputs<'a> {
    /// Overrides from command-line flags
    pub flag: &'a InstallationOverride,
    /// Overrides from environment variables
    pub env: &'a InstallationOverride,
    /// `installation_id` from config, 0 when unset
    pub config_id: u64,
}

type Lookup = fn(&ResolutionInputs<'_>) -> Option<Selection>;

fn flag_id(inputs: &ResolutionInputs<'_>) -> Option<Selection> {
    inputs.flag.id.map(Selection::Id)
}

fn flag_org(inputs: &ResolutionInputs<'_>) -> Option<Selection> {
    inputs.flag.org.clone().map(Selection::Org)
}

fn env_id(inputs: &ResolutionInputs<'_>) -> Option<Selection> {
    inputs.env.id.map(Selection::Id)
}

fn env_org(inputs: &ResolutionInputs<'_>) -> Option<Selection> {
    inputs.env.org.clone().map(Selection::Org)
}

fn config_id(inputs: &ResolutionInputs<'_>) -> Option<Selection> {
    (inputs.config_id > 0).then_some(Selection::Id(inputs.config_id))
}

/// Lookups in priority order. IDs beat orgs within a tier.
const PRECEDENCE: &[(SelectionSource, Lookup)] = &[
    (SelectionSource::Flag, flag_id),
    (SelectionSource::Flag, flag_org),
    (SelectionSource::Env, env_id),
    (SelectionSource::Env, env_org),
    (SelectionSource::Config, config_id),
];

/// Walk the precedence chain and return the first selection found.
pub fn select_installation(inputs: &ResolutionInputs<'_>) -> (SelectionSource, Selection) {
    PRECEDENCE
        .iter()
        .find_map(|(source, lookup)| lookup(inputs).map(|selection| (*source, selection)))
        .unwrap_or((SelectionSource::AutoDetect, Selection::AutoDetect))
}

/// Resolve the installation ID to exchange the assertion against.
pub async fn resolve_installation(
    source: &dyn InstallationSource,
    inputs: &ResolutionInputs<'_>,
) -> Result<u64> {
    let (from, selection) = select_installation(inputs);
    debug!(source = %from, ?selection, "selected installation");

    match selection {
        Selection::Id(id) => Ok(id),
        Selection::Org(org) => find_installation_by_org(source, &org).await,
        Selection::AutoDetect => detect_installation(source).await,
    }
}

/// Find the installation whose account login matches `org`, ignoring case.
pub async fn find_installation_by_org(source: &dyn InstallationSource, org: &str) -> Result<u64> {
    let installations = source.list_installations().await?;

    if let Some(inst) = installations
        .iter()
        .find(|inst| inst.account_login.eq_ignore_ascii_case(org))
    {
        debug!(org, installation_id = inst.id, "resolved installation by org");
        return Ok(inst.id);
    }

    Err(Error::InstallationNotFound {
        org: org.to_string(),
        available: installations
            .into_iter()
            .map(|inst| (inst.id, inst.account_login))
            .collect(),
    })
}

/// Use the app's only installation.
pub async fn detect_installation(source: &dyn InstallationSource) -> Result<u64> {
    let installations = source.list_installations().await?;

    match installations.as_slice() {
        [] => Err(Error::NoInstallations),
        [only] => {
            debug!(installation_id = only.id, "auto-detected installation");
            Ok(only.id)
        }
        _ => Err(Error::AmbiguousInstallation {
            candidates: installations
                .into_iter()
                .map(|inst| (inst.id, inst.account_login))
                .collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positive_id() {
        assert_eq!(parse_positive_id("12345"), Some(12345));
        assert_eq!(parse_positive_id("0"), None);
        assert_eq!(parse_positive_id("-5"), None);
        assert_eq!(parse_positive_id("abc"), None);
        assert_eq!(parse_positive_id(""), None);
        assert_eq!(parse_positive_id("12x"), None);
    }

    #[test]
    fn test_from_raw_drops_malformed_id_and_empty_org() {
        let o = InstallationOverride::from_raw(Some("not-a-number"), Some(""));
        assert!(o.is_empty());

        let o = InstallationOverride::from_raw(Some("42"), Some("acme"));
        assert_eq!(o.id, Some(42));
        assert_eq!(o.org.as_deref(), Some("acme"));
    }

    #[test]
    fn test_flag_id_beats_flag_org() {
        let flag = InstallationOverride {
            id: Some(1),
            org: Some("acme".to_string()),
        };
        let env = InstallationOverride::default();
        let inputs = ResolutionInputs {
            flag: &flag,
            env: &env,
            config_id: 9,
        };
        assert_eq!(
            select_installation(&inputs),
            (SelectionSource::Flag, Selection::Id(1))
        );
    }

    #[test]
    fn test_env_org_beats_config() {
        let flag = InstallationOverride::default();
        let env = InstallationOverride::from_raw(Some("zero?"), Some("acme"));
        let inputs = ResolutionInputs {
            flag: &flag,
            env: &env,
            config_id: 9,
        };
        assert_eq!(
            select_installation(&inputs),
            (SelectionSource::Env, Selection::Org("acme".to_string()))
        );
    }

    #[test]
    fn test_nothing_set_falls_to_auto_detect() {
        let empty = InstallationOverride::default();
        let inputs = ResolutionInputs {
            flag: &empty,
            env: &empty,
            config_id: 0,
        };
        assert_eq!(
            select_installation(&inputs),
            (SelectionSource::AutoDetect, Selection::AutoDetect)
        );
    }
}
