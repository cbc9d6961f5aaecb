//! Stripping installation-selection flags from forwarded arguments

use std::ffi::OsString;

const INSTALLATION_ID_FLAG: &str = "--installation-id";
const ORG_FLAG: &str = "--org";

/// Raw `--installation-id` / `--org` values, not yet validated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInstallationFlags {
    /// Last `--installation-id` value seen
    pub installation_id: Option<String>,
    /// Last `--org` value seen
    pub org: Option<String>,
}

impl RawInstallationFlags {
    /// Overlay `later` on top of `self`; values in `later` win
    pub fn merge(self, later: Self) -> Self {
        Self {
            installation_id: later.installation_id.or(self.installation_id),
            org: later.org.or(self.org),
        }
    }
}

/// Pull `--installation-id` and `--org` (both `--flag value` and
/// `--flag=value`) out of `args`, returning them and everything else in the
/// original order.
///
/// A flag in last position with no value is left in place for gh to reject.
pub fn split_installation_flags(args: Vec<OsString>) -> (RawInstallationFlags, Vec<OsString>) {
    let mut flags = RawInstallationFlags::default();
    let mut remaining = Vec::with_capacity(args.len());
    let mut iter = args.into_iter().peekable();

    while let Some(arg) = iter.next() {
        let Some(text) = arg.to_str() else {
            remaining.push(arg);
            continue;
        };

        let slot = match text.split_once('=') {
            Some((INSTALLATION_ID_FLAG, value)) => {
                flags.installation_id = Some(value.to_string());
                continue;
            }
            Some((ORG_FLAG, value)) => {
                flags.org = Some(value.to_string());
                continue;
            }
            _ if text == INSTALLATION_ID_FLAG => &mut flags.installation_id,
            _ if text == ORG_FLAG => &mut flags.org,
            _ => {
                remaining.push(arg);
                continue;
            }
        };

        match iter.next() {
            Some(value) => *slot = Some(value.to_string_lossy().into_owned()),
            None => remaining.push(arg),
        }
    }

    (flags, remaining)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_no_flags_passes_everything_through() {
        let (flags, rest) = split_installation_flags(os(&["pr", "list", "--repo", "o/r"]));
        assert_eq!(flags, RawInstallationFlags::default());
        assert_eq!(rest, os(&["pr", "list", "--repo", "o/r"]));
    }

    #[test]
    fn test_space_and_equals_forms() {
        let (flags, rest) =
            split_installation_flags(os(&["--installation-id", "123", "pr", "--org=acme", "list"]));
        assert_eq!(flags.installation_id.as_deref(), Some("123"));
        assert_eq!(flags.org.as_deref(), Some("acme"));
        assert_eq!(rest, os(&["pr", "list"]));
    }

    #[test]
    fn test_flags_after_subcommand_are_stripped() {
        let (flags, rest) = split_installation_flags(os(&["repo", "list", "--org", "acme"]));
        assert_eq!(flags.org.as_deref(), Some("acme"));
        assert_eq!(rest, os(&["repo", "list"]));
    }

    #[test]
    fn test_malformed_id_is_still_consumed() {
        let (flags, rest) = split_installation_flags(os(&["--installation-id", "abc", "pr"]));
        assert_eq!(flags.installation_id.as_deref(), Some("abc"));
        assert_eq!(rest, os(&["pr"]));
    }

    #[test]
    fn test_trailing_flag_without_value_is_kept() {
        let (flags, rest) = split_installation_flags(os(&["pr", "--org"]));
        assert_eq!(flags.org, None);
        assert_eq!(rest, os(&["pr", "--org"]));
    }

    #[test]
    fn test_later_occurrence_wins() {
        let (flags, _) = split_installation_flags(os(&["--org", "a", "--org=b"]));
        assert_eq!(flags.org.as_deref(), Some("b"));
    }

    #[test]
    fn test_similar_flags_untouched() {
        let (flags, rest) = split_installation_flags(os(&["--organization", "x", "--org-id=1"]));
        assert_eq!(flags, RawInstallationFlags::default());
        assert_eq!(rest, os(&["--organization", "x", "--org-id=1"]));
    }

    #[test]
    fn test_merge_prefers_later() {
        let early = RawInstallationFlags {
            installation_id: Some("1".to_string()),
            org: Some("a".to_string()),
        };
        let late = RawInstallationFlags {
            installation_id: None,
            org: Some("b".to_string()),
        };
        let merged = early.merge(late);
        assert_eq!(merged.installation_id.as_deref(), Some("1"));
        assert_eq!(merged.org.as_deref(), Some("b"));
    }
}
