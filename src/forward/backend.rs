//! Process launch backends

use super::{Forwarder, Launch};
use crate::error::{Error, Result};
use std::process::{Command, ExitStatus};
use tracing::debug;

fn command(launch: &Launch) -> Command {
    let mut cmd = Command::new(&launch.program);
    cmd.args(&launch.args)
        .env_clear()
        .envs(launch.env.iter().map(|(k, v)| (k, v)));
    cmd
}

/// Spawn the child, wait for it, and report its exit status
#[derive(Debug, Clone, Copy, Default)]
pub struct SpawnForwarder;

impl Forwarder for SpawnForwarder {
    fn forward(&self, launch: &Launch) -> Result<i32> {
        debug!(program = %launch.program.display(), "spawning");
        let status = command(launch).status().map_err(|source| Error::Forward {
            program: launch.program.clone(),
            source,
        })?;
        Ok(exit_code(status))
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

/// Replace the current process image with the child
///
/// Signals and the exit status reach the caller directly since no parent
/// process is left in between.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecForwarder;

#[cfg(unix)]
impl Forwarder for ExecForwarder {
    fn forward(&self, launch: &Launch) -> Result<i32> {
        use std::os::unix::process::CommandExt;

        debug!(program = %launch.program.display(), "exec");
        let source = command(launch).exec();
        Err(Error::Forward {
            program: launch.program.clone(),
            source,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn script(dir: &Path, body: &str) -> Launch {
        let program = dir.join("gh");
        fs::write(&program, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();
        Launch {
            program,
            args: Vec::new(),
            env: vec![(OsString::from("GH_TOKEN"), OsString::from("tok"))],
        }
    }

    #[test]
    fn test_spawn_propagates_exit_code() {
        let dir = tempfile::TempDir::new().unwrap();
        let launch = script(dir.path(), "exit 7");
        assert_eq!(SpawnForwarder.forward(&launch).unwrap(), 7);
    }

    #[test]
    fn test_spawn_zero_exit() {
        let dir = tempfile::TempDir::new().unwrap();
        let launch = script(dir.path(), "exit 0");
        assert_eq!(SpawnForwarder.forward(&launch).unwrap(), 0);
    }

    #[test]
    fn test_spawn_signal_maps_to_128_plus() {
        let dir = tempfile::TempDir::new().unwrap();
        let launch = script(dir.path(), "kill -TERM $$");
        assert_eq!(SpawnForwarder.forward(&launch).unwrap(), 128 + 15);
    }

    #[test]
    fn test_spawn_passes_args_and_env_verbatim() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("out.txt");
        let mut launch = script(
            dir.path(),
            &format!(
                "printf '%s\\n' \"$GH_TOKEN\" \"$@\" > '{}'\nprintf '%s' \"${{HOME-unset}}\" >> '{}'",
                out.display(),
                out.display()
            ),
        );
        launch.args = ["pr", "list", "--repo", "org/repo", "a b"]
            .iter()
            .map(OsString::from)
            .collect();

        SpawnForwarder.forward(&launch).unwrap();

        let written = fs::read_to_string(&out).unwrap();
        assert_eq!(written, "tok\npr\nlist\n--repo\norg/repo\na b\nunset");
    }

    #[test]
    fn test_spawn_missing_program_is_forward_error() {
        let launch = Launch {
            program: Path::new("/nonexistent/gh").to_path_buf(),
            args: Vec::new(),
            env: Vec::new(),
        };
        assert!(matches!(
            SpawnForwarder.forward(&launch),
            Err(Error::Forward { .. })
        ));
    }
}
