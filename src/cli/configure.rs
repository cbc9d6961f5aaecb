//! Configure command - interactively write GitHub App credentials

use anstream::eprintln;
use dialoguer::Input;
use gha::auth::load_private_key;
use gha::config::{Config, save_config_to};
use gha::error::{Error, Result};
use gha::resolve::parse_positive_id;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Source of answers for the configure prompts
pub trait Prompter {
    /// Show `label` and return the trimmed answer
    fn prompt(&mut self, label: &str) -> Result<String>;
}

/// Prompts on the terminal via dialoguer
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt(&mut self, label: &str) -> Result<String> {
        let answer: String = Input::new()
            .with_prompt(label)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| Error::Prompt(e.to_string()))?;
        Ok(answer.trim().to_string())
    }
}

/// Reads answers line by line, for piped input
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    /// Read answers from `input`, echoing prompts to `output`
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn prompt(&mut self, label: &str) -> Result<String> {
        write!(self.output, "{label}: ")
            .and_then(|()| self.output.flush())
            .map_err(|e| Error::Prompt(e.to_string()))?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| Error::Prompt(e.to_string()))?;
        if read == 0 {
            return Err(Error::Prompt("unexpected end of input".to_string()));
        }
        Ok(line.trim().to_string())
    }
}

/// Ask for credentials, validate them and save to `config_dir`.
///
/// Returns the path written.
pub fn run_configure(prompter: &mut dyn Prompter, config_dir: &Path, home: Option<&Path>) -> Result<PathBuf> {
    let app_id_raw = prompter.prompt("GitHub App ID")?;
    let app_id = parse_positive_id(&app_id_raw).ok_or_else(|| {
        Error::Config(format!(
            "invalid App ID {app_id_raw:?}: must be a positive integer"
        ))
    })?;

    let installation_raw = prompter.prompt("Installation ID (empty to auto-detect)")?;
    let installation_id = if installation_raw.is_empty() {
        0
    } else {
        parse_positive_id(&installation_raw).ok_or_else(|| {
            Error::Config(format!(
                "invalid Installation ID {installation_raw:?}: must be a positive integer"
            ))
        })?
    };

    let key_raw = prompter.prompt("Private Key Path")?;
    if key_raw.is_empty() {
        return Err(Error::Config(
            "private key path must not be empty".to_string(),
        ));
    }
    let private_key_path = expand_home(&key_raw, home);

    let metadata = std::fs::metadata(&private_key_path).map_err(|e| {
        Error::Config(format!(
            "private key file {}: {e}",
            private_key_path.display()
        ))
    })?;
    if !metadata.is_file() {
        return Err(Error::Config(format!(
            "private key path is not a regular file: {}",
            private_key_path.display()
        )));
    }
    load_private_key(&private_key_path)?;

    let config = Config {
        app_id,
        installation_id,
        private_key_path,
        api_url: None,
    };
    save_config_to(config_dir, &config)
}

/// Expand a leading `~/` against `home`.
fn expand_home(raw: &str, home: Option<&Path>) -> PathBuf {
    match (raw.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

/// Report where the configuration went
pub fn print_saved(path: &Path) {
    eprintln!("Configuration saved to {}", path.display());
}
