//! gha - run gh commands authenticated as a GitHub App installation

mod cli;

use clap::{CommandFactory, Parser, Subcommand};
use cli::style::{print_error, print_update_notice};
use cli::args::split_installation_flags;
use cli::{LinePrompter, ProxyRequest, RawInstallationFlags, TerminalPrompter};
use gha::config::{config_dir, load_config};
use gha::error::Result;
use gha::forward::DefaultForwarder;
use gha::update::{ENV_NO_UPDATE_CHECK, RELEASE_URL, check_for_update};
use std::ffi::OsString;
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const ENV_LOG: &str = "GHA_LOG";

const AFTER_HELP: &str = "\
Installation Flags (accepted anywhere on the command line):
  --installation-id <ID>  Use a specific installation (overrides config and env)
  --org <LOGIN>           Resolve the installation by org/user login

Environment Variables:
  GHA_INSTALLATION_ID   Installation ID (overrides config, overridden by flags)
  GHA_ORG               Org/user name to resolve (overrides config, overridden by flags)
  GHA_API_URL           GitHub API root (for GitHub Enterprise Server)
  GHA_LOG               Log filter, e.g. debug

Resolution Order (highest to lowest precedence):
  1. --installation-id / --org flag
  2. GHA_INSTALLATION_ID / GHA_ORG environment variable
  3. installation_id in config.toml
  4. Auto-detect (works only with a single installation)

Examples:
  gha configure
  gha pr list
  gha --org myorg repo list
  gha --installation-id 12345 issue create --title \"Bug\"
  GHA_ORG=myorg gha pr list";

/// Proxy gh commands with GitHub App authentication
#[derive(Parser)]
#[command(
    name = "gha",
    version,
    about = "Proxy gh commands with GitHub App authentication",
    override_usage = "gha configure\n       gha [--installation-id <ID>] [--org <LOGIN>] <gh subcommand>...",
    after_help = AFTER_HELP,
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up GitHub App credentials
    Configure,

    #[command(external_subcommand)]
    Gh(Vec<OsString>),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    // Installation flags are read leniently wherever they appear, so they
    // never reach clap
    let mut argv = std::env::args_os();
    let program = argv.next().unwrap_or_else(|| OsString::from("gha"));
    let (leading_flags, rest) = split_installation_flags(argv.collect());

    let cli = match Cli::try_parse_from(std::iter::once(program).chain(rest)) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let result = match cli.command {
        Some(Commands::Configure) => configure().map(|()| 0),
        Some(Commands::Gh(args)) => proxy(leading_flags, args).await,
        None => {
            let _ = Cli::command().print_help();
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => {
            // gh's status is passed through untouched, even beyond u8 on Windows
            std::process::exit(code)
        }
        Err(e) => {
            print_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn configure() -> Result<()> {
    let dir = config_dir()?;
    let home = dirs::home_dir();
    let path = if std::io::stdin().is_terminal() {
        cli::run_configure(&mut TerminalPrompter, &dir, home.as_deref())?
    } else {
        let mut prompter = LinePrompter::new(std::io::stdin().lock(), std::io::stderr());
        cli::run_configure(&mut prompter, &dir, home.as_deref())?
    };
    cli::print_saved(&path);
    Ok(())
}

async fn proxy(leading_flags: RawInstallationFlags, args: Vec<OsString>) -> Result<i32> {
    notify_update().await;

    let config = load_config()?;
    let request = ProxyRequest::from_env(leading_flags, args);
    cli::run_proxy(request, &config, &DefaultForwarder::default()).await
}

async fn notify_update() {
    if std::env::var_os(ENV_NO_UPDATE_CHECK).is_some_and(|v| !v.is_empty()) {
        return;
    }
    let Ok(dir) = config_dir() else {
        return;
    };
    if let Some(notice) = check_for_update(env!("CARGO_PKG_VERSION"), &dir, RELEASE_URL).await {
        print_update_notice(&notice);
    }
}
