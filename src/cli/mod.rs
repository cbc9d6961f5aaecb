//! CLI command implementations

pub mod args;
pub mod configure;
pub mod proxy;
pub mod style;

pub use args::RawInstallationFlags;
pub use configure::{LinePrompter, TerminalPrompter, print_saved, run_configure};
pub use proxy::{ProxyRequest, run_proxy};
