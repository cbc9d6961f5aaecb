//! Terminal styling for diagnostics on stderr

use anstream::eprintln;
use gha::update::UpdateNotice;
use owo_colors::OwoColorize;

/// Print an error the way every failing command reports it
pub fn print_error(err: &dyn std::fmt::Display) {
    eprintln!("{} {err}", "error:".red().bold());
}

/// Print an update notice
pub fn print_update_notice(notice: &UpdateNotice) {
    eprintln!("{}", notice.to_string().yellow());
}
