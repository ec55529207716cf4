//! Line-oriented shell over a file-backed ledger.

mod commands;
pub mod console_view;
mod context;
mod io;
pub mod output;
mod registry;
mod shell;

pub use console_view::{summary_lines, ConsoleView};
pub use context::{CliError, CliMode, CommandError, ShellContext};
pub use shell::{run_cli, SCRIPT_ENV};
