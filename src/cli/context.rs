use std::io;

use rustyline::error::ReadlineError;
use strsim::levenshtein;
use thiserror::Error;

use crate::{
    config::{Config, ConfigManager},
    errors::LedgerError,
    ledger::LedgerOptions,
    session::Session,
    storage::{JsonFileStore, StorePaths},
    utils::paths,
    view::InputError,
};

use super::{
    commands,
    console_view::ConsoleView,
    io as cli_io,
    output::{self, OutputPreferences},
    registry::CommandRegistry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

/// Failures reported for a single command; the shell keeps running afterwards.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

/// Failures that end the shell.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Readline(#[from] ReadlineError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Command failed: {0}")]
    Command(String),
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Ledger(inner) => CliError::Ledger(inner),
            other => CliError::Command(other.to_string()),
        }
    }
}

/// Everything one shell run needs: the session, preferences and the command table.
pub struct ShellContext {
    pub(crate) session: Session<JsonFileStore, ConsoleView>,
    pub(crate) config: Config,
    pub(crate) mode: CliMode,
    pub(crate) registry: CommandRegistry,
    pub(crate) running: bool,
}

impl ShellContext {
    /// Opens the ledger stored under the application data directory.
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let config = ConfigManager::with_base_dir(&paths::app_data_dir())?.load_or_init()?;
        Self::with_paths(mode, config, paths::store_paths())
    }

    pub fn with_paths(mode: CliMode, config: Config, paths: StorePaths) -> Result<Self, CliError> {
        output::set_preferences(OutputPreferences {
            plain_mode: !config.ui_color_enabled || std::env::var_os("NO_COLOR").is_some(),
        });
        let store = JsonFileStore::with_retention(paths, config.backup_retention)?;
        let mut session = Session::start(store, LedgerOptions::from(&config), ConsoleView::new())?;
        session.view_mut().set_announce_entries(true);
        Ok(Self {
            session,
            config,
            mode,
            registry: commands::registry(),
            running: true,
        })
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub fn prompt(&self) -> String {
        let snapshot = self.session.ledger().snapshot();
        format!(
            "calories [{} left]> ",
            crate::domain::entry::format_calories(snapshot.remaining)
        )
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, &needle), name))
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, name)) = best {
            if distance <= 3 {
                output::info(format!("Suggestion: `{}`?", name));
            }
        }
    }

    /// Asks before destructive actions; scripts and opted-out users are never asked.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script || !self.config.confirm_destructive {
            return Ok(true);
        }
        cli_io::confirm_action(prompt, false)
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action("Exit shell?", true).map_err(CliError::from)
    }

    /// Prints a command failure. Storage failures end the session; a refused value does not.
    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::info("Use `help` for usage details.");
                Ok(())
            }
            CommandError::Input(err) => {
                output::error(err);
                Ok(())
            }
            CommandError::Dialoguer(err) => {
                output::error(format!("Prompt failed: {err}"));
                Ok(())
            }
            CommandError::Ledger(err @ LedgerError::OutOfRange { .. }) => {
                output::error(err);
                Ok(())
            }
            CommandError::Ledger(err) => Err(CliError::Ledger(err)),
        }
    }
}
