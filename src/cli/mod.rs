//! One-shot command line front end: `credit_tracker_cli <command> [args]`.

pub mod commands;
pub mod output;

use std::env;

use credit_config::{Config, ConfigManager};
use credit_core::{ClockService, SystemClock};
use credit_storage_json::JsonGateway;
use tracing::debug;

use crate::{utils, Session, TrackerError};

pub type CommandResult = Result<(), TrackerError>;
pub type CommandHandler = fn(&mut CliContext, &[&str]) -> CommandResult;

/// Name, help text and handler of one CLI command.
#[derive(Clone)]
pub struct CommandEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandEntry {
    pub fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            entries: commands::definitions(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        let name = name.to_ascii_lowercase();
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn list(&self) -> &[CommandEntry] {
        &self.entries
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a command handler may touch.
pub struct CliContext {
    pub session: Session,
    pub config: Config,
    pub config_manager: ConfigManager,
}

impl CliContext {
    /// Loads config from the tracker home and opens the ledger document.
    pub fn open() -> Result<Self, TrackerError> {
        let override_home = utils::home_override();
        let home = override_home.clone().unwrap_or_else(Config::default_home);
        let config_manager = ConfigManager::in_home(&home);
        let config = config_manager.load()?;
        output::set_color_enabled(config.ui_color_enabled && env::var_os("NO_COLOR").is_none());

        let data_dir = config.resolve_data_dir(override_home.as_deref(), &home);
        let initial_clock = ClockService::initial_state(&SystemClock, config.clock_offset_years)?;
        let gateway = JsonGateway::in_dir(&data_dir, initial_clock)?;
        debug!(path = %gateway.path().display(), "ledger document opened");

        let session =
            Session::new(Box::new(gateway))?.with_horizon_years(config.forecast_horizon_years);
        Ok(Self {
            session,
            config,
            config_manager,
        })
    }
}

/// Runs the command named by the process arguments.
pub fn run_cli() -> CommandResult {
    let args: Vec<String> = env::args().skip(1).collect();
    run(&args)
}

pub fn run(args: &[String]) -> CommandResult {
    let registry = CommandRegistry::new();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let Some((name, rest)) = args.split_first() else {
        commands::print_overview(&registry);
        return Ok(());
    };
    if matches!(*name, "help" | "--help" | "-h") {
        match rest.first().and_then(|topic| registry.get(topic)) {
            Some(entry) => commands::print_command(entry),
            None => commands::print_overview(&registry),
        }
        return Ok(());
    }
    let entry = registry
        .get(name)
        .ok_or_else(|| TrackerError::Usage(format!("unknown command `{}`; try `help`", name)))?;

    let mut context = CliContext::open()?;
    (entry.handler)(&mut context, rest)
}
