//! Shell commands and events
//!
//! Every user control maps to a [`Command`]; asynchronous completions
//! arrive as [`ShellEvent`]s. The state machine only ever sees these two.

use std::str::FromStr;

use thiserror::Error;

use crate::loading::{LoadOutcome, LoadTicket};
use crate::session::TabId;

/// User controls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create-tab control
    NewTab,
    /// Per-tab close control
    CloseTab(TabId),
    /// Per-tab select control
    SwitchTab(TabId),
    /// Home view search form (honours stealth)
    Search(String),
    /// Address bar Enter
    Open(String),
    /// Stealth checkbox
    Stealth(bool),
    Back,
    Forward,
    Reload,
    Home,
    /// Print the chrome
    Tabs,
    Help,
    Quit,
}

/// Asynchronous events delivered to the shell loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    /// The render surface finished a load
    LoadComplete {
        tab: TabId,
        ticket: LoadTicket,
        outcome: LoadOutcome,
    },
    /// The fallback timer for a load elapsed
    LoadTimeout { tab: TabId, ticket: LoadTicket },
}

/// Command parse errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0} (try 'help')")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("Invalid tab id: {0}")]
    InvalidTabId(String),

    #[error("Expected 'on' or 'off', got: {0}")]
    InvalidToggle(String),
}

/// Usage text for the `help` command
pub const HELP: &str = "\
Commands:
  new               open a new tab
  close <id>        close a tab
  switch <id>       show a tab
  go <text>         search or open from the home view (uses stealth if on)
  open <text>       open from the address bar
  stealth on|off    toggle stealth mode for the active tab
  back | forward    move through the active tab's history
  reload            reload the active tab
  home              show the active tab's home view
  tabs              show the tab bar
  help              show this help
  quit              exit";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "new" | "t" => Ok(Command::NewTab),
            "close" | "x" => parse_tab_id(rest, "close").map(Command::CloseTab),
            "switch" | "s" => parse_tab_id(rest, "switch").map(Command::SwitchTab),
            "go" | "g" => require(rest, "go").map(Command::Search),
            "open" | "o" => require(rest, "open").map(Command::Open),
            "stealth" => match rest.to_ascii_lowercase().as_str() {
                "on" => Ok(Command::Stealth(true)),
                "off" => Ok(Command::Stealth(false)),
                "" => Err(CommandError::MissingArgument("stealth")),
                other => Err(CommandError::InvalidToggle(other.to_string())),
            },
            "back" | "b" => Ok(Command::Back),
            "forward" | "f" => Ok(Command::Forward),
            "reload" | "r" => Ok(Command::Reload),
            "home" => Ok(Command::Home),
            "tabs" | "" => Ok(Command::Tabs),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn require(rest: &str, command: &'static str) -> Result<String, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument(command))
    } else {
        Ok(rest.to_string())
    }
}

fn parse_tab_id(rest: &str, command: &'static str) -> Result<TabId, CommandError> {
    let arg = require(rest, command)?;
    arg.parse::<u32>()
        .map(TabId)
        .map_err(|_| CommandError::InvalidTabId(arg))
}
