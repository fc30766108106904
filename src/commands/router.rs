//! Command parsing and routing for Parley.
//!
//! Parses REPL input into structured commands that can be dispatched to handlers.

use super::help::{USAGE_DROP, USAGE_IMPORT, USAGE_LOGIN, USAGE_TEMPERATURE, USAGE_VISUALIZE};
use super::tokenizer::tokenize;

/// Arguments for the visualize command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualizeArgs {
    /// Table to profile.
    pub table: String,
    /// Explicit (x, y) column pair.
    pub pair: Option<(String, String)>,
    /// Chart kind keyword, validated by the handler.
    pub kind: Option<String>,
}

/// Parsed command from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show help.
    Help,
    /// Exit the REPL.
    Quit,
    /// Show the store schema.
    Schema,
    /// List table names.
    Tables,
    /// Toggle between the query and history views.
    History,
    /// Switch back to the query view.
    Query,
    /// Show (None) or set the sampling temperature.
    Temperature(Option<String>),
    /// Export the last result, optionally to a path.
    Export(Option<String>),
    /// Execute raw SQL through the read-only guard.
    Sql(String),
    /// Import one or more files.
    Import(Vec<String>),
    /// Drop a table.
    Drop(String),
    /// Authenticate for data commands.
    Login(String),
    /// Drop admin rights.
    Logout,
    /// Profile and chart a table.
    Visualize(VisualizeArgs),
    /// Natural language query (not a slash command).
    NaturalLanguage(String),
    /// A known command with bad arguments.
    Invalid { usage: &'static str },
    /// Unknown command.
    Unknown(String),
}

/// Command router for parsing user input.
pub struct CommandRouter;

impl CommandRouter {
    /// Parse user input into a Command.
    pub fn parse(input: &str) -> Command {
        let input = input.trim();

        if !input.starts_with('/') {
            return Command::NaturalLanguage(input.to_string());
        }

        let parts: Vec<&str> = input.splitn(2, char::is_whitespace).collect();
        let command = parts[0].to_lowercase();
        let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

        match command.as_str() {
            "/sql" => Command::Sql(args.to_string()),
            "/help" | "/?" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            "/schema" => Command::Schema,
            "/tables" => Command::Tables,
            "/history" => Command::History,
            "/query" => Command::Query,
            "/logout" => Command::Logout,
            "/temperature" | "/temp" => Self::parse_temperature(args),
            "/export" => Command::Export(tokenize(args).into_iter().next()),
            "/import" => Self::parse_import(args),
            "/drop" => Self::parse_single(args, Command::Drop, USAGE_DROP),
            "/login" => Self::parse_login(args),
            "/visualize" | "/viz" => Self::parse_visualize(args),
            _ => Command::Unknown(command),
        }
    }

    fn parse_temperature(args: &str) -> Command {
        let tokens = tokenize(args);
        match tokens.len() {
            0 => Command::Temperature(None),
            1 => Command::Temperature(tokens.into_iter().next()),
            _ => Command::Invalid {
                usage: USAGE_TEMPERATURE,
            },
        }
    }

    fn parse_import(args: &str) -> Command {
        let paths: Vec<String> = tokenize(args)
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();
        if paths.is_empty() {
            Command::Invalid {
                usage: USAGE_IMPORT,
            }
        } else {
            Command::Import(paths)
        }
    }

    /// Passwords are taken verbatim so they may contain quotes or spaces.
    fn parse_login(args: &str) -> Command {
        if args.is_empty() {
            Command::Invalid { usage: USAGE_LOGIN }
        } else {
            Command::Login(args.to_string())
        }
    }

    fn parse_single(args: &str, make: fn(String) -> Command, usage: &'static str) -> Command {
        let mut tokens = tokenize(args).into_iter();
        match (tokens.next(), tokens.next()) {
            (Some(value), None) if !value.is_empty() => make(value),
            _ => Command::Invalid { usage },
        }
    }

    /// `<table> [x y] [kind]`: an odd number of trailing words means the
    /// last one is the chart kind.
    fn parse_visualize(args: &str) -> Command {
        let mut tokens = tokenize(args);
        if tokens.is_empty() || tokens[0].is_empty() {
            return Command::Invalid {
                usage: USAGE_VISUALIZE,
            };
        }

        let table = tokens.remove(0);
        let kind = if tokens.len() % 2 == 1 {
            tokens.pop()
        } else {
            None
        };

        let pair = match tokens.len() {
            0 => None,
            2 => {
                let y = tokens.pop().unwrap_or_default();
                let x = tokens.pop().unwrap_or_default();
                Some((x, y))
            }
            _ => {
                return Command::Invalid {
                    usage: USAGE_VISUALIZE,
                }
            }
        };

        Command::Visualize(VisualizeArgs { table, pair, kind })
    }
}
