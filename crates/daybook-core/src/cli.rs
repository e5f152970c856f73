use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "daybook",
    version,
    about = "Daybook: a task list with due dates and a month calendar",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a task, optionally due on a YYYY-MM-DD date.
    Add {
        #[arg(long = "due")]
        due: Option<String>,

        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Toggle completion of the task at a list position.
    Done { position: usize },
    /// Delete the task at a list position.
    Delete { position: usize },
    /// Switch to the list view and print it.
    List,
    /// Switch to the calendar view and print it.
    Calendar {
        /// Jump to a YYYY-MM month first.
        #[arg(long = "month")]
        month: Option<String>,
    },
    /// Show the previous month.
    Prev,
    /// Show the next month.
    Next,
    /// Narrow the calendar panel to one YYYY-MM-DD day.
    Select { date: String },
    /// Show every task in the calendar panel again.
    All,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_with_due_date_and_globals() {
        let cli = GlobalCli::try_parse_from([
            "daybook",
            "-v",
            "--rc",
            "data.seed=off",
            "add",
            "--due",
            "2023-10-20",
            "Call",
            "mom",
        ])
        .expect("parse args");

        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.rc_overrides.len(), 1);
        assert_eq!(cli.rc_overrides[0].key, "data.seed");
        assert_eq!(
            cli.command,
            Some(Command::Add {
                due: Some("2023-10-20".to_string()),
                text: vec!["Call".to_string(), "mom".to_string()],
            })
        );
    }

    #[test]
    fn due_flag_may_follow_the_text() {
        let cli = GlobalCli::try_parse_from([
            "daybook", "add", "Call", "mom", "--due", "2023-10-20",
        ])
        .expect("parse args");

        assert_eq!(
            cli.command,
            Some(Command::Add {
                due: Some("2023-10-20".to_string()),
                text: vec!["Call".to_string(), "mom".to_string()],
            })
        );
    }

    #[test]
    fn no_command_is_allowed() {
        let cli = GlobalCli::try_parse_from(["daybook", "-q"]).expect("parse args");
        assert_eq!(cli.quiet, 1);
        assert!(cli.command.is_none());
    }

    #[test]
    fn rejects_malformed_overrides() {
        assert!(GlobalCli::try_parse_from(["daybook", "--rc", "novalue", "list"]).is_err());
    }
}
