use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::protocol::{control_pad, LedgerRecord};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "./inputs.log")]
    ledger_path: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print recorded inputs, oldest first.
    History {
        /// Only show the most recent N records.
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        user: Option<String>,
    },
    /// Per-input and per-user totals.
    Stats,
    /// List the control pad's action ids and labels.
    Controls,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::History { limit, user } => {
            let records = ledger::read_records(&cli.ledger_path)?;
            for record in select_history(records, user.as_deref(), limit) {
                println!(
                    "{} {:<16} {}",
                    record.date.to_rfc3339(),
                    record.username,
                    record.input
                );
            }
        }
        Command::Stats => {
            let records = ledger::read_records(&cli.ledger_path)?;
            let summary = ledger::summarize(&records);
            println!("total={}", summary.total);
            for (input, count) in &summary.per_input {
                println!("input {:<8} {count}", input.as_str());
            }
            for (user, count) in &summary.per_user {
                println!("user  {user:<16} {count}");
            }
        }
        Command::Controls => {
            for button in control_pad() {
                println!("{:<20} {}", button.action_id, button.label);
            }
        }
    }

    Ok(())
}

fn select_history(
    records: Vec<LedgerRecord>,
    user: Option<&str>,
    limit: Option<usize>,
) -> Vec<LedgerRecord> {
    let mut selected: Vec<LedgerRecord> = records
        .into_iter()
        .filter(|record| user.map_or(true, |user| record.username == user))
        .collect();
    if let Some(limit) = limit {
        let skip = selected.len().saturating_sub(limit);
        selected.drain(..skip);
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<LedgerRecord> {
        ledger::parse_records(concat!(
            r#"{"date":"2024-03-01T10:00:00Z","username":"alice","input":"UP"}"#,
            "\n",
            r#"{"date":"2024-03-01T10:00:01Z","username":"bob","input":"A"}"#,
            "\n",
            r#"{"date":"2024-03-01T10:00:02Z","username":"alice","input":"DOWN"}"#,
            "\n",
        ))
    }

    #[test]
    fn limit_keeps_most_recent_records() {
        let selected = select_history(records(), None, Some(2));
        let users: Vec<_> = selected.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(users, ["bob", "alice"]);
    }

    #[test]
    fn user_filter_applies_before_limit() {
        let selected = select_history(records(), Some("alice"), Some(5));
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|r| r.username == "alice"));
    }

    #[test]
    fn cli_parses_history_flags() {
        let cli = Cli::parse_from([
            "tools",
            "--ledger-path",
            "/tmp/x.log",
            "history",
            "--limit",
            "3",
        ]);
        assert_eq!(cli.ledger_path, PathBuf::from("/tmp/x.log"));
        assert!(matches!(
            cli.command,
            Command::History {
                limit: Some(3),
                user: None
            }
        ));
    }
}
