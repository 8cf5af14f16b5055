use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use ballot_core::{Argon2Hasher, Ballot, Tables};
use ballot_server::{BallotServer, ServerConfig};
use ballot_store::JsonFileStore;
use ballot_types::PollId;
use colored::Colorize;
use serde_json::json;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(cli.config.as_deref(), cli.data_dir)?;
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args),
        Command::Check(_) => cmd_check(&config),
        Command::Polls(_) => cmd_polls(&config, &cli.format),
        Command::Results(args) => cmd_results(&config, &cli.format, args),
    }
}

/// Config file values, or defaults, with command-line overrides applied.
fn resolve_config(path: Option<&Path>, data_dir: Option<PathBuf>) -> anyhow::Result<ServerConfig> {
    let mut config = match path {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }
    Ok(config)
}

/// Open the data directory for the reporting commands. Never writes, so it
/// is safe next to a running server.
fn open_ballot(config: &ServerConfig) -> anyhow::Result<Ballot> {
    let store = JsonFileStore::open(&config.data_dir)
        .with_context(|| format!("opening data directory {}", config.data_dir.display()))?;
    Ok(Ballot::open_read_only(Arc::new(store), Arc::new(Argon2Hasher::new()))?)
}

fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if args.no_seed {
        config.seed_sample_poll = false;
    }
    println!(
        "Ballot server on {} (data: {})",
        config.bind_addr.to_string().bold(),
        config.data_dir.display()
    );
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(BallotServer::new(config).serve())?;
    Ok(())
}

fn cmd_check(config: &ServerConfig) -> anyhow::Result<()> {
    let store = JsonFileStore::open(&config.data_dir)?;
    let tables = Tables::load(&store)?;
    let report = ballot_core::check(&tables);

    println!(
        "{} users, {} polls, {} votes",
        report.users.to_string().bold(),
        report.polls.to_string().bold(),
        report.votes.to_string().bold()
    );
    if report.is_consistent() {
        println!("{} No issues.", "✓".green().bold());
        return Ok(());
    }

    for violation in &report.violations {
        println!(
            "  {} poll {}: {:?}: {}",
            "✗".red().bold(),
            violation.poll.to_string().yellow(),
            violation.kind,
            violation.description
        );
    }
    bail!(
        "{} violation(s) found; they are repaired the next time the server opens this directory",
        report.violations.len()
    )
}

fn cmd_polls(config: &ServerConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let polls = open_ballot(config)?.polls().list_polls()?;

    if let OutputFormat::Json = format {
        let rows: Vec<_> = polls
            .iter()
            .map(|(id, poll)| {
                json!({
                    "id": id,
                    "question": poll.question,
                    "options": poll.options,
                    "total_votes": poll.total_votes(),
                    "created_at": poll.created_at,
                    "created_by": poll.created_by,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if polls.is_empty() {
        println!("No polls.");
        return Ok(());
    }
    for (id, poll) in &polls {
        println!(
            "{}  {}  ({} votes)",
            id.to_string().yellow(),
            poll.question.bold(),
            poll.total_votes()
        );
        let owner = poll.created_by.as_deref().unwrap_or("(sample)");
        println!("  created {} by {}", poll.created_at, owner.dimmed());
    }
    Ok(())
}

fn cmd_results(config: &ServerConfig, format: &OutputFormat, args: ResultsArgs) -> anyhow::Result<()> {
    let results = open_ballot(config)?
        .votes()
        .results(&PollId::from(args.poll_id))?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    let total = results.poll.total_votes();
    println!("{} {}", results.id.to_string().yellow(), results.poll.question.bold());
    for (label, count) in results.poll.options.iter() {
        println!("  {:<24} {:>5}  {:>5.1}%", label, count, percent(*count, total));
    }
    println!("  {:<24} {:>5}", "total".bold(), total);

    if !results.voters.is_empty() {
        println!();
        for voter in &results.voters {
            println!(
                "  {}  {}  {} ({}, {}, {})",
                voter.voted_at.to_string().dimmed(),
                voter.selected_option.green(),
                voter.voter_email,
                voter.profile.name,
                voter.profile.age,
                voter.profile.city
            );
        }
    }
    Ok(())
}

fn percent(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_flag_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ballot.toml");
        std::fs::write(&path, "data_dir = \"from-file\"\nsession_ttl_secs = 5\n").unwrap();

        let config = resolve_config(Some(&path), None).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("from-file"));

        let config = resolve_config(Some(&path), Some(PathBuf::from("from-flag"))).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("from-flag"));
        assert_eq!(config.session_ttl_secs, 5);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_config(Some(&dir.path().join("nope.toml")), None).is_err());
    }

    #[test]
    fn check_reports_clean_and_broken_directories() {
        let dir = tempfile::tempdir().unwrap();
        let config = resolve_config(None, Some(dir.path().to_path_buf())).unwrap();
        cmd_check(&config).unwrap();

        std::fs::write(
            dir.path().join("polls.json"),
            r#"{"1": {"question": "Q", "options": {"A": 3, "B": 0}, "created_at": "2025-01-01 00:00:00"}}"#,
        )
        .unwrap();
        assert!(cmd_check(&config).is_err());
    }

    #[test]
    fn reporting_commands_leave_data_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let config = resolve_config(None, Some(dir.path().to_path_buf())).unwrap();
        let polls = dir.path().join("polls.json");
        let raw = r#"{"1": {"question": "Q", "options": {"A": 3, "B": 0}, "created_at": "2025-01-01 00:00:00"}}"#;
        std::fs::write(&polls, raw).unwrap();

        cmd_polls(&config, &OutputFormat::Text).unwrap();
        cmd_polls(&config, &OutputFormat::Json).unwrap();
        cmd_results(&config, &OutputFormat::Text, ResultsArgs { poll_id: "1".into() }).unwrap();

        assert_eq!(std::fs::read_to_string(&polls).unwrap(), raw);
        assert!(!dir.path().join("votes.json").exists());
        assert!(!dir.path().join("users.json").exists());
    }

    #[test]
    fn percentages() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }
}
