use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ballot", about = "Ballot: polls with one vote per user", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the data files (overrides the config file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Check the data files for inconsistencies without repairing them
    Check(CheckArgs),
    /// List all polls
    Polls(PollsArgs),
    /// Show a poll's tally and voters
    Results(ResultsArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on (overrides the config file)
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Do not seed the sample poll into an empty data directory
    #[arg(long)]
    pub no_seed: bool,
}

#[derive(Args)]
pub struct CheckArgs {}

#[derive(Args)]
pub struct PollsArgs {}

#[derive(Args)]
pub struct ResultsArgs {
    pub poll_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from(["ballot", "serve", "--bind", "0.0.0.0:8080"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind, Some("0.0.0.0:8080".parse().unwrap()));
            assert!(!args.no_seed);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_serve_rejects_bad_address() {
        assert!(Cli::try_parse_from(["ballot", "serve", "--bind", "nowhere"]).is_err());
    }

    #[test]
    fn parse_global_paths() {
        let cli = Cli::try_parse_from([
            "ballot",
            "check",
            "--config",
            "ballot.toml",
            "--data-dir",
            "/srv/ballot",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Check(_)));
        assert_eq!(cli.config, Some(PathBuf::from("ballot.toml")));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/srv/ballot")));
    }

    #[test]
    fn parse_results() {
        let cli = Cli::try_parse_from(["ballot", "results", "1724790797000"]).unwrap();
        if let Command::Results(args) = cli.command {
            assert_eq!(args.poll_id, "1724790797000");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["ballot", "--verbose", "polls"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["ballot", "--format", "json", "polls"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
