//! Command-line interface
//!
//! `xporter report` runs the full pipeline; `xporter merge` only combines
//! shard files into one report.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;

use commands::merge::MergeArgs;
use commands::report::ReportArgs;

/// Command line interface.
#[derive(Parser, Debug)]
#[command(name = "xporter")]
#[command(about = "Merge Cypress mochawesome reports and send results to TestRail", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to .xporter/config.yaml)
    #[arg(short, long, global = true, env = "XPORTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge shards, flatten results and report them
    Report(ReportArgs),

    /// Merge shard files into a single report
    Merge(MergeArgs),
}

/// Print a fatal error and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {err:#}", style("error:").red().bold());
    }
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_report_flags() {
        let cli = Cli::try_parse_from([
            "xporter",
            "--json",
            "report",
            "--root",
            "cypress/reports",
            "--adhoc-run",
            "812",
            "--no-merged-file",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Report(args) => {
                assert_eq!(args.root, PathBuf::from("cypress/reports"));
                assert_eq!(args.adhoc_run, Some(812));
                assert!(args.no_merged_file);
                assert!(!args.testrail);
            }
            Commands::Merge(_) => panic!("expected report"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["xporter", "merge", "--config", "ci.yaml", "-o", "out.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("ci.yaml")));
        match cli.command {
            Commands::Merge(args) => {
                assert_eq!(args.root, PathBuf::from("."));
                assert_eq!(args.output, Some(PathBuf::from("out.json")));
            }
            Commands::Report(_) => panic!("expected merge"),
        }
    }

    #[test]
    fn test_adhoc_run_must_be_numeric() {
        assert!(Cli::try_parse_from(["xporter", "report", "--adhoc-run", "R12"]).is_err());
    }
}
