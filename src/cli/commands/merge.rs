//! Implementation of the `xporter merge` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::services::report_merger::{discover_report_files, load_and_merge, write_merged};

/// Arguments of `xporter merge`.
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Directory searched for shard files
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// Merged report path (defaults to the configured name next to the first shard)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Result of a merge.
#[derive(Debug, Serialize)]
pub struct MergeOutput {
    /// Number of shards merged
    pub shards: usize,
    /// Merged report path
    pub output: PathBuf,
    /// Total tests
    pub tests: u64,
    /// Passed tests
    pub passes: u64,
    /// Failed tests
    pub failures: u64,
    /// Pending tests
    pub pending: u64,
    /// Recomputed pass rate
    pub pass_percent: f64,
}

impl CommandOutput for MergeOutput {
    fn to_human(&self) -> String {
        format!(
            "Merged {} shard(s) into {}\n  tests: {}  passes: {}  failures: {}  pending: {}  pass: {:.1}%",
            self.shards,
            self.output.display(),
            self.tests,
            self.passes,
            self.failures,
            self.pending,
            self.pass_percent,
        )
    }
}

/// Merge the shards under `args.root` into one file.
pub async fn execute(args: MergeArgs, config: Config, json_mode: bool) -> Result<()> {
    let files = discover_report_files(&args.root, &config.reports)?;
    let bundle = load_and_merge(&files)?;

    let output_path = match args.output {
        Some(path) => path,
        None => {
            let name = config
                .reports
                .merged_file_name
                .as_deref()
                .context("No --output given and reports.merged_file_name is unset")?;
            files
                .first()
                .and_then(|f| f.parent())
                .map_or_else(|| PathBuf::from(name), |dir| dir.join(name))
        }
    };
    write_merged(&bundle, &output_path)?;

    let stats = &bundle.stats;
    output(
        &MergeOutput {
            shards: files.len(),
            output: output_path,
            tests: stats.tests,
            passes: stats.passes,
            failures: stats.failures,
            pending: stats.pending,
            pass_percent: stats.pass_percent,
        },
        json_mode,
    );
    Ok(())
}
