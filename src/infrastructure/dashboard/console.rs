use anyhow::Result;
use async_trait::async_trait;
use comfy_table::{presets, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;

use crate::domain::models::{GroupOutcome, RunSummary};
use crate::domain::ports::{DashboardPublisher, DashboardSummary};

const MAX_MESSAGE_LEN: usize = 80;

/// Prints the run summary as tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleDashboard;

impl ConsoleDashboard {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, summary: &DashboardSummary) -> String {
        let mut sections = vec![render_totals(summary)];
        if !summary.failures.is_empty() {
            sections.push(render_failures(summary));
        }
        if let Some(runs) = &summary.runs {
            sections.push(render_runs(runs));
        }
        sections.join("\n\n")
    }
}

#[async_trait]
impl DashboardPublisher for ConsoleDashboard {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn publish(&self, summary: &DashboardSummary) -> Result<()> {
        println!("{}", self.render(summary));
        Ok(())
    }
}

fn table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

fn render_totals(summary: &DashboardSummary) -> String {
    let stats = &summary.stats;
    let mut totals = table(&["tests", "passed", "failed", "pending", "pass %", "unreportable"]);
    totals.add_row(vec![
        Cell::new(stats.tests),
        Cell::new(summary.passed).fg(Color::Green),
        Cell::new(summary.failed).fg(if summary.failed > 0 { Color::Red } else { Color::Reset }),
        Cell::new(stats.pending),
        Cell::new(format!("{:.1}", stats.pass_percent)),
        Cell::new(summary.unreportable),
    ]);
    format!("{}\n{totals}", style("Test results").bold())
}

fn render_failures(summary: &DashboardSummary) -> String {
    let mut failures = table(&["test", "file", "error"]);
    for outcome in &summary.failures {
        failures.add_row(vec![
            Cell::new(&outcome.title),
            Cell::new(&outcome.file),
            Cell::new(truncate(
                outcome.error_message.as_deref().unwrap_or_default(),
                MAX_MESSAGE_LEN,
            )),
        ]);
    }
    format!("{}\n{failures}", style("Failures").red().bold())
}

fn render_runs(runs: &RunSummary) -> String {
    let mut groups = table(&["group", "run", "posted", "passed", "failed", "status"]);
    for group in &runs.groups {
        let scope = Cell::new(group.scope());
        match group {
            GroupOutcome::Completed(done) => {
                let status = if done.post_failed {
                    "post failed".to_string()
                } else if done.close_failed {
                    "close failed".to_string()
                } else {
                    done.final_state.to_string()
                };
                groups.add_row(vec![
                    scope,
                    Cell::new(format!("R{}", done.run_id)),
                    Cell::new(done.posted),
                    Cell::new(done.passed),
                    Cell::new(done.failed),
                    Cell::new(status),
                ]);
            }
            GroupOutcome::Skipped { reason, .. } => {
                groups.add_row(vec![
                    scope,
                    Cell::new("-"),
                    Cell::new(0),
                    Cell::new(0),
                    Cell::new(0),
                    Cell::new(format!("skipped: {reason}")).fg(Color::Yellow),
                ]);
            }
        }
    }
    format!("{}\n{groups}", style("Catalog runs").bold())
}

/// Truncate on a char boundary, appending "..." if truncated.
fn truncate(s: &str, max_chars: usize) -> String {
    let first_line = s.lines().next().unwrap_or_default();
    if first_line.chars().count() <= max_chars {
        first_line.to_string()
    } else {
        let kept: String = first_line.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
