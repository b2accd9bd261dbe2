//! Colored terminal rendering for plans and reports.

use icsync_core::sync::{ChangeKind, EventChange, SyncPlan, SyncReport};
use owo_colors::OwoColorize;

fn colorize(kind: ChangeKind, text: &str) -> String {
    match kind {
        ChangeKind::Create => text.green().to_string(),
        ChangeKind::Update => text.yellow().to_string(),
        ChangeKind::Delete => text.red().to_string(),
    }
}

fn render_change(change: &EventChange) -> String {
    let symbol = colorize(change.kind, change.kind.symbol());
    let title = colorize(change.kind, change.title());
    let key = format!("({})", change.key);
    format!("   {} {} {}", symbol, title, key.dimmed())
}

pub fn render_plan(plan: &SyncPlan) -> String {
    if plan.is_empty() {
        return format!("   {}", "Nothing to change".dimmed());
    }
    plan.changes
        .iter()
        .map(render_change)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_report(report: &SyncReport) -> String {
    let line = report.to_string();
    if report.errors > 0 {
        line.red().to_string()
    } else if report.mutations() > 0 {
        line.bold().to_string()
    } else {
        line.dimmed().to_string()
    }
}
