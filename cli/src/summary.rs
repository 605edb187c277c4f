//! Coloured terminal summary printed after a scan.

use colored::{ColoredString, Colorize};
use swarmsight_core::{Rating, RunStatus, ScanResult, Severity};

fn severity_label(severity: Severity) -> ColoredString {
    let label = format!("{:<8}", severity.as_str().to_uppercase());
    match severity {
        Severity::Critical => label.red().bold(),
        Severity::High => label.yellow().bold(),
        Severity::Medium => label.cyan(),
        Severity::Low => label.white(),
        Severity::Info | Severity::Unknown => label.dimmed(),
    }
}

fn rating_label(rating: Rating) -> ColoredString {
    match rating {
        Rating::Excellent => rating.as_str().green().bold(),
        Rating::Good => rating.as_str().green(),
        Rating::Fair => rating.as_str().yellow(),
        Rating::Poor => rating.as_str().red(),
        Rating::Critical => rating.as_str().red().bold(),
    }
}

fn status_label(status: RunStatus) -> ColoredString {
    match status {
        RunStatus::Completed => status.as_str().green(),
        RunStatus::Failed => status.as_str().red(),
        RunStatus::TimedOut => status.as_str().yellow(),
        RunStatus::Unavailable => status.as_str().dimmed(),
    }
}

pub fn render(result: &ScanResult, verbose: bool) -> String {
    let meta = &result.metadata;
    let mut out = String::new();
    out.push_str(&format!(
        "\n{} {} {}\n",
        meta.tool.bold(),
        "scan of".dimmed(),
        meta.project_name.bold()
    ));

    for run in &meta.checkers {
        let mut line = format!(
            "  {:<14} {:<12} {:>4} findings  {:>6} ms",
            run.checker_id,
            status_label(run.status),
            run.findings,
            run.duration_ms
        );
        if let Some(err) = &run.error {
            if verbose || run.status != RunStatus::Completed {
                line.push_str(&format!("  {}", err.dimmed()));
            }
        }
        out.push_str(&line);
        out.push('\n');
    }

    out.push('\n');
    for level in Severity::LEVELS {
        out.push_str(&format!("  {} {}\n", severity_label(level), result.summary.count(level)));
    }
    if result.summary.unknown > 0 {
        out.push_str(&format!(
            "  {} {}\n",
            severity_label(Severity::Unknown),
            result.summary.unknown
        ));
    }
    out.push_str(&format!("  {:<8} {}\n\n", "TOTAL".bold(), result.summary.total));
    out.push_str(&format!(
        "  Risk score: {}/100 ({})\n",
        result.score.value.to_string().bold(),
        rating_label(result.score.rating)
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use swarmsight_core::aggregator::{Aggregator, CheckerRun, Metadata};
    use swarmsight_core::{Language, ScanOptions};

    #[test]
    fn mentions_score_and_failed_checkers() {
        colored::control::set_override(false);
        let result = Aggregator::new(Severity::Low).finish(Metadata {
            tool: "SwarmSight".into(),
            version: "0.3.0".into(),
            scan_id: "id".into(),
            timestamp: "now".into(),
            project_name: "demo".into(),
            project_path: PathBuf::from("demo"),
            languages: vec![Language::Rust],
            options: ScanOptions::new("demo"),
            checkers: vec![CheckerRun {
                checker_id: "lockbud".into(),
                checker_name: "Lockbud".into(),
                language: Language::Rust,
                status: RunStatus::TimedOut,
                duration_ms: 1000,
                findings: 0,
                error: Some("timed out after 1s".into()),
            }],
        });
        let text = render(&result, false);
        assert!(text.contains("Risk score: 100/100 (Excellent)"));
        assert!(text.contains("timed_out"));
        assert!(text.contains("timed out after 1s"));
    }
}
