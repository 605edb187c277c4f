//! Report formatters. Each turns a finished [`ScanResult`] into bytes.

pub mod csv;
pub mod html;
pub mod json;
pub mod markdown;
pub mod sarif;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::aggregator::ScanResult;
use crate::error::{CoreError, Result};

pub trait ReportFormatter: Send + Sync {
    fn format(&self, result: &ScanResult) -> Result<Vec<u8>>;

    fn file_extension(&self) -> &'static str;

    fn mime_type(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Json,
    Html,
    Markdown,
    Sarif,
    Csv,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 5] = [
        ReportFormat::Json,
        ReportFormat::Html,
        ReportFormat::Markdown,
        ReportFormat::Sarif,
        ReportFormat::Csv,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Html => "html",
            ReportFormat::Markdown => "markdown",
            ReportFormat::Sarif => "sarif",
            ReportFormat::Csv => "csv",
        }
    }

    pub fn formatter(self) -> Arc<dyn ReportFormatter> {
        match self {
            ReportFormat::Json => Arc::new(json::JsonFormatter),
            ReportFormat::Html => Arc::new(html::HtmlFormatter),
            ReportFormat::Markdown => Arc::new(markdown::MarkdownFormatter),
            ReportFormat::Sarif => Arc::new(sarif::SarifFormatter),
            ReportFormat::Csv => Arc::new(csv::CsvFormatter),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "html" => Ok(ReportFormat::Html),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "sarif" => Ok(ReportFormat::Sarif),
            "csv" => Ok(ReportFormat::Csv),
            other => Err(CoreError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a formatter by name; unknown names are a configuration error.
pub fn formatter_for(name: &str) -> Result<Arc<dyn ReportFormatter>> {
    Ok(name.parse::<ReportFormat>()?.formatter())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::PathBuf;

    use crate::aggregator::{
        Aggregator, CheckerRun, Metadata, RunStatus, ScanResult,
    };
    use crate::checker::Finding;
    use crate::options::ScanOptions;
    use crate::rules::model::{Confidence, Severity};
    use crate::walker::Language;

    pub fn finding(rule: &str, severity: Severity, file: &str, line: usize) -> Finding {
        Finding {
            id: format!("RUDRA-{}", rule.to_uppercase()),
            fingerprint: format!("{rule}{line}"),
            title: format!("{rule} title"),
            severity,
            category: "memory-safety".to_string(),
            checker_id: "rudra".to_string(),
            file: file.to_string(),
            line,
            column: 3,
            rule_id: rule.to_string(),
            description: format!("{rule} in {file}"),
            recommendation: "Fix it".to_string(),
            code_snippet: Some("let x = <y>;".to_string()),
            confidence: Some(Confidence::High),
        }
    }

    pub fn result(findings: Vec<Finding>) -> ScanResult {
        let mut aggregator = Aggregator::new(Severity::Info);
        let count = aggregator.add_batch(findings);
        aggregator.finish(Metadata {
            tool: "SwarmSight".to_string(),
            version: "0.0.0".to_string(),
            scan_id: "scan-1".to_string(),
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
            project_name: "demo".to_string(),
            project_path: PathBuf::from("/tmp/demo"),
            languages: vec![Language::Rust],
            options: ScanOptions::new("/tmp/demo"),
            checkers: vec![CheckerRun {
                checker_id: "rudra".to_string(),
                checker_name: "Rudra".to_string(),
                language: Language::Rust,
                status: RunStatus::Completed,
                duration_ms: 12,
                findings: count,
                error: None,
            }],
        })
    }
}
