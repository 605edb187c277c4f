use std::fmt::Write;

use super::ReportFormatter;
use crate::aggregator::ScanResult;
use crate::error::Result;
use crate::rules::model::Severity;

pub struct HtmlFormatter;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = r#"
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 2rem; color: #222; }
        table { border-collapse: collapse; margin-bottom: 1.5rem; }
        th, td { border: 1px solid #ddd; padding: 0.4rem 0.8rem; text-align: left; }
        .score { font-size: 2rem; font-weight: bold; }
        .finding { border-left: 4px solid #999; padding: 0.5rem 1rem; margin: 1rem 0; background: #fafafa; }
        .severity-critical { border-color: #b00020; }
        .severity-high { border-color: #e65100; }
        .severity-medium { border-color: #f9a825; }
        .severity-low { border-color: #1565c0; }
        .severity-info, .severity-unknown { border-color: #777; }
        pre { background: #f0f0f0; padding: 0.5rem; overflow-x: auto; }
"#;

impl HtmlFormatter {
    fn render(result: &ScanResult) -> String {
        let meta = &result.metadata;
        let mut rows = String::new();
        for level in Severity::LEVELS {
            let _ = write!(rows, "<tr><td>{}</td><td>{}</td></tr>", level, result.summary.count(level));
        }
        if result.summary.unknown > 0 {
            let _ = write!(rows, "<tr><td>unknown</td><td>{}</td></tr>", result.summary.unknown);
        }

        let findings: String = if result.findings.is_empty() {
            "<p>No findings.</p>".to_string()
        } else {
            result
                .findings
                .iter()
                .map(|f| {
                    let snippet = f
                        .code_snippet
                        .as_deref()
                        .map(|s| format!("<pre><code>{}</code></pre>", escape(s)))
                        .unwrap_or_default();
                    format!(
                        r#"
        <div class="finding severity-{sev}">
            <h3>{title} <small>{id}</small></h3>
            <p><strong>{sev}</strong> | {category} | {checker}</p>
            <p><code>{file}:{line}:{column}</code></p>
            <p>{description}</p>
            {snippet}
            <p><strong>Recommendation:</strong> {recommendation}</p>
        </div>"#,
                        sev = f.severity,
                        title = escape(&f.title),
                        id = escape(&f.id),
                        category = escape(&f.category),
                        checker = escape(&f.checker_id),
                        file = escape(&f.file),
                        line = f.line,
                        column = f.column,
                        description = escape(&f.description),
                        recommendation = escape(&f.recommendation),
                    )
                })
                .collect()
        };

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{tool} Report - {project}</title>
    <style>{style}</style>
</head>
<body>
    <h1>{tool} Security Report</h1>
    <p>Project <strong>{project}</strong> | scan {scan_id} | {timestamp} | v{version}</p>
    <h2>Risk Score</h2>
    <p class="score">{score}/100 <span>{rating}</span></p>
    <h2>Summary</h2>
    <table><tr><th>Severity</th><th>Count</th></tr>{rows}<tr><th>Total</th><th>{total}</th></tr></table>
    <h2>Findings</h2>{findings}
</body>
</html>
"#,
            tool = escape(&meta.tool),
            project = escape(&meta.project_name),
            style = STYLE,
            scan_id = escape(&meta.scan_id),
            timestamp = escape(&meta.timestamp),
            version = escape(&meta.version),
            score = result.score.value,
            rating = result.score.rating,
            rows = rows,
            total = result.summary.total,
            findings = findings,
        )
    }
}

impl ReportFormatter for HtmlFormatter {
    fn format(&self, result: &ScanResult) -> Result<Vec<u8>> {
        Ok(Self::render(result).into_bytes())
    }

    fn file_extension(&self) -> &'static str {
        "html"
    }

    fn mime_type(&self) -> &'static str {
        "text/html"
    }
}
