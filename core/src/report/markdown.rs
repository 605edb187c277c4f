use std::fmt::Write;

use super::ReportFormatter;
use crate::aggregator::ScanResult;
use crate::error::Result;
use crate::rules::model::Severity;

pub struct MarkdownFormatter;

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

impl MarkdownFormatter {
    fn render(result: &ScanResult) -> String {
        let meta = &result.metadata;
        let s = &result.summary;
        let mut out = String::new();

        let _ = writeln!(out, "# {} Security Report\n", meta.tool);
        let _ = writeln!(out, "- **Project:** {}", meta.project_name);
        let _ = writeln!(out, "- **Scan ID:** {}", meta.scan_id);
        let _ = writeln!(out, "- **Timestamp:** {}", meta.timestamp);
        let _ = writeln!(out, "- **Version:** {}", meta.version);
        let languages: Vec<&str> = meta.languages.iter().map(|l| l.as_str()).collect();
        let _ = writeln!(out, "- **Languages:** {}\n", languages.join(", "));

        let _ = writeln!(out, "## Risk Score\n");
        let _ = writeln!(out, "**{}/100** ({})\n", result.score.value, result.score.rating);

        let _ = writeln!(out, "## Summary\n");
        let _ = writeln!(out, "| Severity | Count |");
        let _ = writeln!(out, "|----------|-------|");
        for level in Severity::LEVELS {
            let _ = writeln!(out, "| {} | {} |", level, s.count(level));
        }
        if s.unknown > 0 {
            let _ = writeln!(out, "| unknown | {} |", s.unknown);
        }
        let _ = writeln!(out, "| **total** | **{}** |\n", s.total);

        if !meta.checkers.is_empty() {
            let _ = writeln!(out, "## Checkers\n");
            let _ = writeln!(out, "| Checker | Language | Status | Findings | Duration (ms) |");
            let _ = writeln!(out, "|---------|----------|--------|----------|---------------|");
            for run in &meta.checkers {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} | {} |",
                    cell(&run.checker_name),
                    run.language,
                    run.status.as_str(),
                    run.findings,
                    run.duration_ms
                );
            }
            out.push('\n');
        }

        let _ = writeln!(out, "## Findings\n");
        if result.findings.is_empty() {
            let _ = writeln!(out, "No findings.");
            return out;
        }
        for (i, f) in result.findings.iter().enumerate() {
            let _ = writeln!(out, "### {}. {} `{}`\n", i + 1, f.title, f.id);
            let _ = writeln!(out, "- **Severity:** {}", f.severity);
            let _ = writeln!(out, "- **Category:** {}", f.category);
            let _ = writeln!(out, "- **Checker:** {}", f.checker_id);
            let _ = writeln!(out, "- **Location:** `{}:{}:{}`", f.file, f.line, f.column);
            let _ = writeln!(out, "\n{}\n", f.description);
            if let Some(snippet) = &f.code_snippet {
                let _ = writeln!(out, "```\n{}\n```\n", snippet);
            }
            if !f.recommendation.is_empty() {
                let _ = writeln!(out, "**Recommendation:** {}\n", f.recommendation);
            }
        }
        out
    }
}

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, result: &ScanResult) -> Result<Vec<u8>> {
        Ok(Self::render(result).into_bytes())
    }

    fn file_extension(&self) -> &'static str {
        "md"
    }

    fn mime_type(&self) -> &'static str {
        "text/markdown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures;

    #[test]
    fn lists_summary_and_findings() {
        let result = fixtures::result(vec![fixtures::finding(
            "memory-transmutation",
            Severity::Critical,
            "src/b.rs",
            9,
        )]);
        let text = String::from_utf8(MarkdownFormatter.format(&result).unwrap()).unwrap();
        assert!(text.contains("**96/100** (Good)"));
        assert!(text.contains("| critical | 1 |"));
        assert!(text.contains("`src/b.rs:9:3`"));
        assert!(text.contains("| Rudra | rust | completed | 1 | 12 |"));
    }

    #[test]
    fn empty_result_says_so() {
        let text = String::from_utf8(MarkdownFormatter.format(&fixtures::result(vec![])).unwrap()).unwrap();
        assert!(text.contains("No findings."));
        assert!(text.contains("**100/100** (Excellent)"));
    }
}
