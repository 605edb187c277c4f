//! Turn the raw output of external analyzers into structured diagnostics.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::rules::model::Severity;

static RUSTC_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(error|warning)(?:\[([A-Za-z0-9_\-]+)\])?:\s*(.+)$").unwrap()
});

/// Closing tallies such as "aborting due to ...", "2 warnings emitted" and
/// "(lib) generated 3 warnings".
static RUSTC_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^aborting due to\b|^\d+ warnings? emitted$|generated \d+ (?:warnings?|errors?)(?: \(.*\))?$)",
    )
    .unwrap()
});

static GNU_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?):(\d+):(\d+):\s*([A-Za-z]+):\s*(.*?)(?:\s*\[([^\]]+)\])?\s*$").unwrap()
});

static CODESPAN_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(error|warning|bug)(?:\[([A-Za-z0-9_\-]+)\])?:\s*(.+)$").unwrap()
});

/// One problem reported by an external tool, before it becomes a [`Finding`].
///
/// [`Finding`]: super::Finding
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDiagnostic {
    pub code: String,
    pub message: String,
    pub severity: Severity,
    pub file: Option<String>,
    pub line: usize,
    pub column: usize,
    pub notes: Vec<String>,
}

impl ToolDiagnostic {
    fn new(code: &str, message: &str, severity: Severity) -> Self {
        Self {
            code: code.trim().to_string(),
            message: message.trim().to_string(),
            severity,
            file: None,
            line: 1,
            column: 1,
            notes: Vec::new(),
        }
    }
}

/// Output dialect spoken by a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOutput {
    /// `error[CODE]: message` followed by `--> file:line:col` and `= note:` lines.
    RustcDiagnostics,
    /// `file:line:column: severity: message [id]`
    GnuStyle,
    /// `slither --json -`
    SlitherJson,
    /// `Check N: name` blocks with `- Status: FAILURE`
    KaniReport,
    /// `error: message` followed by `┌─ file:line:col`
    Codespan,
}

impl ToolOutput {
    /// `default` is used where the dialect carries no severity of its own.
    pub fn parse(self, output: &str, default: Severity) -> Vec<ToolDiagnostic> {
        match self {
            ToolOutput::RustcDiagnostics => parse_rustc(output, default),
            ToolOutput::GnuStyle => parse_gnu(output),
            ToolOutput::SlitherJson => parse_slither(output),
            ToolOutput::KaniReport => parse_kani(output),
            ToolOutput::Codespan => parse_codespan(output),
        }
    }
}

fn location_of(rest: &str) -> Option<(String, usize, usize)> {
    let mut parts = rest.trim().rsplitn(3, ':');
    let column = parts.next()?.trim().parse().ok()?;
    let line = parts.next()?.trim().parse().ok()?;
    let file = parts.next()?.trim().to_string();
    Some((file, line, column))
}

fn parse_rustc(output: &str, default: Severity) -> Vec<ToolDiagnostic> {
    let mut out: Vec<ToolDiagnostic> = Vec::new();

    for raw in output.lines() {
        let line = raw.trim();
        if let Some(caps) = RUSTC_HEADER.captures(line) {
            let message = &caps[3];
            if RUSTC_SUMMARY.is_match(message) {
                continue;
            }
            let severity = match &caps[1] {
                "error" => default,
                _ => Severity::Medium,
            };
            let code = caps.get(2).map(|m| m.as_str()).unwrap_or(&caps[1]);
            out.push(ToolDiagnostic::new(code, message, severity));
        } else if let Some(rest) = line.strip_prefix("-->") {
            if let (Some(current), Some((file, l, c))) = (out.last_mut(), location_of(rest)) {
                if current.file.is_none() {
                    current.file = Some(file);
                    current.line = l;
                    current.column = c;
                }
            }
        } else if let Some(note) = line.strip_prefix("= note:") {
            if let Some(current) = out.last_mut() {
                current.notes.push(note.trim().to_string());
            }
        }
    }
    out
}

fn gnu_severity(label: &str) -> Severity {
    match label.trim().to_ascii_lowercase().as_str() {
        "error" => Severity::High,
        "warning" => Severity::Medium,
        "style" | "performance" | "portability" => Severity::Low,
        "information" | "note" | "info" => Severity::Info,
        _ => Severity::Unknown,
    }
}

fn parse_gnu(output: &str) -> Vec<ToolDiagnostic> {
    output
        .lines()
        .filter_map(|line| GNU_LINE.captures(line.trim()))
        .map(|caps| {
            let code = caps.get(6).map(|m| m.as_str()).unwrap_or(&caps[4]);
            let mut diag = ToolDiagnostic::new(code, &caps[5], gnu_severity(&caps[4]));
            diag.file = Some(caps[1].to_string());
            diag.line = caps[2].parse().unwrap_or(1);
            diag.column = caps[3].parse().unwrap_or(1);
            diag
        })
        .collect()
}

#[derive(Deserialize)]
struct SlitherReport {
    #[serde(default)]
    results: SlitherResults,
}

#[derive(Deserialize, Default)]
struct SlitherResults {
    #[serde(default)]
    detectors: Vec<SlitherDetector>,
}

#[derive(Deserialize)]
struct SlitherDetector {
    check: String,
    impact: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    elements: Vec<SlitherElement>,
}

#[derive(Deserialize)]
struct SlitherElement {
    #[serde(default)]
    source_mapping: Option<SlitherSourceMapping>,
}

#[derive(Deserialize)]
struct SlitherSourceMapping {
    #[serde(default)]
    filename_relative: Option<String>,
    #[serde(default)]
    lines: Vec<usize>,
    #[serde(default)]
    starting_column: Option<usize>,
}

fn slither_severity(impact: &str) -> Severity {
    match impact {
        "High" => Severity::High,
        "Medium" => Severity::Medium,
        "Low" => Severity::Low,
        "Informational" | "Optimization" => Severity::Info,
        _ => Severity::Unknown,
    }
}

fn parse_slither(output: &str) -> Vec<ToolDiagnostic> {
    let report: SlitherReport = match serde_json::from_str(output.trim()) {
        Ok(report) => report,
        Err(e) => {
            tracing::debug!(error = %e, "slither output is not JSON");
            return Vec::new();
        }
    };
    report
        .results
        .detectors
        .into_iter()
        .map(|d| {
            let mut diag = ToolDiagnostic::new(&d.check, &d.description, slither_severity(&d.impact));
            if let Some(mapping) = d.elements.into_iter().find_map(|e| e.source_mapping) {
                diag.file = mapping.filename_relative;
                diag.line = mapping.lines.first().copied().unwrap_or(1);
                diag.column = mapping.starting_column.unwrap_or(1);
            }
            diag
        })
        .collect()
}

fn parse_kani(output: &str) -> Vec<ToolDiagnostic> {
    let mut out = Vec::new();
    let mut name = String::new();
    let mut description = String::new();
    let mut failed = false;
    let mut location: Option<(String, usize, usize)> = None;

    let mut flush = |name: &mut String,
                     description: &mut String,
                     failed: &mut bool,
                     location: &mut Option<(String, usize, usize)>| {
        if *failed {
            let message = if description.is_empty() { name.clone() } else { description.clone() };
            let mut diag = ToolDiagnostic::new(name, &message, Severity::High);
            if let Some((file, line, column)) = location.take() {
                diag.file = Some(file);
                diag.line = line;
                diag.column = column;
            }
            out.push(diag);
        }
        name.clear();
        description.clear();
        *failed = false;
        *location = None;
    };

    for raw in output.lines() {
        let line = raw.trim();
        if let Some(rest) = line.strip_prefix("Check ") {
            flush(&mut name, &mut description, &mut failed, &mut location);
            if let Some((_, check)) = rest.split_once(':') {
                name = check.trim().to_string();
            }
        } else if let Some(status) = line.strip_prefix("- Status:") {
            failed = status.trim() == "FAILURE";
        } else if let Some(text) = line.strip_prefix("- Description:") {
            description = text.trim().trim_matches('"').to_string();
        } else if let Some(loc) = line.strip_prefix("- Location:") {
            // "src/lib.rs:12:5 in function foo"
            let loc = loc.split(" in ").next().unwrap_or(loc);
            location = location_of(loc);
        }
    }
    flush(&mut name, &mut description, &mut failed, &mut location);
    out
}

fn parse_codespan(output: &str) -> Vec<ToolDiagnostic> {
    let mut out: Vec<ToolDiagnostic> = Vec::new();
    for raw in output.lines() {
        let line = raw.trim();
        if let Some(caps) = CODESPAN_HEADER.captures(line) {
            let severity = match &caps[1] {
                "warning" => Severity::Medium,
                _ => Severity::High,
            };
            let code = caps.get(2).map(|m| m.as_str()).unwrap_or(&caps[1]);
            out.push(ToolDiagnostic::new(code, &caps[3], severity));
        } else if let Some(rest) = line.strip_prefix("┌─") {
            if let (Some(current), Some((file, l, c))) = (out.last_mut(), location_of(rest)) {
                if current.file.is_none() {
                    current.file = Some(file);
                    current.line = l;
                    current.column = c;
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rustc_diagnostics_with_location_and_notes() {
        let output = "\
error[UseAfterFree]: use of freed pointer `p`
  --> src/lib.rs:10:5
   |
   = note: the pointer was freed at src/lib.rs:8:9
warning: unused variable
  --> src/main.rs:2:9
error: aborting due to 1 previous error
";
        let diags = ToolOutput::RustcDiagnostics.parse(output, Severity::Critical);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].code, "UseAfterFree");
        assert_eq!(diags[0].severity, Severity::Critical);
        assert_eq!(diags[0].file.as_deref(), Some("src/lib.rs"));
        assert_eq!((diags[0].line, diags[0].column), (10, 5));
        assert_eq!(diags[0].notes.len(), 1);
        assert_eq!(diags[1].code, "warning");
        assert_eq!(diags[1].severity, Severity::Medium);
    }

    #[test]
    fn rustc_summary_lines_are_dropped_but_similar_messages_kept() {
        let output = "\
warning: value generated by `alloc` is never freed
  --> src/lib.rs:4:13
warning: `demo` (lib) generated 2 warnings
warning: `demo` (lib) generated 1 warning (1 duplicate)
warning: 3 warnings emitted
error[E0499]: generated code borrows `buf` twice
error: aborting due to 2 previous errors
";
        let diags = ToolOutput::RustcDiagnostics.parse(output, Severity::High);
        let messages: Vec<_> = diags.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "value generated by `alloc` is never freed",
                "generated code borrows `buf` twice",
            ]
        );
        assert_eq!(diags[0].file.as_deref(), Some("src/lib.rs"));
        assert_eq!(diags[0].line, 4);
    }

    #[test]
    fn gnu_style_maps_severity_labels() {
        let output = "\
src/a.cpp:4:7: error: Null pointer dereference: p [nullPointer]
src/a.cpp:9:1: style: Variable 'x' is assigned a value that is never used. [unreadVariable]
garbage line
src/b.c:1:1: frobnicate: something odd
";
        let diags = ToolOutput::GnuStyle.parse(output, Severity::Medium);
        assert_eq!(diags.len(), 3);
        assert_eq!(diags[0].code, "nullPointer");
        assert_eq!(diags[0].severity, Severity::High);
        assert_eq!(diags[0].message, "Null pointer dereference: p");
        assert_eq!(diags[1].severity, Severity::Low);
        assert_eq!(diags[2].severity, Severity::Unknown);
        assert_eq!(diags[2].file.as_deref(), Some("src/b.c"));
    }

    #[test]
    fn slither_json_detectors() {
        let output = r#"{"success": true, "results": {"detectors": [
            {"check": "reentrancy-eth", "impact": "High", "description": "Reentrancy in withdraw()",
             "elements": [{"source_mapping": {"filename_relative": "contracts/Bank.sol", "lines": [21, 22], "starting_column": 5}}]},
            {"check": "solc-version", "impact": "Informational", "description": "old pragma", "elements": []}
        ]}}"#;
        let diags = ToolOutput::SlitherJson.parse(output, Severity::Medium);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].severity, Severity::High);
        assert_eq!(diags[0].file.as_deref(), Some("contracts/Bank.sol"));
        assert_eq!(diags[0].line, 21);
        assert_eq!(diags[1].severity, Severity::Info);
        assert!(ToolOutput::SlitherJson.parse("not json", Severity::Medium).is_empty());
    }

    #[test]
    fn kani_reports_only_failed_checks() {
        let output = "\
Check 1: foo.assertion.1
\t - Status: SUCCESS
\t - Description: \"assertion failed: x > 0\"
\t - Location: src/lib.rs:3:5 in function foo

Check 2: foo.pointer_dereference.1
\t - Status: FAILURE
\t - Description: \"dereference failure: pointer NULL\"
\t - Location: src/lib.rs:7:9 in function foo
";
        let diags = ToolOutput::KaniReport.parse(output, Severity::Medium);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "foo.pointer_dereference.1");
        assert_eq!(diags[0].message, "dereference failure: pointer NULL");
        assert_eq!((diags[0].line, diags[0].column), (7, 9));
    }

    #[test]
    fn codespan_blocks() {
        let output = "\
error: abort not covered by any of the `aborts_if` clauses
   ┌─ sources/Coin.move:14:5
   │
warning: unused variable
";
        let diags = ToolOutput::Codespan.parse(output, Severity::Medium);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].severity, Severity::High);
        assert_eq!(diags[0].file.as_deref(), Some("sources/Coin.move"));
        assert_eq!(diags[0].line, 14);
        assert!(diags[1].file.is_none());
    }
}
