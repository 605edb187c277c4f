use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use which::which;

use super::parsers::{ToolDiagnostic, ToolOutput};
use super::pattern::PatternChecker;
use super::{finding_id, fingerprint, relative_path, Backend, Checker, CheckerMeta, Finding};
use crate::error::{CoreError, Result};
use crate::options::ScanOptions;

const STDERR_EXCERPT: usize = 2000;

/// How to run an analyzer and read its output.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub program: String,
    /// `{root}` is replaced with the project path.
    pub args: Vec<String>,
    /// Binary looked up on PATH to decide availability.
    pub probe: String,
    pub output: ToolOutput,
    pub install_hint: String,
}

impl ToolInvocation {
    pub fn new(program: &str, args: &[&str], output: ToolOutput) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            probe: program.to_string(),
            output,
            install_hint: String::new(),
        }
    }

    pub fn probe(mut self, binary: &str) -> Self {
        self.probe = binary.to_string();
        self
    }

    pub fn install_hint(mut self, hint: &str) -> Self {
        self.install_hint = hint.to_string();
        self
    }

    fn command(&self, root: &Path) -> Command {
        let root_str = root.to_string_lossy();
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args.iter().map(|a| a.replace("{root}", &root_str)))
            .current_dir(root)
            .kill_on_drop(true);
        cmd
    }
}

/// Wraps a third-party analyzer. When the tool is missing and a fallback
/// rule set is configured, the fallback runs instead.
pub struct ExternalChecker {
    meta: CheckerMeta,
    tool: ToolInvocation,
    fallback: Option<PatternChecker>,
    /// Keyword (matched case-insensitively against code and message) to advice.
    advice: Vec<(&'static str, &'static str)>,
}

impl ExternalChecker {
    pub fn new(meta: CheckerMeta, tool: ToolInvocation) -> Self {
        Self {
            meta,
            tool,
            fallback: None,
            advice: Vec::new(),
        }
    }

    pub fn with_fallback(mut self, fallback: PatternChecker) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_advice(mut self, advice: &[(&'static str, &'static str)]) -> Self {
        self.advice = advice.to_vec();
        self
    }

    pub fn tool_installed(&self) -> bool {
        which(&self.tool.probe).is_ok()
    }

    fn recommendation_for(&self, diag: &ToolDiagnostic) -> String {
        let haystack = format!("{} {}", diag.code, diag.message).to_lowercase();
        self.advice
            .iter()
            .find(|(keyword, _)| haystack.contains(&keyword.to_lowercase()))
            .map(|(_, advice)| advice.to_string())
            .unwrap_or_else(|| format!("Review the {} report for {}", self.meta.name, diag.code))
    }

    /// Convert parsed diagnostics into findings attributed to this checker.
    pub fn to_findings(&self, root: &Path, diagnostics: Vec<ToolDiagnostic>) -> Vec<Finding> {
        diagnostics
            .into_iter()
            .map(|diag| {
                let file = diag
                    .file
                    .as_deref()
                    .map(|f| {
                        let path = Path::new(f);
                        if path.is_absolute() {
                            relative_path(root, path)
                        } else {
                            f.replace('\\', "/")
                        }
                    })
                    .unwrap_or_default();
                let rule_id = diag.code.to_lowercase();
                let mut description = diag.message.clone();
                for note in &diag.notes {
                    description.push_str("\nnote: ");
                    description.push_str(note);
                }
                Finding {
                    id: finding_id(&self.meta.id, &rule_id),
                    fingerprint: fingerprint(&self.meta.id, &rule_id, &file, diag.line, diag.column),
                    title: diag.message.lines().next().unwrap_or_default().to_string(),
                    severity: diag.severity,
                    category: self.meta.category.clone(),
                    checker_id: self.meta.id.clone(),
                    line: diag.line,
                    column: diag.column,
                    recommendation: self.recommendation_for(&diag),
                    rule_id,
                    description,
                    code_snippet: None,
                    confidence: None,
                    file,
                }
            })
            .collect()
    }

    async fn run_tool(&self, root: &Path) -> Result<Vec<Finding>> {
        tracing::info!(checker = %self.meta.id, program = %self.tool.program, "running external analyzer");
        let output = self.tool.command(root).output().await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut diagnostics = self.tool.output.parse(&stdout, self.meta.severity);
        if diagnostics.is_empty() {
            diagnostics = self.tool.output.parse(&stderr, self.meta.severity);
        }

        if diagnostics.is_empty() && !output.status.success() {
            return Err(CoreError::ToolFailed {
                tool: self.tool.program.clone(),
                code: output.status.code(),
                stderr: stderr.chars().take(STDERR_EXCERPT).collect(),
            });
        }
        tracing::debug!(checker = %self.meta.id, diagnostics = diagnostics.len(), "external analyzer finished");
        Ok(self.to_findings(root, diagnostics))
    }
}

#[async_trait]
impl Checker for ExternalChecker {
    fn meta(&self) -> &CheckerMeta {
        &self.meta
    }

    fn backend(&self) -> Backend {
        if self.fallback.is_some() {
            Backend::ExternalWithFallback
        } else {
            Backend::External
        }
    }

    fn is_available(&self) -> bool {
        self.fallback.is_some() || self.tool_installed()
    }

    fn install_hint(&self) -> Option<&str> {
        if self.tool.install_hint.is_empty() {
            None
        } else {
            Some(&self.tool.install_hint)
        }
    }

    async fn scan(&self, root: &Path, options: &ScanOptions) -> Result<Vec<Finding>> {
        if self.tool_installed() {
            return self.run_tool(root).await;
        }
        match &self.fallback {
            Some(fallback) => {
                tracing::info!(checker = %self.meta.id, tool = %self.tool.probe, "tool not installed, using pattern rules");
                fallback.scan(root, options).await
            }
            None => Err(CoreError::CheckerUnavailable(format!(
                "{} is not installed",
                self.tool.probe
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::builtin::rust::rudra_rules;
    use crate::rules::matcher::compile_rules;
    use crate::rules::model::Severity;
    use crate::walker::Language;
    use std::fs;
    use tempfile::TempDir;

    const MISSING: &str = "swarmsight-definitely-missing-tool";

    fn meta() -> CheckerMeta {
        CheckerMeta::new("lockbud", "Lockbud", Language::Rust)
            .category("concurrency")
            .severity(Severity::Critical)
    }

    #[tokio::test]
    async fn missing_tool_without_fallback_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let checker = ExternalChecker::new(
            meta(),
            ToolInvocation::new(MISSING, &[], ToolOutput::RustcDiagnostics),
        );
        assert!(!checker.is_available());
        assert_eq!(checker.backend(), Backend::External);
        let err = checker
            .scan(dir.path(), &ScanOptions::new(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::CheckerUnavailable(_)));
    }

    #[tokio::test]
    async fn missing_tool_uses_fallback_rules() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("lib.rs"), "let v = x.unwrap();\n").unwrap();
        let fallback = PatternChecker::new(
            CheckerMeta::new("rudra", "Rudra", Language::Rust),
            compile_rules(rudra_rules()),
        );
        let checker = ExternalChecker::new(
            CheckerMeta::new("rudra", "Rudra", Language::Rust),
            ToolInvocation::new(MISSING, &[], ToolOutput::RustcDiagnostics),
        )
        .with_fallback(fallback);

        assert!(checker.is_available());
        assert_eq!(checker.backend(), Backend::ExternalWithFallback);
        let findings = checker
            .scan(dir.path(), &ScanOptions::new(dir.path()))
            .await
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].checker_id, "rudra");
    }

    #[test]
    fn diagnostics_become_findings_with_advice() {
        let checker = ExternalChecker::new(
            meta(),
            ToolInvocation::new(MISSING, &[], ToolOutput::RustcDiagnostics),
        )
        .with_advice(&[("deadlock", "Acquire locks in a consistent order")]);
        let output = "error[DoubleLock]: possible deadlock on `m`\n --> /proj/src/lib.rs:4:9\n";
        let diags = ToolOutput::RustcDiagnostics.parse(output, Severity::Critical);
        let findings = checker.to_findings(Path::new("/proj"), diags);

        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.id, "LOCKBUD-DOUBLELOCK");
        assert_eq!(f.file, "src/lib.rs");
        assert_eq!(f.severity, Severity::Critical);
        assert_eq!(f.category, "concurrency");
        assert_eq!(f.recommendation, "Acquire locks in a consistent order");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_tool_without_output_is_an_error() {
        let dir = TempDir::new().unwrap();
        let checker = ExternalChecker::new(
            meta(),
            ToolInvocation::new("sh", &["-c", "echo broken >&2; exit 3"], ToolOutput::GnuStyle),
        );
        let err = checker
            .scan(dir.path(), &ScanOptions::new(dir.path()))
            .await
            .unwrap_err();
        match err {
            CoreError::ToolFailed { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("broken"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn tool_output_is_parsed() {
        let dir = TempDir::new().unwrap();
        let checker = ExternalChecker::new(
            CheckerMeta::new("cppcheck", "Cppcheck", Language::Cpp),
            ToolInvocation::new(
                "sh",
                &["-c", "echo 'a.c:2:3: error: Null pointer dereference [nullPointer]' >&2; exit 1"],
                ToolOutput::GnuStyle,
            ),
        );
        let findings = checker
            .scan(dir.path(), &ScanOptions::new(dir.path()))
            .await
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "nullpointer");
        assert_eq!(findings[0].file, "a.c");
        assert_eq!(findings[0].line, 2);
    }
}
