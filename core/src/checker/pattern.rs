use async_trait::async_trait;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use super::{Backend, Checker, CheckerMeta, Finding};
use crate::error::{CoreError, Result};
use crate::options::ScanOptions;
use crate::rules::matcher::CompiledRule;
use crate::walker::ProjectWalker;

/// Checker that owns a rule list and matches it against source text.
pub struct PatternChecker {
    meta: CheckerMeta,
    rules: Vec<CompiledRule>,
}

impl PatternChecker {
    pub fn new(meta: CheckerMeta, rules: Vec<CompiledRule>) -> Self {
        Self { meta, rules }
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Run every rule against one file's text.
    ///
    /// A rule that panics is dropped for this file only; the remaining rules
    /// and files are unaffected.
    pub fn scan_text(&self, root: &Path, path: &Path, content: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        let lines: Vec<&str> = content.lines().collect();

        for compiled in &self.rules {
            let matches = match catch_unwind(AssertUnwindSafe(|| compiled.evaluate(content))) {
                Ok(matches) => matches,
                Err(_) => {
                    tracing::warn!(
                        checker = %self.meta.id,
                        rule = %compiled.id(),
                        file = %path.display(),
                        "rule evaluation panicked, skipping rule for this file"
                    );
                    continue;
                }
            };

            for location in &matches {
                let line_text = lines.get(location.line.saturating_sub(1)).copied();
                findings.push(Finding::from_rule_match(
                    &self.meta,
                    &compiled.rule,
                    root,
                    path,
                    location,
                    line_text,
                ));
            }
        }
        findings
    }

    async fn collect_files(&self, root: &Path, exclude: &[String]) -> Result<Vec<PathBuf>> {
        let root = root.to_path_buf();
        let walker = ProjectWalker::for_checkers(exclude);
        let language = self.meta.language;
        let inventory = tokio::task::spawn_blocking(move || walker.walk(&root))
            .await
            .map_err(|e| CoreError::Checker(format!("file walk failed: {e}")))?;
        Ok(inventory.files_for(language).to_vec())
    }
}

#[async_trait]
impl Checker for PatternChecker {
    fn meta(&self) -> &CheckerMeta {
        &self.meta
    }

    fn backend(&self) -> Backend {
        Backend::Pattern
    }

    fn is_available(&self) -> bool {
        !self.rules.is_empty()
    }

    async fn scan(&self, root: &Path, options: &ScanOptions) -> Result<Vec<Finding>> {
        let files = self.collect_files(root, &options.exclude).await?;
        tracing::debug!(checker = %self.meta.id, files = files.len(), "pattern scan started");

        let mut findings = Vec::new();
        for path in &files {
            // Invalid UTF-8 is replaced rather than rejected; legacy encodings
            // still match on their ASCII content.
            match tokio::fs::read(path).await {
                Ok(bytes) => {
                    let content = String::from_utf8_lossy(&bytes);
                    findings.extend(self.scan_text(root, path, &content));
                }
                Err(e) => {
                    tracing::warn!(checker = %self.meta.id, file = %path.display(), error = %e, "skipping unreadable file");
                }
            }
        }
        Ok(findings)
    }
}
