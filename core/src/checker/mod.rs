//! Checker contract and the finding model every checker produces.

pub mod catalog;
pub mod external;
pub mod parsers;
pub mod pattern;
pub mod registry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::path::Path;

use crate::error::Result;
use crate::options::ScanOptions;
use crate::rules::matcher::MatchLocation;
use crate::rules::model::{Confidence, Rule, Severity};
use crate::walker::Language;

/// 漏洞发现结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Human-readable identifier, e.g. `RUDRA-PANIC-SAFETY`.
    pub id: String,
    /// Stable hash of checker, rule and location.
    pub fingerprint: String,
    pub title: String,
    pub severity: Severity,
    pub category: String,
    pub checker_id: String,
    /// Path relative to the project root, `/`-separated.
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub rule_id: String,
    pub description: String,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
}

impl Finding {
    pub fn from_rule_match(
        meta: &CheckerMeta,
        rule: &Rule,
        root: &Path,
        file: &Path,
        location: &MatchLocation,
        line_text: Option<&str>,
    ) -> Self {
        let file = relative_path(root, file);
        let file_name = file.rsplit('/').next().unwrap_or(&file).to_string();
        let summary = if rule.description.is_empty() {
            &rule.name
        } else {
            &rule.description
        };
        Finding {
            id: finding_id(&meta.id, &rule.id),
            fingerprint: fingerprint(&meta.id, &rule.id, &file, location.line, location.column),
            title: rule.name.clone(),
            severity: rule.severity,
            category: rule
                .category
                .clone()
                .unwrap_or_else(|| meta.category.clone()),
            checker_id: meta.id.clone(),
            line: location.line,
            column: location.column,
            rule_id: rule.id.clone(),
            description: format!("{} in {}", summary, file_name),
            recommendation: rule.recommendation.clone().unwrap_or_default(),
            code_snippet: line_text
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            confidence: rule.confidence,
            file,
        }
    }
}

pub fn finding_id(checker_id: &str, rule_id: &str) -> String {
    format!("{}-{}", checker_id, rule_id).to_uppercase()
}

pub fn fingerprint(checker_id: &str, rule_id: &str, file: &str, line: usize, column: usize) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("{checker_id}\0{rule_id}\0{file}\0{line}\0{column}").as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest.chars().take(16).collect()
}

/// `file` relative to `root` with forward slashes; falls back to the full path.
pub fn relative_path(root: &Path, file: &Path) -> String {
    let rel = match file.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel,
        _ => file,
    };
    rel.to_string_lossy().replace('\\', "/")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    Static,
    Dynamic,
    Verifier,
}

impl std::str::FromStr for AnalyzerKind {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(AnalyzerKind::Static),
            "dynamic" => Ok(AnalyzerKind::Dynamic),
            "verifier" => Ok(AnalyzerKind::Verifier),
            other => Err(crate::error::CoreError::Config(format!(
                "unknown analyzer type: {other}"
            ))),
        }
    }
}

/// How a checker produces findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    Pattern,
    External,
    ExternalWithFallback,
}

/// Static description shared by both checker variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerMeta {
    pub id: String,
    pub name: String,
    pub description: String,
    pub language: Language,
    pub category: String,
    pub severity: Severity,
    pub kind: AnalyzerKind,
}

impl CheckerMeta {
    pub fn new(id: &str, name: &str, language: Language) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            language,
            category: "static-analysis".to_string(),
            severity: Severity::Medium,
            kind: AnalyzerKind::Static,
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn kind(mut self, kind: AnalyzerKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Listing entry for `list-checkers`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckerInfo {
    #[serde(flatten)]
    pub meta: CheckerMeta,
    pub available: bool,
    pub backend: Backend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_hint: Option<String>,
}

/// 检查器 trait - 所有检查器都需要实现此接口
#[async_trait]
pub trait Checker: Send + Sync {
    fn meta(&self) -> &CheckerMeta;

    fn backend(&self) -> Backend;

    /// Cheap and side-effect free.
    fn is_available(&self) -> bool;

    /// Scan the project under `root`. A file that cannot be read is skipped,
    /// never fatal for the whole scan.
    async fn scan(&self, root: &Path, options: &ScanOptions) -> Result<Vec<Finding>>;

    fn install_hint(&self) -> Option<&str> {
        None
    }

    fn id(&self) -> &str {
        &self.meta().id
    }

    fn name(&self) -> &str {
        &self.meta().name
    }

    fn language(&self) -> Language {
        self.meta().language
    }

    fn category(&self) -> &str {
        &self.meta().category
    }

    fn severity(&self) -> Severity {
        self.meta().severity
    }

    fn kind(&self) -> AnalyzerKind {
        self.meta().kind
    }

    fn info(&self) -> CheckerInfo {
        CheckerInfo {
            meta: self.meta().clone(),
            available: self.is_available(),
            backend: self.backend(),
            install_hint: self.install_hint().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn relative_paths_use_forward_slashes() {
        let root = PathBuf::from("/project");
        assert_eq!(relative_path(&root, &root.join("src").join("a.rs")), "src/a.rs");
        assert_eq!(relative_path(&root, Path::new("/elsewhere/b.rs")), "/elsewhere/b.rs");
    }

    #[test]
    fn fingerprints_are_stable_and_location_sensitive() {
        let a = fingerprint("rudra", "panic-safety", "src/a.rs", 3, 1);
        assert_eq!(a, fingerprint("rudra", "panic-safety", "src/a.rs", 3, 1));
        assert_ne!(a, fingerprint("rudra", "panic-safety", "src/a.rs", 4, 1));
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn identifiers_are_upper_case() {
        assert_eq!(finding_id("rudra", "panic-safety"), "RUDRA-PANIC-SAFETY");
    }
}
