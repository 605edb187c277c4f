//! Scan driver: walk, dispatch, join, aggregate.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::aggregator::{Aggregator, CheckerRun, Metadata, RunStatus, ScanResult};
use crate::checker::registry::CheckerRegistry;
use crate::checker::{Checker, Finding};
use crate::error::{CoreError, Result};
use crate::options::ScanOptions;
use crate::report::ReportFormatter;
use crate::walker::ProjectWalker;

pub const TOOL_NAME: &str = "SwarmSight";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Walking,
    Dispatching,
    Running,
    Aggregating,
    Done,
    Failed,
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanPhase::Idle => "idle",
            ScanPhase::Walking => "walking",
            ScanPhase::Dispatching => "dispatching",
            ScanPhase::Running => "running",
            ScanPhase::Aggregating => "aggregating",
            ScanPhase::Done => "done",
            ScanPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of one checker task, before it is folded into the ledger.
enum TaskOutcome {
    Finished(Result<Vec<Finding>>),
    TimedOut,
}

/// A rendered report alongside the result it was produced from.
pub struct ScanReport {
    pub result: ScanResult,
    pub bytes: Vec<u8>,
    pub extension: &'static str,
    pub mime_type: &'static str,
}

/// 扫描调度器
///
/// Owns the registry and the report formatter chosen at start-up. Every
/// selected checker runs as its own task; results are merged in dispatch
/// order once all of them have finished.
pub struct Orchestrator {
    registry: CheckerRegistry,
    formatter: Arc<dyn ReportFormatter>,
    phase: Mutex<ScanPhase>,
}

impl Orchestrator {
    pub fn new(registry: CheckerRegistry, formatter: Arc<dyn ReportFormatter>) -> Self {
        Self {
            registry,
            formatter,
            phase: Mutex::new(ScanPhase::Idle),
        }
    }

    pub fn registry(&self) -> &CheckerRegistry {
        &self.registry
    }

    pub fn phase(&self) -> ScanPhase {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn transition(&self, next: ScanPhase) {
        let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
        let from = *phase;
        tracing::debug!(%from, to = %next, "scan phase");
        *phase = next;
    }

    fn fail(&self, err: CoreError) -> CoreError {
        self.transition(ScanPhase::Failed);
        tracing::error!(error = %err, "scan failed");
        err
    }

    /// Scan and render with the configured formatter.
    pub async fn run(&self, options: &ScanOptions) -> Result<ScanReport> {
        let result = self.scan(options).await?;
        let bytes = self.formatter.format(&result).map_err(|e| self.fail(e))?;
        Ok(ScanReport {
            result,
            bytes,
            extension: self.formatter.file_extension(),
            mime_type: self.formatter.mime_type(),
        })
    }

    pub async fn scan(&self, options: &ScanOptions) -> Result<ScanResult> {
        self.transition(ScanPhase::Walking);
        let root = options.project_path.clone();
        if !root.exists() {
            return Err(self.fail(CoreError::InvalidProjectPath(root)));
        }

        let walker = ProjectWalker::new(&options.exclude);
        let walk_root = root.clone();
        let inventory = tokio::task::spawn_blocking(move || walker.walk(&walk_root))
            .await
            .map_err(|e| self.fail(CoreError::Checker(format!("project walk failed: {e}"))))?;
        let languages = inventory.languages();
        tracing::info!(
            project = %root.display(),
            files = inventory.file_count(),
            languages = ?languages,
            "project walked"
        );

        self.transition(ScanPhase::Dispatching);
        let applicable = |c: &Arc<dyn Checker>| languages.contains(&c.language());
        let dispatched: Vec<Arc<dyn Checker>> = self
            .registry
            .available(options)
            .into_iter()
            .filter(applicable)
            .collect();
        let unavailable: Vec<Arc<dyn Checker>> = self
            .registry
            .unavailable(options)
            .into_iter()
            .filter(applicable)
            .collect();
        for checker in &unavailable {
            tracing::info!(checker = %checker.id(), "checker unavailable, not dispatched");
        }

        self.transition(ScanPhase::Running);
        let started = Instant::now();
        let shared = Arc::new(options.clone());
        let handles: Vec<JoinHandle<(TaskOutcome, Duration)>> = dispatched
            .iter()
            .map(|checker| spawn_checker(checker.clone(), root.clone(), shared.clone()))
            .collect();
        tracing::info!(checkers = handles.len(), "checkers dispatched");

        // 按派发顺序收集结果
        let mut outcomes = Vec::with_capacity(handles.len());
        for (checker, handle) in dispatched.iter().zip(handles) {
            outcomes.push((checker, handle.await));
        }

        self.transition(ScanPhase::Aggregating);
        let mut aggregator = Aggregator::new(options.severity);
        let mut runs = Vec::with_capacity(outcomes.len() + unavailable.len());
        for (checker, outcome) in outcomes {
            let run = match outcome {
                Ok((TaskOutcome::Finished(Ok(findings)), elapsed)) => {
                    let produced = findings.len();
                    let kept = aggregator.add_batch(findings);
                    tracing::info!(checker = %checker.id(), findings = produced, kept, elapsed_ms = elapsed.as_millis() as u64, "checker completed");
                    record(checker.as_ref(), RunStatus::Completed, elapsed, kept, None)
                }
                Ok((TaskOutcome::Finished(Err(err)), elapsed)) => {
                    let status = match err {
                        CoreError::CheckerUnavailable(_) => RunStatus::Unavailable,
                        _ => RunStatus::Failed,
                    };
                    tracing::warn!(checker = %checker.id(), error = %err, "checker failed");
                    record(checker.as_ref(), status, elapsed, 0, Some(err.to_string()))
                }
                Ok((TaskOutcome::TimedOut, elapsed)) => {
                    tracing::warn!(checker = %checker.id(), timeout_secs = options.timeout().as_secs(), "checker timed out");
                    let message = format!("timed out after {}s", options.timeout().as_secs());
                    record(checker.as_ref(), RunStatus::TimedOut, elapsed, 0, Some(message))
                }
                Err(join_err) => {
                    let message = if join_err.is_panic() {
                        "checker panicked".to_string()
                    } else {
                        join_err.to_string()
                    };
                    tracing::warn!(checker = %checker.id(), error = %message, "checker task aborted");
                    record(checker.as_ref(), RunStatus::Failed, started.elapsed(), 0, Some(message))
                }
            };
            runs.push(run);
        }
        for checker in &unavailable {
            let hint = checker
                .install_hint()
                .map(|h| format!("not installed; install with: {h}"))
                .unwrap_or_else(|| "not installed".to_string());
            runs.push(record(checker.as_ref(), RunStatus::Unavailable, Duration::ZERO, 0, Some(hint)));
        }

        let metadata = Metadata {
            tool: TOOL_NAME.to_string(),
            version: VERSION.to_string(),
            scan_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().to_rfc3339(),
            project_name: project_name(&root),
            project_path: root.clone(),
            languages: languages.iter().copied().collect(),
            options: options.clone(),
            checkers: runs,
        };
        let result = aggregator.finish(metadata);
        self.transition(ScanPhase::Done);
        tracing::info!(
            findings = result.summary.total,
            score = result.score.value,
            rating = %result.score.rating,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scan finished"
        );
        Ok(result)
    }
}

fn spawn_checker(
    checker: Arc<dyn Checker>,
    root: PathBuf,
    options: Arc<ScanOptions>,
) -> JoinHandle<(TaskOutcome, Duration)> {
    tokio::spawn(async move {
        let start = Instant::now();
        tracing::debug!(checker = %checker.id(), "checker started");
        let outcome = match tokio::time::timeout(options.timeout(), checker.scan(&root, &options)).await {
            Ok(result) => TaskOutcome::Finished(result),
            Err(_) => TaskOutcome::TimedOut,
        };
        (outcome, start.elapsed())
    })
}

fn record(
    checker: &dyn Checker,
    status: RunStatus,
    elapsed: Duration,
    findings: usize,
    error: Option<String>,
) -> CheckerRun {
    CheckerRun {
        checker_id: checker.id().to_string(),
        checker_name: checker.name().to_string(),
        language: checker.language(),
        status,
        duration_ms: elapsed.as_millis() as u64,
        findings,
        error,
    }
}

fn project_name(root: &Path) -> String {
    let resolved = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| resolved.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{Backend, CheckerMeta};
    use crate::report::json::JsonFormatter;
    use crate::walker::Language;
    use async_trait::async_trait;
    use std::fs;
    use tempfile::TempDir;

    struct Scripted {
        meta: CheckerMeta,
        behaviour: Behaviour,
    }

    enum Behaviour {
        Findings(usize),
        Fails,
        Panics,
        Hangs,
    }

    #[async_trait]
    impl Checker for Scripted {
        fn meta(&self) -> &CheckerMeta {
            &self.meta
        }

        fn backend(&self) -> Backend {
            Backend::Pattern
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn scan(&self, _root: &Path, _options: &ScanOptions) -> Result<Vec<Finding>> {
            match self.behaviour {
                Behaviour::Findings(n) => Ok((0..n).map(|i| finding(&self.meta.id, i)).collect()),
                Behaviour::Fails => Err(CoreError::Checker("boom".into())),
                Behaviour::Panics => panic!("checker bug"),
                Behaviour::Hangs => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    fn finding(checker: &str, i: usize) -> Finding {
        Finding {
            id: format!("{checker}-{i}"),
            fingerprint: String::new(),
            title: "t".into(),
            severity: crate::rules::model::Severity::High,
            category: "c".into(),
            checker_id: checker.into(),
            file: "a.rs".into(),
            line: i + 1,
            column: 1,
            rule_id: "r".into(),
            description: String::new(),
            recommendation: String::new(),
            code_snippet: None,
            confidence: None,
        }
    }

    fn scripted(id: &str, behaviour: Behaviour) -> Scripted {
        Scripted {
            meta: CheckerMeta::new(id, id, Language::Rust),
            behaviour,
        }
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}\n").unwrap();
        dir
    }

    #[tokio::test]
    async fn failures_are_isolated_and_order_is_dispatch_order() {
        let dir = project();
        let mut registry = CheckerRegistry::new();
        registry.register(scripted("hang", Behaviour::Hangs));
        registry.register(scripted("first", Behaviour::Findings(2)));
        registry.register(scripted("fails", Behaviour::Fails));
        registry.register(scripted("panics", Behaviour::Panics));
        registry.register(scripted("second", Behaviour::Findings(1)));

        let orchestrator = Orchestrator::new(registry, Arc::new(JsonFormatter));
        let options = ScanOptions {
            timeout_secs: 1,
            ..ScanOptions::new(dir.path())
        };
        let result = orchestrator.scan(&options).await.unwrap();

        let owners: Vec<_> = result.findings.iter().map(|f| f.checker_id.as_str()).collect();
        assert_eq!(owners, vec!["first", "first", "second"]);
        let statuses: Vec<_> = result.metadata.checkers.iter().map(|r| (r.checker_id.as_str(), r.status)).collect();
        assert_eq!(
            statuses,
            vec![
                ("hang", RunStatus::TimedOut),
                ("first", RunStatus::Completed),
                ("fails", RunStatus::Failed),
                ("panics", RunStatus::Failed),
                ("second", RunStatus::Completed),
            ]
        );
        assert_eq!(orchestrator.phase(), ScanPhase::Done);
    }

    #[tokio::test]
    async fn checkers_for_absent_languages_are_not_dispatched() {
        let dir = project();
        let mut registry = CheckerRegistry::new();
        registry.register(Scripted {
            meta: CheckerMeta::new("go-only", "Go only", Language::Go),
            behaviour: Behaviour::Findings(3),
        });
        let orchestrator = Orchestrator::new(registry, Arc::new(JsonFormatter));
        let result = orchestrator.scan(&ScanOptions::new(dir.path())).await.unwrap();
        assert_eq!(result.summary.total, 0);
        assert!(result.metadata.checkers.is_empty());
        assert_eq!(result.metadata.languages, vec![Language::Rust]);
    }

    #[tokio::test]
    async fn missing_project_is_fatal() {
        let orchestrator = Orchestrator::new(CheckerRegistry::new(), Arc::new(JsonFormatter));
        let err = orchestrator
            .scan(&ScanOptions::new("/definitely/not/here"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidProjectPath(_)));
        assert_eq!(orchestrator.phase(), ScanPhase::Failed);
    }

    #[tokio::test]
    async fn run_renders_with_the_injected_formatter() {
        let dir = project();
        let mut registry = CheckerRegistry::new();
        registry.register(scripted("first", Behaviour::Findings(1)));
        let orchestrator = Orchestrator::new(registry, Arc::new(JsonFormatter));
        let report = orchestrator.run(&ScanOptions::new(dir.path())).await.unwrap();
        assert_eq!(report.extension, "json");
        let parsed: ScanResult = serde_json::from_slice(&report.bytes).unwrap();
        assert_eq!(parsed.summary.total, 1);
    }
}
