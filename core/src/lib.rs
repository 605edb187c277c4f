// SwarmSight Core Library
// 核心功能库，包含规则匹配、检查器、调度器与报告格式化

pub mod aggregator;
pub mod checker;
pub mod options;
pub mod orchestrator;
pub mod report;
pub mod rules;
pub mod walker;

// 重新导出常用类型
pub use aggregator::{CheckerRun, Rating, RiskScore, RunStatus, ScanResult, Summary};
pub use checker::registry::CheckerRegistry;
pub use checker::{AnalyzerKind, Backend, Checker, CheckerInfo, CheckerMeta, Finding};
pub use options::{CheckerSelection, ScanOptions};
pub use orchestrator::{Orchestrator, ScanPhase, ScanReport, TOOL_NAME, VERSION};
pub use report::{formatter_for, ReportFormat, ReportFormatter};
pub use walker::{detect_languages, Language};

// 规则系统
pub use rules::{loader::load_rules_from_dir, model::Rule, model::Severity};

pub mod error {
    use std::path::PathBuf;
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum CoreError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("project path does not exist: {}", .0.display())]
        InvalidProjectPath(PathBuf),

        #[error("unsupported output format: {0}")]
        UnsupportedFormat(String),

        #[error("invalid severity: {0}")]
        InvalidSeverity(String),

        #[error("invalid pattern in rule {rule}: {reason}")]
        InvalidPattern { rule: String, reason: String },

        #[error("rule load error: {0}")]
        RuleLoad(String),

        #[error("configuration error: {0}")]
        Config(String),

        #[error("checker unavailable: {0}")]
        CheckerUnavailable(String),

        #[error("{tool} exited with {code:?}: {stderr}")]
        ToolFailed {
            tool: String,
            code: Option<i32>,
            stderr: String,
        },

        #[error("Checker error: {0}")]
        Checker(String),

        #[error("serialization error: {0}")]
        Serialization(String),
    }

    pub type Result<T> = std::result::Result<T, CoreError>;
}
