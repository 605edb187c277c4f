//! Layered configuration: CLI flags > YAML file > defaults.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use swarmsight_core::error::CoreError;
use swarmsight_core::{AnalyzerKind, CheckerSelection, ReportFormat, ScanOptions, Severity};

use crate::cli::GlobalArgs;

pub const CONFIG_FILE_NAMES: [&str; 2] = [".swarmsight.yml", ".swarmsight.yaml"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Keys accepted in `.swarmsight.yml`.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub output_format: Option<String>,
    pub output_file: Option<PathBuf>,
    pub severity: Option<String>,
    pub checkers: Option<CheckerSelection>,
    pub exclude: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
    pub fail_on: Option<String>,
    pub ci: Option<bool>,
    pub analyzer_type: Option<String>,
    pub rules_dir: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: FileConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        // 相对路径以配置文件所在目录为基准
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.rules_dir = config.rules_dir.map(|p| base.join(p));
        Ok(config)
    }

    /// An explicit `--config` must exist; otherwise look in the project root.
    pub fn discover(explicit: Option<&Path>, project: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        for name in CONFIG_FILE_NAMES {
            let candidate = project.join(name);
            if candidate.is_file() {
                tracing::debug!(config = %candidate.display(), "using project config file");
                return Self::load(&candidate);
            }
        }
        Ok(Self::default())
    }
}

/// Everything one `scan` invocation needs, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub options: ScanOptions,
    pub format: ReportFormat,
    pub output_file: Option<PathBuf>,
    pub ci: bool,
    pub fail_on: Severity,
    pub rules_dir: Option<PathBuf>,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Settings {
    pub fn resolve(args: &GlobalArgs, project: PathBuf, file: FileConfig) -> Result<Self, ConfigError> {
        let format = match args.output_format.as_deref().or(file.output_format.as_deref()) {
            Some(name) => name.parse::<ReportFormat>()?,
            None => ReportFormat::default(),
        };
        let severity = match args.severity.as_deref().or(file.severity.as_deref()) {
            Some(level) => level.parse::<Severity>()?,
            None => Severity::Low,
        };
        let fail_on = match args.fail_on.as_deref().or(file.fail_on.as_deref()) {
            Some(level) => level.parse::<Severity>()?,
            None => Severity::Critical,
        };
        let analyzer_type = match args.analyzer_type.as_deref().or(file.analyzer_type.as_deref()) {
            Some(kind) => Some(kind.parse::<AnalyzerKind>()?),
            None => None,
        };
        let checkers = match &args.checkers {
            Some(raw) => CheckerSelection::parse(raw),
            None => file.checkers.unwrap_or_default(),
        };

        let mut options = ScanOptions::new(project);
        options.checkers = checkers;
        options.analyzer_type = analyzer_type;
        options.severity = severity;
        if let Some(exclude) = args.exclude.as_deref().map(split_list).or(file.exclude) {
            options.exclude = exclude;
        }
        if let Some(timeout) = args.timeout.or(file.timeout_secs) {
            options.timeout_secs = timeout;
        }
        options.verbose = args.verbose;

        Ok(Settings {
            options,
            format,
            output_file: args.output_file.clone().or(file.output_file),
            ci: args.ci || file.ci.unwrap_or(false),
            fail_on,
            rules_dir: args.rules_dir.clone().or(file.rules_dir),
        })
    }
}
