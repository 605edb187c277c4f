use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;
use std::time::Duration;

use crate::checker::{AnalyzerKind, Checker};
use crate::rules::model::Severity;

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

pub fn default_excludes() -> Vec<String> {
    ["node_modules", "target", "build", "dist"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Which checkers the user asked for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckerSelection {
    #[default]
    All,
    /// Tokens matching a checker id, its name (case-insensitive) or its
    /// language tag.
    Only(Vec<String>),
}

impl CheckerSelection {
    /// Parse a comma-separated list; `all` anywhere selects everything.
    pub fn parse(raw: &str) -> Self {
        Self::from_tokens(raw.split(',').map(str::to_string))
    }

    pub fn from_tokens<I: IntoIterator<Item = String>>(tokens: I) -> Self {
        let tokens: Vec<String> = tokens
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() || tokens.iter().any(|t| t.eq_ignore_ascii_case("all")) {
            CheckerSelection::All
        } else {
            CheckerSelection::Only(tokens)
        }
    }

    pub fn matches(&self, checker: &dyn Checker) -> bool {
        match self {
            CheckerSelection::All => true,
            CheckerSelection::Only(tokens) => tokens.iter().any(|token| {
                token == checker.id()
                    || token.eq_ignore_ascii_case(checker.name())
                    || token.eq_ignore_ascii_case(checker.language().as_str())
            }),
        }
    }
}

impl Serialize for CheckerSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CheckerSelection::All => serializer.serialize_str("all"),
            CheckerSelection::Only(tokens) => tokens.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for CheckerSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(String),
            Many(Vec<String>),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::One(s) => CheckerSelection::parse(&s),
            Raw::Many(list) => CheckerSelection::from_tokens(list),
        })
    }
}

/// Read-only configuration for one scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanOptions {
    pub project_path: PathBuf,
    pub checkers: CheckerSelection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer_type: Option<AnalyzerKind>,
    /// Severity floor
    pub severity: Severity,
    pub exclude: Vec<String>,
    pub timeout_secs: u64,
    #[serde(default)]
    pub verbose: bool,
}

impl ScanOptions {
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            project_path: PathBuf::from("."),
            checkers: CheckerSelection::All,
            analyzer_type: None,
            severity: Severity::Low,
            exclude: default_excludes(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_parsing() {
        assert_eq!(CheckerSelection::parse("all"), CheckerSelection::All);
        assert_eq!(CheckerSelection::parse(" , "), CheckerSelection::All);
        assert_eq!(
            CheckerSelection::parse("rudra, shuttle"),
            CheckerSelection::Only(vec!["rudra".into(), "shuttle".into()])
        );
        assert_eq!(CheckerSelection::parse("rudra,ALL"), CheckerSelection::All);
    }

    #[test]
    fn selection_serde_accepts_string_or_list() {
        let all: CheckerSelection = serde_json::from_str(r#""all""#).unwrap();
        assert_eq!(all, CheckerSelection::All);
        let list: CheckerSelection = serde_json::from_str(r#"["kani"]"#).unwrap();
        assert_eq!(list, CheckerSelection::Only(vec!["kani".into()]));
        assert_eq!(serde_json::to_string(&all).unwrap(), r#""all""#);
    }

    #[test]
    fn options_round_trip_through_json() {
        let mut options = ScanOptions::new("/tmp/project");
        options.checkers = CheckerSelection::parse("rust");
        let json = serde_json::to_string(&options).unwrap();
        let back: ScanOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }
}
