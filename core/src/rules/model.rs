use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Declarative rule, as written in YAML rule packs or the built-in tables.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub severity: Severity,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Match against the whole file instead of line by line.
    #[serde(default)]
    pub multiline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwe: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RuleSet {
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub rules: Vec<Rule>,
}

/// 严重程度
///
/// The five levels are the only ones that take part in scoring. Anything a
/// tool reports outside of them is kept as `Unknown` so it still shows up in
/// the totals.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
    #[serde(other)]
    Unknown,
}

impl Severity {
    pub const LEVELS: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 5,
            Severity::High => 4,
            Severity::Medium => 3,
            Severity::Low => 2,
            Severity::Info => 1,
            Severity::Unknown => 0,
        }
    }

    /// True when `self` is at or above `floor`. Unknown never clears a floor.
    pub fn at_least(self, floor: Severity) -> bool {
        self != Severity::Unknown && self.rank() >= floor.rank()
    }

    /// Lenient mapping for labels coming out of third-party tools.
    pub fn from_label(label: &str) -> Severity {
        label.parse().unwrap_or(Severity::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
            Severity::Unknown => "unknown",
        }
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            "info" | "informational" => Ok(Severity::Info),
            other => Err(CoreError::InvalidSeverity(other.to_string())),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_floor_ordering() {
        assert!(Severity::Critical.at_least(Severity::Low));
        assert!(Severity::Low.at_least(Severity::Low));
        assert!(!Severity::Info.at_least(Severity::Low));
        assert!(!Severity::Unknown.at_least(Severity::Info));
    }

    #[test]
    fn unrecognised_labels_become_unknown() {
        assert_eq!(Severity::from_label("HIGH"), Severity::High);
        assert_eq!(Severity::from_label("style"), Severity::Unknown);
        assert!("bogus".parse::<Severity>().is_err());
    }

    #[test]
    fn severity_deserialises_unknown_values() {
        let parsed: Vec<Severity> = serde_json::from_str(r#"["critical","weird","info"]"#).unwrap();
        assert_eq!(parsed, vec![Severity::Critical, Severity::Unknown, Severity::Info]);
    }

    #[test]
    fn rule_set_parses_from_yaml() {
        let yaml = r#"
name: team-rules
version: "1"
rules:
  - id: no-eval
    name: Dynamic evaluation
    severity: high
    language: go
    pattern: 'reflect\.ValueOf'
"#;
        let set: RuleSet = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(set.rules.len(), 1);
        assert_eq!(set.rules[0].severity, Severity::High);
        assert!(!set.rules[0].multiline);
    }
}
