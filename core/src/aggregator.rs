//! Merge per-checker batches into one [`ScanResult`] and score it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::checker::Finding;
use crate::options::ScanOptions;
use crate::rules::model::Severity;
use crate::walker::Language;

/// Counts per severity. `total` always equals the number of findings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    pub unknown: usize,
}

impl Summary {
    pub fn tally(findings: &[Finding]) -> Self {
        let mut summary = Summary::default();
        for finding in findings {
            summary.record(finding.severity);
        }
        summary
    }

    fn record(&mut self, severity: Severity) {
        self.total += 1;
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
            Severity::Info => self.info += 1,
            Severity::Unknown => self.unknown += 1,
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Info => self.info,
            Severity::Unknown => self.unknown,
        }
    }

    /// Whether any finding sits at or above `threshold`. Unknown never counts.
    pub fn has_at_least(&self, threshold: Severity) -> bool {
        Severity::LEVELS
            .iter()
            .any(|&level| level.at_least(threshold) && self.count(level) > 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl Rating {
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => Rating::Excellent,
            75..=89 => Rating::Good,
            50..=74 => Rating::Fair,
            25..=49 => Rating::Poor,
            _ => Rating::Critical,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Excellent => "Excellent",
            Rating::Good => "Good",
            Rating::Fair => "Fair",
            Rating::Poor => "Poor",
            Rating::Critical => "Critical",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 风险评分 (0-100, higher is safer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskScore {
    pub value: u8,
    pub rating: Rating,
}

impl RiskScore {
    pub fn from_summary(summary: &Summary) -> Self {
        if summary.total == 0 {
            return RiskScore {
                value: 100,
                rating: Rating::Excellent,
            };
        }
        let deduction = summary.critical as f64 * 20.0
            + summary.high as f64 * 10.0
            + summary.medium as f64 * 5.0
            + summary.low as f64
            + summary.info as f64 * 0.5;
        let raw = (100.0 - deduction).clamp(0.0, 100.0);
        let value = (raw * 1.2).clamp(0.0, 100.0).round() as u8;
        RiskScore {
            value,
            rating: Rating::from_score(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
    TimedOut,
    Unavailable,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::TimedOut => "timed_out",
            RunStatus::Unavailable => "unavailable",
        }
    }
}

/// What happened to one checker during a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckerRun {
    pub checker_id: String,
    pub checker_name: String,
    pub language: Language,
    pub status: RunStatus,
    pub duration_ms: u64,
    pub findings: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub tool: String,
    pub version: String,
    pub scan_id: String,
    pub timestamp: String,
    pub project_name: String,
    pub project_path: PathBuf,
    pub languages: Vec<Language>,
    pub options: ScanOptions,
    pub checkers: Vec<CheckerRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub metadata: Metadata,
    pub summary: Summary,
    pub findings: Vec<Finding>,
    pub score: RiskScore,
}

/// Single owner of the merged finding list while a scan is aggregated.
pub struct Aggregator {
    floor: Severity,
    findings: Vec<Finding>,
    dropped: usize,
}

impl Aggregator {
    pub fn new(floor: Severity) -> Self {
        Self {
            floor,
            findings: Vec::new(),
            dropped: 0,
        }
    }

    /// Append one checker's batch, keeping its order. Returns how many
    /// findings survived the severity floor.
    pub fn add_batch(&mut self, batch: Vec<Finding>) -> usize {
        let before = self.findings.len();
        for finding in batch {
            if finding.severity == Severity::Unknown || finding.severity.at_least(self.floor) {
                self.findings.push(finding);
            } else {
                self.dropped += 1;
            }
        }
        self.findings.len() - before
    }

    pub fn finish(self, metadata: Metadata) -> ScanResult {
        if self.dropped > 0 {
            tracing::debug!(dropped = self.dropped, floor = %self.floor, "findings below severity floor dropped");
        }
        let summary = Summary::tally(&self.findings);
        let score = RiskScore::from_summary(&summary);
        ScanResult {
            metadata,
            summary,
            findings: self.findings,
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(critical: usize, high: usize, medium: usize, low: usize, info: usize) -> Summary {
        Summary {
            total: critical + high + medium + low + info,
            critical,
            high,
            medium,
            low,
            info,
            unknown: 0,
        }
    }

    #[test]
    fn zero_findings_is_excellent() {
        let score = RiskScore::from_summary(&Summary::default());
        assert_eq!(score.value, 100);
        assert_eq!(score.rating, Rating::Excellent);
    }

    #[test]
    fn documented_examples() {
        let one_critical = RiskScore::from_summary(&summary(1, 0, 0, 0, 0));
        assert_eq!((one_critical.value, one_critical.rating), (96, Rating::Good));

        let mixed = RiskScore::from_summary(&summary(2, 1, 0, 0, 0));
        assert_eq!((mixed.value, mixed.rating), (60, Rating::Fair));

        let floored = RiskScore::from_summary(&summary(10, 0, 0, 0, 0));
        assert_eq!((floored.value, floored.rating), (0, Rating::Critical));

        // raw 95 * 1.2 clamps to 100
        let few_low = RiskScore::from_summary(&summary(0, 0, 0, 5, 0));
        assert_eq!(few_low.value, 100);
    }

    #[test]
    fn only_unknown_findings_score_full_marks_but_count_in_total() {
        let mut s = Summary::default();
        s.record(Severity::Unknown);
        assert_eq!(s.total, 1);
        assert_eq!(RiskScore::from_summary(&s).value, 100);
        assert!(!s.has_at_least(Severity::Info));
    }

    #[test]
    fn score_is_monotone_in_each_count() {
        for base in [(0, 0, 0, 0, 0), (1, 2, 3, 4, 5), (0, 3, 0, 7, 1)] {
            let (c, h, m, l, i) = base;
            let before = RiskScore::from_summary(&summary(c, h, m, l, i)).value;
            for bumped in [
                summary(c + 1, h, m, l, i),
                summary(c, h + 1, m, l, i),
                summary(c, h, m + 1, l, i),
                summary(c, h, m, l + 1, i),
                summary(c, h, m, l, i + 1),
            ] {
                assert!(RiskScore::from_summary(&bumped).value <= before);
            }
        }
    }

    #[test]
    fn rating_thresholds() {
        assert_eq!(Rating::from_score(90), Rating::Excellent);
        assert_eq!(Rating::from_score(89), Rating::Good);
        assert_eq!(Rating::from_score(75), Rating::Good);
        assert_eq!(Rating::from_score(74), Rating::Fair);
        assert_eq!(Rating::from_score(50), Rating::Fair);
        assert_eq!(Rating::from_score(49), Rating::Poor);
        assert_eq!(Rating::from_score(25), Rating::Poor);
        assert_eq!(Rating::from_score(24), Rating::Critical);
    }

    #[test]
    fn ci_gate_threshold() {
        let s = summary(0, 1, 0, 0, 0);
        assert!(s.has_at_least(Severity::High));
        assert!(s.has_at_least(Severity::Low));
        assert!(!s.has_at_least(Severity::Critical));
    }
}
