//! SARIF 2.1.0 output for code-scanning dashboards.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::ReportFormatter;
use crate::aggregator::ScanResult;
use crate::error::{CoreError, Result};
use crate::rules::model::Severity;

const SCHEMA: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";

pub struct SarifFormatter;

impl ReportFormatter for SarifFormatter {
    fn format(&self, result: &ScanResult) -> Result<Vec<u8>> {
        let report = SarifReport::from_scan_result(result);
        serde_json::to_vec_pretty(&report).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    fn file_extension(&self) -> &'static str {
        "sarif"
    }

    fn mime_type(&self) -> &'static str {
        "application/sarif+json"
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifReport {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub version: String,
    pub runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifRun {
    pub tool: SarifTool,
    pub results: Vec<SarifResult>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifTool {
    pub driver: SarifDriver,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifDriver {
    pub name: String,
    pub version: String,
    pub rules: Vec<SarifRule>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRule {
    pub id: String,
    pub name: String,
    pub short_description: SarifMessage,
    pub help: SarifMessage,
    pub properties: SarifRuleProperties,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifRuleProperties {
    #[serde(rename = "security-severity")]
    pub security_severity: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifResult {
    pub rule_id: String,
    pub level: String,
    pub message: SarifMessage,
    pub locations: Vec<SarifLocation>,
    pub partial_fingerprints: SarifFingerprints,
    pub properties: SarifResultProperties,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifMessage {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLocation {
    pub physical_location: SarifPhysicalLocation,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifPhysicalLocation {
    pub artifact_location: SarifArtifactLocation,
    pub region: SarifRegion,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifArtifactLocation {
    pub uri: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRegion {
    pub start_line: usize,
    pub start_column: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifFingerprints {
    #[serde(rename = "swarmsight/v1")]
    pub swarmsight: String,
}

/// Keeps the exact severity, which `level` alone cannot express.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifResultProperties {
    pub severity: Severity,
    pub checker_id: String,
    pub category: String,
}

pub fn level_for(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical | Severity::High => "error",
        Severity::Medium => "warning",
        Severity::Low | Severity::Info => "note",
        Severity::Unknown => "none",
    }
}

fn security_severity(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "9.5",
        Severity::High => "8.0",
        Severity::Medium => "5.5",
        Severity::Low => "3.0",
        Severity::Info | Severity::Unknown => "0.0",
    }
}

impl SarifReport {
    pub fn from_scan_result(result: &ScanResult) -> Self {
        let mut seen = HashSet::new();
        let rules: Vec<SarifRule> = result
            .findings
            .iter()
            .filter(|f| seen.insert(f.id.clone()))
            .map(|f| SarifRule {
                id: f.id.clone(),
                name: f.rule_id.clone(),
                short_description: SarifMessage { text: f.title.clone() },
                help: SarifMessage {
                    text: f.recommendation.clone(),
                },
                properties: SarifRuleProperties {
                    security_severity: security_severity(f.severity).to_string(),
                    tags: vec!["security".to_string(), f.category.clone()],
                },
            })
            .collect();

        let results = result
            .findings
            .iter()
            .map(|f| SarifResult {
                rule_id: f.id.clone(),
                level: level_for(f.severity).to_string(),
                message: SarifMessage {
                    text: if f.recommendation.is_empty() {
                        f.description.clone()
                    } else {
                        format!("{}\n\nRecommendation: {}", f.description, f.recommendation)
                    },
                },
                locations: vec![SarifLocation {
                    physical_location: SarifPhysicalLocation {
                        artifact_location: SarifArtifactLocation { uri: f.file.clone() },
                        region: SarifRegion {
                            start_line: f.line.max(1),
                            start_column: f.column.max(1),
                        },
                    },
                }],
                partial_fingerprints: SarifFingerprints {
                    swarmsight: f.fingerprint.clone(),
                },
                properties: SarifResultProperties {
                    severity: f.severity,
                    checker_id: f.checker_id.clone(),
                    category: f.category.clone(),
                },
            })
            .collect();

        SarifReport {
            schema: SCHEMA.to_string(),
            version: "2.1.0".to_string(),
            runs: vec![SarifRun {
                tool: SarifTool {
                    driver: SarifDriver {
                        name: result.metadata.tool.clone(),
                        version: result.metadata.version.clone(),
                        rules,
                    },
                },
                results,
            }],
        }
    }
}
