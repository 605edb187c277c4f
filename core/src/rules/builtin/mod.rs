//! Built-in rule tables for the pattern-based checkers and fallbacks.

pub mod cpp;
pub mod go;
pub mod move_lang;
pub mod rust;
pub mod solidity;

use crate::rules::model::{Confidence, Rule, Severity};

/// Static row of a built-in rule table.
pub struct RuleTemplate {
    pub id: &'static str,
    pub pattern: &'static str,
    pub multiline: bool,
    pub severity: Severity,
    pub message: &'static str,
    pub recommendation: &'static str,
}

impl RuleTemplate {
    pub const fn line(
        id: &'static str,
        pattern: &'static str,
        severity: Severity,
        message: &'static str,
        recommendation: &'static str,
    ) -> Self {
        Self {
            id,
            pattern,
            multiline: false,
            severity,
            message,
            recommendation,
        }
    }

    pub const fn block(
        id: &'static str,
        pattern: &'static str,
        severity: Severity,
        message: &'static str,
        recommendation: &'static str,
    ) -> Self {
        Self {
            id,
            pattern,
            multiline: true,
            severity,
            message,
            recommendation,
        }
    }
}

pub(crate) fn expand(
    templates: &[RuleTemplate],
    language: &str,
    category: &str,
    confidence: Confidence,
) -> Vec<Rule> {
    templates
        .iter()
        .map(|t| Rule {
            id: t.id.to_string(),
            name: t.message.to_string(),
            description: t.message.to_string(),
            severity: t.severity,
            language: language.to_string(),
            pattern: Some(t.pattern.to_string()),
            multiline: t.multiline,
            category: Some(category.to_string()),
            recommendation: Some(t.recommendation.to_string()),
            confidence: Some(confidence),
            cwe: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::rules::matcher::CompiledRule;

    #[test]
    fn every_builtin_pattern_compiles() {
        let tables = [
            super::rust::rudra_rules(),
            super::rust::erasan_rules(),
            super::rust::shuttle_rules(),
            super::solidity::solidity_rules(),
            super::go::go_rules(),
            super::cpp::cpp_rules(),
            super::move_lang::move_rules(),
        ];
        for rules in tables {
            assert!(!rules.is_empty());
            for rule in rules {
                let id = rule.id.clone();
                assert!(CompiledRule::compile(rule).is_ok(), "rule {id} failed to compile");
            }
        }
    }
}
