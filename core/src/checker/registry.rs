use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use super::catalog::builtin_checkers;
use super::pattern::PatternChecker;
use super::{Checker, CheckerInfo, CheckerMeta};
use crate::error::Result;
use crate::options::ScanOptions;
use crate::rules::loader::load_rules_from_dir;
use crate::rules::matcher::compile_rules;
use crate::rules::model::Rule;
use crate::walker::Language;

/// Known checkers in declaration order.
#[derive(Clone, Default)]
pub struct CheckerRegistry {
    checkers: Vec<Arc<dyn Checker>>,
}

impl CheckerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin() -> Self {
        Self {
            checkers: builtin_checkers(),
        }
    }

    pub fn register<C: Checker + 'static>(&mut self, checker: C) {
        self.checkers.push(Arc::new(checker));
    }

    pub fn register_arc(&mut self, checker: Arc<dyn Checker>) {
        self.checkers.push(checker);
    }

    pub fn all(&self) -> &[Arc<dyn Checker>] {
        &self.checkers
    }

    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }

    /// Look up by id, or by name ignoring case.
    pub fn get(&self, key: &str) -> Option<Arc<dyn Checker>> {
        self.checkers
            .iter()
            .find(|c| c.id() == key || c.name().eq_ignore_ascii_case(key))
            .cloned()
    }

    fn wanted(&self, options: &ScanOptions) -> impl Iterator<Item = &Arc<dyn Checker>> + '_ {
        let selection = options.checkers.clone();
        let kind = options.analyzer_type;
        self.checkers.iter().filter(move |c| {
            selection.matches(c.as_ref()) && kind.map_or(true, |k| c.kind() == k)
        })
    }

    /// Checkers that are available and match the selection and analyzer type,
    /// in declaration order.
    pub fn available(&self, options: &ScanOptions) -> Vec<Arc<dyn Checker>> {
        self.wanted(options)
            .filter(|c| c.is_available())
            .cloned()
            .collect()
    }

    /// Selected checkers that cannot run on this machine.
    pub fn unavailable(&self, options: &ScanOptions) -> Vec<Arc<dyn Checker>> {
        self.wanted(options)
            .filter(|c| !c.is_available())
            .cloned()
            .collect()
    }

    pub fn describe(&self) -> Vec<CheckerInfo> {
        self.checkers.iter().map(|c| c.info()).collect()
    }

    /// Load a YAML rule pack and register one `custom-<language>` checker per
    /// language it covers. Rules for unknown languages are skipped.
    pub fn with_custom_rules(mut self, dir: &Path) -> Result<Self> {
        let rules = load_rules_from_dir(dir)?;
        let mut by_language: BTreeMap<Language, Vec<Rule>> = BTreeMap::new();
        for rule in rules {
            match Language::from_tag(&rule.language) {
                Some(language) => by_language.entry(language).or_default().push(rule),
                None => tracing::warn!(rule = %rule.id, language = %rule.language, "unsupported rule language, skipping"),
            }
        }

        for (language, rules) in by_language {
            let compiled = compile_rules(rules);
            if compiled.is_empty() {
                continue;
            }
            let id = format!("custom-{}", language);
            tracing::info!(checker = %id, rules = compiled.len(), "registered custom rule pack");
            let meta = CheckerMeta::new(&id, &format!("Custom {} rules", language), language)
                .describe(&format!("User rules loaded from {}", dir.display()))
                .category("custom");
            self.register(PatternChecker::new(meta, compiled));
        }
        Ok(self)
    }
}
