use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::{CoreError, Result};
use crate::rules::model::{Rule, RuleSet};

/// Load every `.yaml` / `.yml` rule file below `path`.
///
/// A file may hold a whole `RuleSet` or a single `Rule`. Files that parse as
/// neither are skipped with a warning; an unreadable directory is an error.
pub fn load_rules_from_dir<P: AsRef<Path>>(path: P) -> Result<Vec<Rule>> {
    let path = path.as_ref();
    if !path.is_dir() {
        return Err(CoreError::RuleLoad(format!(
            "rules directory not found: {}",
            path.display()
        )));
    }

    let mut rules = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| CoreError::RuleLoad(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_yaml = path
            .extension()
            .map_or(false, |ext| ext == "yaml" || ext == "yml");
        if !is_yaml {
            continue;
        }

        let content = fs::read_to_string(path)?;
        // 先尝试解析为规则集，再尝试单条规则
        if let Ok(rule_set) = serde_yaml::from_str::<RuleSet>(&content) {
            tracing::debug!(file = %path.display(), set = %rule_set.name, rules = rule_set.rules.len(), "loaded rule set");
            rules.extend(rule_set.rules);
        } else if let Ok(rule) = serde_yaml::from_str::<Rule>(&content) {
            rules.push(rule);
        } else {
            tracing::warn!(file = %path.display(), "failed to parse rule file");
        }
    }

    Ok(rules)
}
