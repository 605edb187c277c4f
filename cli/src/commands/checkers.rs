use anyhow::{bail, Result};
use colored::Colorize;
use std::collections::BTreeMap;

use swarmsight_core::{CheckerInfo, CheckerRegistry, Language};

pub fn list(registry: &CheckerRegistry) {
    let mut by_language: BTreeMap<Language, Vec<CheckerInfo>> = BTreeMap::new();
    for info in registry.describe() {
        by_language.entry(info.meta.language).or_default().push(info);
    }

    for (language, infos) in by_language {
        println!("{}", language.as_str().to_uppercase().bold());
        for info in infos {
            let availability = if info.available {
                "available".green()
            } else {
                "not installed".red()
            };
            println!(
                "  {:<12} {:<14} {:<9} {:<9} {}",
                info.meta.id,
                availability,
                format!("{:?}", info.meta.kind).to_lowercase(),
                info.meta.severity.as_str(),
                info.meta.description.dimmed()
            );
            if !info.available {
                if let Some(hint) = &info.install_hint {
                    println!("  {:<12} {} {}", "", "install:".dimmed(), hint);
                }
            }
        }
        println!();
    }
}

/// Install hint for `name`. Pattern-only checkers need nothing.
pub fn install_hint(registry: &CheckerRegistry, name: &str) -> Result<String> {
    let Some(checker) = registry.get(name) else {
        bail!("unknown checker: {name}");
    };
    Ok(match checker.install_hint() {
        Some(hint) => hint.to_string(),
        None => format!("{} is built in and needs no installation", checker.id()),
    })
}

pub fn install(registry: &CheckerRegistry, name: &str) -> Result<()> {
    let hint = install_hint(registry, name)?;
    println!("{hint}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_for_external_builtin_and_unknown_checkers() {
        let registry = CheckerRegistry::with_builtin();
        assert_eq!(
            install_hint(&registry, "slither").unwrap(),
            "pip3 install slither-analyzer"
        );
        assert!(install_hint(&registry, "erasan").unwrap().contains("built in"));
        assert!(install_hint(&registry, "nope").is_err());
    }
}
