use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use swarmsight_core::{CheckerRegistry, Orchestrator, Severity, Summary};

use crate::cli::GlobalArgs;
use crate::config::{FileConfig, Settings};
use crate::summary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanExit {
    Passed,
    GateFailed,
}

/// CI gate: fail when any finding sits at or above `fail_on`.
pub fn gate_fails(ci: bool, fail_on: Severity, summary: &Summary) -> bool {
    ci && summary.has_at_least(fail_on)
}

pub async fn run(args: &GlobalArgs, path: PathBuf) -> Result<ScanExit> {
    let file = FileConfig::discover(args.config.as_deref(), &path)?;
    let settings = Settings::resolve(args, path, file)?;

    // 加载检查器
    let mut registry = CheckerRegistry::with_builtin();
    if let Some(dir) = &settings.rules_dir {
        registry = registry
            .with_custom_rules(dir)
            .with_context(|| format!("loading rules from {}", dir.display()))?;
    }

    let orchestrator = Orchestrator::new(registry, settings.format.formatter());
    let report = orchestrator.run(&settings.options).await?;

    match &settings.output_file {
        Some(out) => {
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            fs::write(out, &report.bytes).with_context(|| format!("writing {}", out.display()))?;
            tracing::info!(file = %out.display(), format = %settings.format, "report written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&report.bytes).context("writing report to stdout")?;
            stdout.flush().context("flushing stdout")?;
        }
    }

    eprint!("{}", summary::render(&report.result, settings.options.verbose));

    if gate_fails(settings.ci, settings.fail_on, &report.result.summary) {
        tracing::warn!(fail_on = %settings.fail_on, "CI gate failed");
        return Ok(ScanExit::GateFailed);
    }
    Ok(ScanExit::Passed)
}
