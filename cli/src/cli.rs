//! Command-line surface via `clap`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "swarmsight",
    version,
    about = "Multi-language security scanner for Rust, Solidity, Go, C/C++ and Move",
    long_about = "SwarmSight walks a project, runs every applicable checker concurrently and emits one scored report.\n\nConfiguration precedence: CLI > .swarmsight.yml > defaults.",
    after_help = "Examples:\n  swarmsight scan ./my-project\n  swarmsight scan . --output-format sarif --output-file report.sarif\n  swarmsight scan . --ci --fail-on high\n  swarmsight list-checkers"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct GlobalArgs {
    #[arg(short = 'f', long, global = true, help = "Output format: json|html|markdown|sarif|csv (default: json)")]
    pub output_format: Option<String>,

    #[arg(short = 'o', long, global = true, help = "Write the report to this file instead of stdout")]
    pub output_file: Option<PathBuf>,

    #[arg(short = 's', long, global = true, help = "Minimum severity to report: critical|high|medium|low|info (default: low)")]
    pub severity: Option<String>,

    #[arg(short = 'c', long, global = true, help = "Comma-separated checker ids, names or languages, or \"all\"")]
    pub checkers: Option<String>,

    #[arg(short = 'e', long, global = true, help = "Comma-separated directory names to skip (default: node_modules,target,build,dist)")]
    pub exclude: Option<String>,

    #[arg(long, global = true, help = "Analyzer type filter: static|dynamic|verifier")]
    pub analyzer_type: Option<String>,

    #[arg(long, global = true, help = "Per-checker timeout in seconds (default: 300)")]
    pub timeout: Option<u64>,

    #[arg(long, global = true, help = "Directory of extra YAML rule packs")]
    pub rules_dir: Option<PathBuf>,

    #[arg(long, global = true, action = clap::ArgAction::SetTrue, help = "Exit with code 1 when findings reach --fail-on")]
    pub ci: bool,

    #[arg(long, global = true, help = "Severity that fails a CI run (default: critical)")]
    pub fail_on: Option<String>,

    #[arg(long, global = true, help = "Path to a YAML config file")]
    pub config: Option<PathBuf>,

    #[arg(short = 'v', long, global = true, action = clap::ArgAction::SetTrue, help = "Verbose logging")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Scan a project (default command)
    Scan {
        #[arg(default_value = ".", help = "Project directory")]
        path: PathBuf,
    },
    /// List all checkers and whether they can run here
    ListCheckers,
    /// Show version and platform
    Version,
    /// Print the install command for a checker's external tool
    InstallChecker {
        #[arg(help = "Checker id or name")]
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_is_the_default_and_globals_follow_subcommands() {
        let cli = Cli::try_parse_from(["swarmsight"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from([
            "swarmsight", "scan", "proj", "--ci", "--fail-on", "high", "-f", "sarif",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Scan { path }) => assert_eq!(path, PathBuf::from("proj")),
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(cli.global.ci);
        assert_eq!(cli.global.fail_on.as_deref(), Some("high"));
        assert_eq!(cli.global.output_format.as_deref(), Some("sarif"));
    }

    #[test]
    fn install_checker_requires_a_name() {
        assert!(Cli::try_parse_from(["swarmsight", "install-checker"]).is_err());
        let cli = Cli::try_parse_from(["swarmsight", "install-checker", "slither"]).unwrap();
        assert!(matches!(cli.command, Some(Command::InstallChecker { ref name }) if name == "slither"));
    }
}
