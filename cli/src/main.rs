use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod config;
mod summary;

use cli::{Cli, Command};
use commands::scan::ScanExit;
use swarmsight_core::CheckerRegistry;

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "swarmsight=debug,swarmsight_core=debug"
    } else {
        "swarmsight=info,swarmsight_core=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn dispatch(cli: Cli) -> Result<ExitCode> {
    let command = cli.command.unwrap_or(Command::Scan {
        path: PathBuf::from("."),
    });
    match command {
        Command::Scan { path } => match commands::scan::run(&cli.global, path).await? {
            ScanExit::Passed => Ok(ExitCode::SUCCESS),
            ScanExit::GateFailed => Ok(ExitCode::from(1)),
        },
        Command::ListCheckers => {
            commands::checkers::list(&CheckerRegistry::with_builtin());
            Ok(ExitCode::SUCCESS)
        }
        Command::Version => {
            commands::version();
            Ok(ExitCode::SUCCESS)
        }
        Command::InstallChecker { name } => {
            commands::checkers::install(&CheckerRegistry::with_builtin(), &name)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 初始化日志
    init_tracing(cli.global.verbose);

    match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}
