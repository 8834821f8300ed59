mod cli;
mod commands;
mod payload;
mod terminal;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use rulecheck_core::Config;
use rulecheck_rules::{EngineOptions, ExprEvaluator, RuleLoader, RuleSource, ValidationEngine, Validator};

use crate::cli::{CliArgs, Command, GlobalArgs};
use crate::commands::Status;
use crate::terminal::Terminal;

fn main() -> ExitCode {
    rulecheck_core::load_dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let terminal = Terminal::new();

    match run(args, &terminal) {
        Ok(status) => status.exit_code(),
        Err(e) => {
            let _ = terminal.print_error(&format!("{e:#}"));
            Status::Defect.exit_code()
        }
    }
}

fn run(args: CliArgs, terminal: &Terminal) -> Result<Status> {
    let config = resolve_config(&args.global, &args.command);
    config.log_summary();
    debug!(config = %config.summary(), "effective configuration");

    let loader = Arc::new(
        RuleLoader::from_config(&config.rules)
            .with_context(|| format!("failed to open rules directory {}", config.rules.dir.display()))?,
    );

    match args.command {
        Command::Check { reference, all } => match reference {
            Some(reference) if !all => commands::check_reference(loader.as_ref(), &reference, terminal),
            _ => commands::check_all(&loader, terminal),
        },
        Command::Validate {
            reference,
            input,
            lines,
            ..
        } => {
            let source: Arc<dyn RuleSource> = loader;
            let engine = ValidationEngine::new(Arc::new(ExprEvaluator::new()), Arc::clone(&source))
                .with_options(EngineOptions::from(&config.engine));
            let validator = Validator::new(Arc::new(engine), source);
            if lines {
                commands::validate_lines(&validator, &reference, &input, terminal)
            } else {
                commands::validate_one(&validator, &reference, &input, terminal)
            }
        }
    }
}

/// Environment configuration with command-line overrides applied.
///
/// Watching only applies to the long-running `validate --lines` mode.
fn resolve_config(global: &GlobalArgs, command: &Command) -> Config {
    let mut config = match &global.profile {
        Some(profile) => Config::for_profile(profile),
        None => Config::from_env(),
    };
    if let Some(dir) = &global.rules_dir {
        config.rules.dir = dir.clone();
    }
    if let Some(max_depth) = global.max_depth {
        config.engine.max_depth = max_depth.max(1);
    }
    if global.parallel {
        config.engine.parallel = true;
    }
    config.rules.watch = match command {
        Command::Validate {
            lines: true, watch, ..
        } => *watch || config.rules.watch,
        _ => false,
    };
    config
}
