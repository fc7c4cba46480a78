//! stagehook - pre-build hooks for filesystem image and firmware stages
//!
//! Loads `stagehook.toml`, builds the hook registry and drives the
//! requested stages through the pipeline.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use stagehook_config::Config;
use stagehook_events::EventEmitter;
use stagehook_hooks::{HookRegistry, Pipeline};
use stagehook_types::ColorChoice;
use std::process;
use tracing::{debug, info};

/// Directory debug log files are written to, relative to the working directory
const LOGS_DIR: &str = ".stagehook/logs";

fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli) {
        debug!(error = %e, "command failed");
        let _ = OutputRenderer::new(json_mode).render_error(&e);
        process::exit(1);
    }
}

/// Main application logic
fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting stagehook v{}", env!("CARGO_PKG_VERSION"));

    // defaults < file < environment < CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref())?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global)?;

    let renderer = OutputRenderer::new(cli.global.json);

    match cli.command {
        Commands::Stages => renderer.render_stages()?,
        Commands::List { stage } => {
            let registry = HookRegistry::from_config(&config)?;
            renderer.render_hooks(&registry, stage)?;
        }
        Commands::Run { stages } => {
            let registry = HookRegistry::from_config(&config)?;
            let (tx, rx) = stagehook_events::channel();
            if registry.is_empty() {
                tx.emit_warning("no hooks configured; stages run without pre-actions");
            }
            let mut handler = EventHandler::new(
                colors_enabled(config.general.color),
                cli.global.json,
                cli.global.debug,
            );

            let report = handler.render_while(&rx, || {
                Pipeline::new(&registry)
                    .with_event_sender(tx)
                    .with_config_mains(&config)
                    .and_then(|mut pipeline| pipeline.run(&stages))
            })?;
            renderer.render_report(&report)?;
        }
    }

    Ok(())
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &cli::GlobalArgs) -> Result<(), CliError> {
    if let Some(color) = global.color {
        config.general.color = color;
    }

    if let Some(root) = &global.project_root {
        config.override_project_root(root)?;
    }

    Ok(())
}

fn colors_enabled(choice: ColorChoice) -> bool {
    match choice {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    }
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if json_mode {
        // JSON mode: keep stdout clean, only a debug file may receive logs
        if debug_enabled {
            if let Some(file) = create_log_file() {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(debug_filter())
                    .init();
                return;
            }
        }
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else if debug_enabled {
        match create_log_file() {
            Some(file) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(debug_filter())
                    .init();
            }
            None => {
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_env_filter(
                        tracing_subscriber::EnvFilter::try_from_default_env()
                            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                    )
                    .init();
            }
        }
    } else {
        // Normal mode: minimal logging to stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .init();
    }
}

fn debug_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,stagehook=debug,stagehook_hooks=debug")
    })
}

fn create_log_file() -> Option<std::fs::File> {
    let log_dir = std::path::Path::new(LOGS_DIR);
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        eprintln!("Warning: Failed to create log directory: {e}");
        return None;
    }

    let log_file = log_dir.join(format!(
        "stagehook-{}.log",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    ));

    match std::fs::File::create(&log_file) {
        Ok(file) => {
            eprintln!("Debug logging enabled: {}", log_file.display());
            Some(file)
        }
        Err(e) => {
            eprintln!("Warning: Failed to create log file: {e}");
            None
        }
    }
}
