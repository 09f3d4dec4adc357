// src/bin/actio.rs

use actio::{
    cli::{Cli, dispatcher, handlers},
    core::{config_loader, registry::ActionRegistry},
    DispatchError,
};
use anyhow::Result;
use clap::Parser;
use colored::*;

/// Exit code for a target that could not be resolved.
const EXIT_UNRESOLVED: i32 = 2;

/// The main entry point of the `actio` binary.
/// It sets up logging, loads the engine config, registers the built-in
/// actions and dispatches the command line, handling every error in one place.
fn main() {
    env_logger::init();

    if let Err(e) = run_cli(Cli::parse()) {
        eprintln!("\n{}: {}", "Error".red().bold(), e);
        let unresolved = matches!(e.downcast_ref::<DispatchError>(), Some(DispatchError::Target(_)));
        std::process::exit(if unresolved { EXIT_UNRESOLVED } else { 1 });
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let mut config = config_loader::load_from(cli.config.as_deref())?;
    if cli.no_typo_correction {
        config.typo.enabled = false;
    }

    let registry = ActionRegistry::new(config);
    handlers::register_builtins(&registry)?;

    dispatcher::dispatch_args(&registry, &cli.into_argv())?;
    Ok(())
}
