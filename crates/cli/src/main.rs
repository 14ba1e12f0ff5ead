use anyhow::{Context, Result, bail};
use clap::Parser;

use fabflow_catalog::ProductCatalog;
use fabflow_cli::{Cli, Command, demo, render, script};
use fabflow_lifecycle::{LifecycleConfig, OrderLifecycleManager};

fn main() -> Result<()> {
    let cli = Cli::parse();
    fabflow_observability::init();

    let config = LifecycleConfig::from_env().context("invalid lifecycle configuration")?;
    tracing::debug!(?config, "configuration loaded");
    let mut manager = OrderLifecycleManager::new(ProductCatalog::sample(), config);

    match cli.command {
        Command::Catalog => {
            print!("{}", render::catalog(manager.catalog(), cli.format)?);
        }
        Command::Demo => {
            demo::run(&mut manager).context("demo scenario failed")?;
            print!("{}", render::report(&manager, cli.format)?);
        }
        Command::Run { script, keep_going } => {
            let ops = script::load_script(&script)?;
            let outcome = script::execute(&mut manager, &ops, keep_going);
            print!("{}", render::report(&manager, cli.format)?);

            tracing::info!(
                applied = outcome.applied,
                failed = outcome.failures.len(),
                "script finished"
            );
            if !keep_going {
                if let Some(failure) = outcome.failures.first() {
                    bail!(
                        "step {} ({}) failed: {}",
                        failure.step,
                        failure.op,
                        failure.error
                    );
                }
            }
        }
    }

    Ok(())
}
