use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::render::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "fabflow", about = "Order lifecycle manager for made-to-order products", version)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Output format"
    )]
    pub format: OutputFormat,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the product catalog.
    Catalog,
    /// Run the built-in scenario and print the resulting report.
    Demo,
    /// Execute an operation script and print the resulting report.
    Run {
        /// Path to a JSON array of operations.
        script: PathBuf,
        #[arg(
            long,
            action = ArgAction::SetTrue,
            help = "Continue after a failed step instead of stopping"
        )]
        keep_going: bool,
    },
}
