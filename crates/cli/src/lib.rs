//! Command-line front end: scripts in, reports out.

pub mod cli;
pub mod demo;
pub mod render;
pub mod script;

pub use cli::{Cli, Command};
pub use render::OutputFormat;
pub use script::{RunOutcome, ScriptOp, StepFailure};
