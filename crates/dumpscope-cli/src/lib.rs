// dumpscope CLI - presentation host for the dashboard core
//
// Every command runs one short-lived dashboard session: files are handed to
// the ingestor, completions are applied, and the resulting view model is
// printed once. Nothing is persisted between invocations.

mod args;
mod commands;
mod files;
mod handlers;
mod logging;
pub mod presentation;
pub mod types;

pub use args::{Cli, Commands, ViewArgs};
pub use commands::run;
