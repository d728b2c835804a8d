// ABOUTME: Command module aggregator for the sortie CLI.
// ABOUTME: Re-exports deploy, current, check, and run command handlers.

mod check;
mod current;
mod deploy;
mod report;
mod run;

pub use check::check;
pub use current::current;
pub use deploy::deploy;
pub use run::run_task;
