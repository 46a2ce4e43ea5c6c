//! Shell command execution for shell build steps.

pub mod command;

pub use command::{execute, CommandOptions, CommandResult};
