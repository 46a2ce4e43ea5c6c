//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Vanilla - two-phase build pipeline runner.
#[derive(Debug, Parser)]
#[command(name = "vanilla")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a pipeline definition
    Run(RunArgs),

    /// Check a pipeline definition without running it
    Validate(ValidateArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Pipeline definition file
    pub pipeline: PathBuf,

    /// Directory steps run in (defaults to the current directory)
    #[arg(short, long, env = "VANILLA_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Set a parameter, overriding the pipeline file (repeatable)
    #[arg(short = 'P', long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ValidateArgs {
    /// Pipeline definition file
    pub pipeline: PathBuf,
}

/// Parse a `key=value` pair. The value may itself contain `=`.
fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.to_string(), value.to_string())),
        Some(_) => Err(format!("missing parameter name in '{}'", raw)),
        None => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_run_with_params() {
        let cli = Cli::parse_from([
            "vanilla", "run", "ci.yml", "-P", "a=1", "--param", "b=x=y", "--json",
        ]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.pipeline, PathBuf::from("ci.yml"));
                assert_eq!(
                    args.params,
                    vec![
                        ("a".to_string(), "1".to_string()),
                        ("b".to_string(), "x=y".to_string())
                    ]
                );
                assert!(args.json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["vanilla", "validate", "ci.yml", "--quiet", "--debug"]);
        assert!(cli.quiet);
        assert!(cli.debug);
        assert!(matches!(cli.command, Commands::Validate(_)));
    }

    #[test]
    fn cli_rejects_malformed_param() {
        let result = Cli::try_parse_from(["vanilla", "run", "ci.yml", "-P", "novalue"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_key_value_rejects_empty_key() {
        assert!(parse_key_value("=1").is_err());
        assert_eq!(
            parse_key_value("k=").unwrap(),
            ("k".to_string(), String::new())
        );
    }
}
