//! Validate command implementation.
//!
//! The `vanilla validate` command parses a pipeline definition and reports
//! every problem found, without running any step.

use crate::cli::args::ValidateArgs;
use crate::config::{load_pipeline_file, validate_config};
use crate::error::{Result, VanillaError};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The validate command implementation.
pub struct ValidateCommand {
    args: ValidateArgs,
}

impl ValidateCommand {
    pub fn new(args: ValidateArgs) -> Self {
        Self { args }
    }
}

impl Command for ValidateCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = match load_pipeline_file(&self.args.pipeline) {
            Ok(c) => c,
            Err(VanillaError::ConfigNotFound { path }) => {
                ui.error(&format!("Pipeline file not found: {}", path.display()));
                return Ok(CommandResult::failure(2));
            }
            Err(e @ VanillaError::ConfigParseError { .. }) => {
                ui.error(&e.to_string());
                return Ok(CommandResult::failure(1));
            }
            Err(e) => return Err(e),
        };

        let errors = validate_config(&config);
        if errors.is_empty() {
            ui.success(&format!(
                "{} is valid ({} build, {} post-build steps)",
                self.args.pipeline.display(),
                config.steps.len(),
                config.post_build.len()
            ));
            return Ok(CommandResult::success());
        }

        for error in &errors {
            ui.error(&error.to_string());
        }
        Ok(CommandResult::failure(1))
    }
}
