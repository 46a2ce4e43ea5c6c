//! Pipeline definition validation.
//!
//! Catches definitions that would only fail once a build is running:
//! empty commands and empty parameter names.

use crate::config::schema::{PipelineConfig, StepConfig};
use crate::error::{Result, VanillaError};

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Location of the problem, e.g. `steps[2]`.
    pub location: String,
    /// What is wrong.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Collect every problem in a pipeline definition.
pub fn validate_config(config: &PipelineConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for name in config.parameters.keys() {
        if name.trim().is_empty() {
            errors.push(ValidationError {
                location: "parameters".to_string(),
                message: "parameter name must not be empty".to_string(),
            });
        }
    }

    check_steps("steps", &config.steps, &mut errors);
    check_steps("post_build", &config.post_build, &mut errors);

    errors
}

/// Validate a pipeline definition, failing on the first batch of problems.
///
/// # Errors
///
/// Returns `ConfigValidationError` listing every problem found.
pub fn validate(config: &PipelineConfig) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        return Ok(());
    }

    let message = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    Err(VanillaError::ConfigValidationError { message })
}

fn check_steps(section: &str, steps: &[StepConfig], errors: &mut Vec<ValidationError>) {
    for (index, step) in steps.iter().enumerate() {
        let location = format!("{}[{}]", section, index);
        match step {
            StepConfig::Shell(shell) => {
                if shell.command.trim().is_empty() {
                    errors.push(ValidationError {
                        location: location.clone(),
                        message: "shell step has no command to execute".to_string(),
                    });
                }
                if matches!(&shell.capture, Some(name) if name.trim().is_empty()) {
                    errors.push(ValidationError {
                        location,
                        message: "capture parameter name must not be empty".to_string(),
                    });
                }
            }
            StepConfig::Parameter(param) => {
                if param.name.trim().is_empty() {
                    errors.push(ValidationError {
                        location,
                        message: "parameter name must not be empty".to_string(),
                    });
                }
            }
            StepConfig::Result(_) => {}
        }
    }
}
