//! Build steps.
//!
//! This module defines the extension point every pipeline is made of:
//!
//! - [`BuildStep`] - A unit of work executed against a [`BuildStepContext`]
//! - [`BuildResult`] - Severity outcome of the build
//! - [`BuildStatus`] - Control signal for the executor
//! - [`builtin`] - Step kinds available to pipeline definition files
//!
//! # Example
//!
//! ```
//! use vanilla::runner::BuildStepContext;
//! use vanilla::steps::{BuildResult, BuildStatus, BuildStep};
//!
//! struct Lint;
//!
//! impl BuildStep for Lint {
//!     fn name(&self) -> &str {
//!         "lint"
//!     }
//!
//!     fn execute(&self, context: &mut BuildStepContext) -> anyhow::Result<()> {
//!         if context.parameters().get("strict").map(String::as_str) == Some("true") {
//!             context.set_result(BuildResult::Failure, BuildStatus::Halt);
//!         }
//!         Ok(())
//!     }
//! }
//! ```

pub mod builtin;
pub mod result;

pub use builtin::{ParameterStep, ResultStep, ShellStep};
pub use result::{BuildResult, BuildStatus};

use crate::runner::BuildStepContext;

/// A unit of pipeline work.
///
/// Steps hold no state between invocations; anything a later step needs
/// goes through the context's parameters. A step signals problems by
/// calling [`BuildStepContext::set_result`], or by returning an error,
/// which the runner records as `(ERROR, HALT)`.
pub trait BuildStep: Send + Sync {
    /// Display name of the step. Defaults to the implementing type's name.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Run the step against the shared build context.
    fn execute(&self, context: &mut BuildStepContext) -> anyhow::Result<()>;
}
