//! Vanilla - a two-phase build pipeline runner.
//!
//! A pipeline is an ordered list of build steps followed by an ordered list
//! of post-build steps. Steps share one [`runner::BuildStepContext`] through
//! which they read and add parameters, report a result and status, and
//! override the step that runs next. The build phase stops on `HALT`; the
//! post-build phase always runs to completion.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Pipeline definition loading, parsing, and validation
//! - [`error`] - Error types and result aliases
//! - [`runner`] - Execution context, step runner, and pipeline executor
//! - [`shell`] - Shell command execution
//! - [`steps`] - The step trait, results, and built-in step kinds
//! - [`ui`] - Terminal output
//!
//! # Example
//!
//! ```
//! use vanilla::runner::{ParameterStore, Pipeline, PipelineExecutor};
//! use vanilla::steps::{BuildResult, BuildStatus, ParameterStep, ResultStep};
//!
//! let pipeline = Pipeline::new()
//!     .step(ParameterStep::new("version", "1.0"))
//!     .step(ResultStep::new(BuildResult::Failure, BuildStatus::Continue))
//!     .post_build_step(ParameterStep::new("published", "no"));
//!
//! let result = PipelineExecutor::new().run(&pipeline, ParameterStore::new(), ".");
//!
//! assert_eq!(result.result, BuildResult::Failure);
//! assert_eq!(result.status, BuildStatus::PostBuild);
//! assert_eq!(result.parameters["published"], "no");
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod shell;
pub mod steps;
pub mod ui;

pub use error::{Result, VanillaError};
