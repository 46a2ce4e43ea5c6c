//! Pipeline execution core.
//!
//! - [`aggregator`] - Pure result/status merge rules
//! - [`parameters`] - Run-scoped parameter store and snapshot views
//! - [`context`] - Mutable per-build state shared by all steps
//! - [`step_runner`] - One step invocation with failure capture
//! - [`pipeline`] - Build and post-build phase traversal

pub mod abort;
pub mod aggregator;
pub mod context;
pub mod interceptor;
pub mod parameters;
pub mod pipeline;
pub mod step_runner;

pub use abort::AbortSignal;
pub use aggregator::{merge, Aggregate};
pub use context::BuildStepContext;
pub use interceptor::StepInterceptor;
pub use parameters::{ParameterMap, ParameterStore, Parameters};
pub use pipeline::{Phase, Pipeline, PipelineExecutor, PipelineResult, RunProgress};
pub use step_runner::{run_step, StepOutcome, StepRecord};
