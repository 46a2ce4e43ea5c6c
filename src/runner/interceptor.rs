//! Hooks around every step invocation.

use super::context::BuildStepContext;
use super::step_runner::StepRecord;

/// Observes or adjusts each step invocation of a pipeline run.
///
/// `before` runs once the next step is scheduled, so it may replace it via
/// [`BuildStepContext::set_build_step`]. `after` runs once the step has
/// returned; overriding the slot there has no effect.
///
/// A panic in `before` is recorded as `(ERROR, HALT)`, which stops a build
/// phase before the scheduled step runs. A panic in `after` is only logged.
pub trait StepInterceptor: Send + Sync {
    fn before(&self, _context: &mut BuildStepContext) {}

    fn after(&self, _context: &mut BuildStepContext, _record: &StepRecord) {}
}
