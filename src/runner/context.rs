//! Per-build execution context.
//!
//! One [`BuildStepContext`] exists per pipeline run and is passed by
//! mutable reference to every step, in order. It owns the parameters,
//! the aggregate result/status, the progress counters, and the slot
//! holding the step that is about to run.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::steps::{BuildResult, BuildStatus, BuildStep};

use super::abort::AbortSignal;
use super::aggregator::{merge, Aggregate};
use super::parameters::{ParameterStore, Parameters};
use super::pipeline::Phase;

/// Where the step slot is in its per-position lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    /// Scheduled but not yet invoked; overrides replace the step about to run.
    Scheduling,
    /// The captured step is running; overrides replace the next step.
    Executing { overridden: bool },
    /// The step has returned; overrides are ignored.
    Closed,
}

/// Shared mutable state of a single build run.
pub struct BuildStepContext {
    workspace: PathBuf,
    parameters: ParameterStore,
    aggregate: Aggregate,
    build_step: Option<Arc<dyn BuildStep>>,
    slot: SlotState,
    step_index: usize,
    total_steps: usize,
    phase: Phase,
    abort: AbortSignal,
}

impl BuildStepContext {
    /// Create a context in its initial state: `(SUCCESS, CONTINUE)`, build
    /// phase, no steps counted.
    pub fn new(workspace: impl Into<PathBuf>, parameters: ParameterStore) -> Self {
        Self {
            workspace: workspace.into(),
            parameters,
            aggregate: Aggregate::default(),
            build_step: None,
            slot: SlotState::Closed,
            step_index: 0,
            total_steps: 0,
            phase: Phase::Build,
            abort: AbortSignal::new(),
        }
    }

    /// Attach the run's cancellation signal.
    pub fn with_abort_signal(mut self, abort: AbortSignal) -> Self {
        self.abort = abort;
        self
    }

    /// Snapshot of all parameters: initial ones plus any added by earlier steps.
    pub fn parameters(&self) -> Parameters {
        self.parameters.snapshot()
    }

    /// Working directory of the build. Steps should not touch files outside it.
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Add or overwrite a parameter for later steps.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `name` is empty.
    pub fn add_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        debug!("Adding parameter '{}'", name);
        self.parameters.insert(name, value)
    }

    /// Last known result: usually the worst reported so far, unless a step
    /// forced it.
    pub fn result(&self) -> BuildResult {
        self.aggregate.result
    }

    /// Last known status.
    pub fn status(&self) -> BuildStatus {
        self.aggregate.status
    }

    /// Overwrite result and status, including to a better state than the
    /// current one.
    pub fn force_set_result(&mut self, result: BuildResult, status: BuildStatus) {
        self.apply(Aggregate::new(result, status), true);
    }

    /// Record a result and status without ever improving the build:
    /// the result only changes if `result` is worse, and `Halt` does not
    /// replace `PostBuild`.
    pub fn set_result(&mut self, result: BuildResult, status: BuildStatus) {
        self.apply(Aggregate::new(result, status), false);
    }

    fn apply(&mut self, incoming: Aggregate, forced: bool) {
        let before = self.aggregate;
        self.aggregate = merge(before, incoming, forced);
        if self.aggregate != before {
            debug!(
                "Aggregate {}/{} -> {}/{} (forced: {})",
                before.result,
                before.status,
                self.aggregate.result,
                self.aggregate.status,
                forced
            );
        }
    }

    /// The step that is going to run. From inside a step's `execute`, this
    /// is the running step until it overrides the slot.
    pub fn build_step(&self) -> Option<Arc<dyn BuildStep>> {
        self.build_step.clone()
    }

    /// Override the step slot.
    ///
    /// Before the scheduled step is invoked (interceptor `before` hooks) this
    /// replaces the step about to run. From inside a running step it replaces
    /// the step scheduled at the next position. Once the step has returned
    /// the call has no effect.
    pub fn set_build_step(&mut self, step: Arc<dyn BuildStep>) {
        match self.slot {
            SlotState::Scheduling => {
                debug!("Step '{}' replaces the scheduled step", step.name());
                self.build_step = Some(step);
            }
            SlotState::Executing { .. } => {
                debug!("Step '{}' scheduled to run next", step.name());
                self.build_step = Some(step);
                self.slot = SlotState::Executing { overridden: true };
            }
            SlotState::Closed => {
                debug!(
                    "Ignoring override with '{}': current step already returned",
                    step.name()
                );
            }
        }
    }

    /// Number of steps in the current phase whose `execute` has returned.
    pub fn build_step_index(&self) -> usize {
        self.step_index
    }

    /// Number of steps in the current phase.
    pub fn total_build_steps(&self) -> usize {
        self.total_steps
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the host has requested cancellation of this run.
    pub fn abort_requested(&self) -> bool {
        self.abort.is_aborted()
    }

    pub(crate) fn begin_phase(&mut self, phase: Phase, total_steps: usize) {
        self.phase = phase;
        self.total_steps = total_steps;
        self.step_index = 0;
        self.build_step = None;
        self.slot = SlotState::Closed;
    }

    pub(crate) fn schedule(&mut self, step: Arc<dyn BuildStep>) {
        self.build_step = Some(step);
        self.slot = SlotState::Scheduling;
    }

    /// Read the slot for invocation. Later overrides target the next position.
    pub(crate) fn capture(&mut self) -> Option<Arc<dyn BuildStep>> {
        self.slot = SlotState::Executing { overridden: false };
        self.build_step.clone()
    }

    /// Mark the captured step as returned. Yields the step it asked to run
    /// next, if any.
    pub(crate) fn finish_step(&mut self) -> Option<Arc<dyn BuildStep>> {
        let next = match self.slot {
            SlotState::Executing { overridden: true } => self.build_step.clone(),
            _ => None,
        };
        self.slot = SlotState::Closed;
        self.step_index += 1;
        next
    }

    pub(crate) fn aggregate(&self) -> Aggregate {
        self.aggregate
    }
}

impl fmt::Debug for BuildStepContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildStepContext")
            .field("workspace", &self.workspace)
            .field("parameters", &self.parameters)
            .field("aggregate", &self.aggregate)
            .field("build_step", &self.build_step.as_ref().map(|s| s.name()))
            .field("slot", &self.slot)
            .field("step_index", &self.step_index)
            .field("total_steps", &self.total_steps)
            .field("phase", &self.phase)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VanillaError;

    struct Named(&'static str);

    impl BuildStep for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn execute(&self, _context: &mut BuildStepContext) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn step(name: &'static str) -> Arc<dyn BuildStep> {
        Arc::new(Named(name))
    }

    fn context() -> BuildStepContext {
        BuildStepContext::new("/tmp/ws", ParameterStore::new())
    }

    fn slot_name(ctx: &BuildStepContext) -> Option<String> {
        ctx.build_step().map(|s| s.name().to_string())
    }

    #[test]
    fn starts_successful_and_continuing() {
        let ctx = context();
        assert_eq!(ctx.result(), BuildResult::Success);
        assert_eq!(ctx.status(), BuildStatus::Continue);
        assert_eq!(ctx.build_step_index(), 0);
        assert_eq!(ctx.phase(), Phase::Build);
        assert_eq!(ctx.workspace(), Path::new("/tmp/ws"));
    }

    #[test]
    fn set_result_never_improves() {
        let mut ctx = context();
        ctx.set_result(BuildResult::Failure, BuildStatus::Continue);
        ctx.set_result(BuildResult::Success, BuildStatus::Continue);
        assert_eq!(ctx.result(), BuildResult::Failure);
    }

    #[test]
    fn force_set_result_can_improve() {
        let mut ctx = context();
        ctx.set_result(BuildResult::Error, BuildStatus::Halt);
        ctx.force_set_result(BuildResult::Success, BuildStatus::Continue);
        assert_eq!(ctx.result(), BuildResult::Success);
        assert_eq!(ctx.status(), BuildStatus::Continue);
    }

    #[test]
    fn post_build_absorbs_plain_halt() {
        let mut ctx = context();
        ctx.force_set_result(BuildResult::Success, BuildStatus::PostBuild);
        ctx.set_result(BuildResult::Failure, BuildStatus::Halt);
        assert_eq!(ctx.status(), BuildStatus::PostBuild);
        assert_eq!(ctx.result(), BuildResult::Failure);

        ctx.force_set_result(BuildResult::Failure, BuildStatus::Halt);
        assert_eq!(ctx.status(), BuildStatus::Halt);
    }

    #[test]
    fn add_parameter_overwrites() {
        let mut ctx = context();
        ctx.add_parameter("x", "1").unwrap();
        ctx.add_parameter("x", "2").unwrap();
        assert_eq!(ctx.parameters()["x"], "2");
    }

    #[test]
    fn add_parameter_rejects_empty_name() {
        let mut ctx = context();
        let err = ctx.add_parameter("", "1").unwrap_err();
        assert!(matches!(err, VanillaError::InvalidArgument { .. }));
    }

    #[test]
    fn held_view_survives_add_parameter() {
        let mut ctx = context();
        ctx.add_parameter("a", "1").unwrap();
        let view = ctx.parameters();
        ctx.add_parameter("b", "2").unwrap();

        assert_eq!(view.len(), 1);
        assert_eq!(ctx.parameters().len(), 2);
    }

    #[test]
    fn override_while_scheduling_replaces_current() {
        let mut ctx = context();
        ctx.schedule(step("a"));
        ctx.set_build_step(step("b"));

        let captured = ctx.capture().unwrap();
        assert_eq!(captured.name(), "b");
        assert!(ctx.finish_step().is_none());
    }

    #[test]
    fn override_while_executing_targets_next() {
        let mut ctx = context();
        ctx.schedule(step("a"));
        let captured = ctx.capture().unwrap();
        assert_eq!(captured.name(), "a");
        assert_eq!(slot_name(&ctx).as_deref(), Some("a"));

        ctx.set_build_step(step("b"));
        let next = ctx.finish_step().unwrap();
        assert_eq!(next.name(), "b");
        assert_eq!(ctx.build_step_index(), 1);
    }

    #[test]
    fn override_after_return_is_ignored() {
        let mut ctx = context();
        ctx.schedule(step("a"));
        ctx.capture();
        assert!(ctx.finish_step().is_none());

        ctx.set_build_step(step("late"));
        assert_eq!(slot_name(&ctx).as_deref(), Some("a"));
    }

    #[test]
    fn begin_phase_resets_counters() {
        let mut ctx = context();
        ctx.begin_phase(Phase::Build, 3);
        ctx.schedule(step("a"));
        ctx.capture();
        ctx.finish_step();
        assert_eq!(ctx.build_step_index(), 1);

        ctx.begin_phase(Phase::PostBuild, 2);
        assert_eq!(ctx.build_step_index(), 0);
        assert_eq!(ctx.total_build_steps(), 2);
        assert_eq!(ctx.phase(), Phase::PostBuild);
        assert!(ctx.build_step().is_none());
    }

    #[test]
    fn abort_signal_is_observed() {
        let signal = AbortSignal::new();
        let ctx = context().with_abort_signal(signal.clone());
        assert!(!ctx.abort_requested());
        signal.abort();
        assert!(ctx.abort_requested());
    }
}
