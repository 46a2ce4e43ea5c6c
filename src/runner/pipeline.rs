//! Two-phase pipeline execution.
//!
//! A run walks the build steps in order, stopping early once the status is
//! `Halt`, then switches the status to `PostBuild` (keeping the result) and
//! runs every post-build step unconditionally.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::steps::{BuildResult, BuildStatus, BuildStep};

use super::abort::AbortSignal;
use super::context::BuildStepContext;
use super::interceptor::StepInterceptor;
use super::parameters::{ParameterStore, Parameters};
use super::step_runner::{panic_message, run_step, StepRecord};

/// Execution phase of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Ordinary steps; a `Halt` skips the rest.
    Build,
    /// Cleanup steps; all of them run.
    PostBuild,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Build => "build",
            Phase::PostBuild => "post-build",
        };
        write!(f, "{}", s)
    }
}

/// Ordered build and post-build steps.
#[derive(Clone, Default)]
pub struct Pipeline {
    build_steps: Vec<Arc<dyn BuildStep>>,
    post_build_steps: Vec<Arc<dyn BuildStep>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a build-phase step.
    pub fn step(mut self, step: impl BuildStep + 'static) -> Self {
        self.build_steps.push(Arc::new(step));
        self
    }

    /// Append a post-build-phase step.
    pub fn post_build_step(mut self, step: impl BuildStep + 'static) -> Self {
        self.post_build_steps.push(Arc::new(step));
        self
    }

    pub fn push_step(&mut self, step: Arc<dyn BuildStep>) {
        self.build_steps.push(step);
    }

    pub fn push_post_build_step(&mut self, step: Arc<dyn BuildStep>) {
        self.post_build_steps.push(step);
    }

    pub fn build_steps(&self) -> &[Arc<dyn BuildStep>] {
        &self.build_steps
    }

    pub fn post_build_steps(&self) -> &[Arc<dyn BuildStep>] {
        &self.post_build_steps
    }

    pub fn is_empty(&self) -> bool {
        self.build_steps.is_empty() && self.post_build_steps.is_empty()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = |steps: &[Arc<dyn BuildStep>]| {
            steps.iter().map(|s| s.name().to_string()).collect::<Vec<_>>()
        };
        f.debug_struct("Pipeline")
            .field("build_steps", &names(&self.build_steps))
            .field("post_build_steps", &names(&self.post_build_steps))
            .finish()
    }
}

/// Progress events emitted during a pipeline run.
#[derive(Debug)]
pub enum RunProgress<'a> {
    /// A phase is about to start.
    PhaseStarting { phase: Phase, total: usize },
    /// A step is about to start.
    StepStarting {
        name: &'a str,
        phase: Phase,
        index: usize,
        total: usize,
    },
    /// A step finished.
    StepFinished { record: &'a StepRecord },
    /// A build step was not run because the build halted.
    StepSkipped { name: &'a str },
}

/// Final state of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    /// Last known build result.
    pub result: BuildResult,
    /// Last known build status.
    pub status: BuildStatus,
    /// Full parameter map at the end of the run.
    pub parameters: Parameters,
    /// One record per step invocation, in order.
    pub steps: Vec<StepRecord>,
    /// Names of build steps skipped after a halt.
    pub skipped: Vec<String>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Total duration.
    #[serde(skip)]
    pub duration: Duration,
}

impl PipelineResult {
    /// Whether the build ended with `SUCCESS`.
    pub fn success(&self) -> bool {
        self.result == BuildResult::Success
    }

    /// Records of the steps that ran in the given phase.
    pub fn steps_in(&self, phase: Phase) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(move |r| r.phase == phase)
    }
}

/// Runs pipelines. Each run gets its own [`BuildStepContext`], so one
/// executor may serve independent runs concurrently.
#[derive(Clone, Default)]
pub struct PipelineExecutor {
    interceptors: Vec<Arc<dyn StepInterceptor>>,
    abort: AbortSignal,
}

impl PipelineExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook around every step invocation.
    pub fn with_interceptor(mut self, interceptor: impl StepInterceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Use the given cancellation signal for runs started by this executor.
    pub fn with_abort_signal(mut self, abort: AbortSignal) -> Self {
        self.abort = abort;
        self
    }

    /// Run a pipeline to completion.
    pub fn run(
        &self,
        pipeline: &Pipeline,
        parameters: ParameterStore,
        workspace: impl Into<PathBuf>,
    ) -> PipelineResult {
        self.run_with_progress(pipeline, parameters, workspace, |_| {})
    }

    /// Run a pipeline to completion with a progress callback.
    pub fn run_with_progress(
        &self,
        pipeline: &Pipeline,
        parameters: ParameterStore,
        workspace: impl Into<PathBuf>,
        mut on_progress: impl FnMut(RunProgress<'_>),
    ) -> PipelineResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut context =
            BuildStepContext::new(workspace, parameters).with_abort_signal(self.abort.clone());
        let mut records = Vec::new();
        let mut skipped = Vec::new();

        if pipeline.is_empty() {
            debug!("Pipeline has no steps");
            return Self::finish(&context, records, skipped, started_at, start);
        }

        self.run_phase(
            Phase::Build,
            pipeline.build_steps(),
            &mut context,
            &mut records,
            &mut skipped,
            &mut on_progress,
        );

        if context.status() != BuildStatus::PostBuild {
            let result = context.result();
            context.force_set_result(result, BuildStatus::PostBuild);
        }

        self.run_phase(
            Phase::PostBuild,
            pipeline.post_build_steps(),
            &mut context,
            &mut records,
            &mut skipped,
            &mut on_progress,
        );

        let outcome = Self::finish(&context, records, skipped, started_at, start);
        info!(
            "Pipeline finished: {} / {} ({} steps run, {} skipped)",
            outcome.result,
            outcome.status,
            outcome.steps.len(),
            outcome.skipped.len()
        );
        outcome
    }

    fn run_phase(
        &self,
        phase: Phase,
        steps: &[Arc<dyn BuildStep>],
        context: &mut BuildStepContext,
        records: &mut Vec<StepRecord>,
        skipped: &mut Vec<String>,
        on_progress: &mut impl FnMut(RunProgress<'_>),
    ) {
        let total = steps.len();
        context.begin_phase(phase, total);
        info!("Starting {} phase ({} steps)", phase, total);
        on_progress(RunProgress::PhaseStarting { phase, total });

        let mut next_override: Option<Arc<dyn BuildStep>> = None;

        for (position, scheduled) in steps.iter().enumerate() {
            let scheduled = next_override.take().unwrap_or_else(|| Arc::clone(scheduled));
            context.schedule(scheduled);

            for interceptor in &self.interceptors {
                let hook = panic::catch_unwind(AssertUnwindSafe(|| interceptor.before(context)));
                if let Err(payload) = hook {
                    warn!(
                        "Interceptor panicked before position {}: {}",
                        position,
                        panic_message(payload.as_ref())
                    );
                    context.set_result(BuildResult::Error, BuildStatus::Halt);
                }
            }

            if phase == Phase::Build && !context.status().permits_execution() {
                info!("Build halted before position {}", position);
                if let Some(current) = context.build_step() {
                    on_progress(RunProgress::StepSkipped { name: current.name() });
                    skipped.push(current.name().to_string());
                }
                Self::skip_rest(&steps[position + 1..], skipped, on_progress);
                return;
            }

            let Some(step) = context.capture() else {
                continue;
            };

            on_progress(RunProgress::StepStarting {
                name: step.name(),
                phase,
                index: position,
                total,
            });

            let record = run_step(step.as_ref(), context);
            next_override = context.finish_step();

            for interceptor in &self.interceptors {
                let hook =
                    panic::catch_unwind(AssertUnwindSafe(|| interceptor.after(context, &record)));
                if let Err(payload) = hook {
                    warn!(
                        "Interceptor panicked after '{}': {}",
                        record.name,
                        panic_message(payload.as_ref())
                    );
                }
            }

            on_progress(RunProgress::StepFinished { record: &record });
            records.push(record);

            if phase == Phase::Build && !context.status().permits_execution() {
                if let Some(dropped) = next_override.take() {
                    debug!("Discarding override '{}': build halted", dropped.name());
                }
                Self::skip_rest(&steps[position + 1..], skipped, on_progress);
                info!(
                    "Build halted after '{}'; skipping {} step(s)",
                    step.name(),
                    total - position - 1
                );
                return;
            }
        }

        if let Some(dropped) = next_override {
            debug!(
                "Discarding override '{}': no steps left in {} phase",
                dropped.name(),
                phase
            );
        }
    }

    fn skip_rest(
        steps: &[Arc<dyn BuildStep>],
        skipped: &mut Vec<String>,
        on_progress: &mut impl FnMut(RunProgress<'_>),
    ) {
        for rest in steps {
            on_progress(RunProgress::StepSkipped { name: rest.name() });
            skipped.push(rest.name().to_string());
        }
    }

    fn finish(
        context: &BuildStepContext,
        steps: Vec<StepRecord>,
        skipped: Vec<String>,
        started_at: DateTime<Utc>,
        start: Instant,
    ) -> PipelineResult {
        let aggregate = context.aggregate();
        PipelineResult {
            result: aggregate.result,
            status: aggregate.status,
            parameters: context.parameters(),
            steps,
            skipped,
            started_at,
            duration: start.elapsed(),
        }
    }
}

impl std::fmt::Debug for PipelineExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineExecutor")
            .field("interceptors", &self.interceptors.len())
            .field("abort", &self.abort)
            .finish()
    }
}
