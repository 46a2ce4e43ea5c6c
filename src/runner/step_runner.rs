//! Single step invocation.
//!
//! Runs one step's `execute` exactly once. A clean return leaves the
//! aggregate untouched; a returned error or a panic is recorded as
//! `(ERROR, HALT)` through the non-forced path so a misbehaving step can
//! never pass silently.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::steps::{BuildResult, BuildStatus, BuildStep};

use super::context::BuildStepContext;
use super::pipeline::Phase;

/// How a step invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// `execute` returned normally.
    Completed,
    /// `execute` returned an error or panicked.
    Failed,
}

impl StepOutcome {
    /// Get a display character for this outcome.
    pub fn display_char(&self) -> char {
        match self {
            StepOutcome::Completed => '✓',
            StepOutcome::Failed => '✗',
        }
    }
}

/// Report of one step invocation.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// Step name.
    pub name: String,

    /// Phase the step ran in.
    pub phase: Phase,

    /// Zero-based position within the phase.
    pub index: usize,

    /// How the invocation ended.
    pub outcome: StepOutcome,

    /// Failure message (if failed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Build result once the step returned.
    pub result: BuildResult,

    /// Build status once the step returned.
    pub status: BuildStatus,

    /// Execution duration.
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl StepRecord {
    pub fn is_failed(&self) -> bool {
        self.outcome == StepOutcome::Failed
    }
}

fn serialize_millis<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Invoke `step` against `context`, converting any failure into an
/// `(ERROR, HALT)` update.
///
/// The caller is responsible for the step slot and progress counters.
pub fn run_step(step: &dyn BuildStep, context: &mut BuildStepContext) -> StepRecord {
    let name = step.name().to_string();
    let index = context.build_step_index();
    let start = Instant::now();

    debug!("Executing step '{}' ({}/{})", name, index + 1, context.total_build_steps());

    let error = match panic::catch_unwind(AssertUnwindSafe(|| step.execute(context))) {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(format!("{:#}", e)),
        Err(payload) => Some(format!("step panicked: {}", panic_message(payload.as_ref()))),
    };

    let outcome = match &error {
        None => StepOutcome::Completed,
        Some(message) => {
            warn!("Step '{}' failed: {}", name, message);
            context.set_result(BuildResult::Error, BuildStatus::Halt);
            StepOutcome::Failed
        }
    };

    StepRecord {
        name,
        phase: context.phase(),
        index,
        outcome,
        error,
        result: context.result(),
        status: context.status(),
        duration: start.elapsed(),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
