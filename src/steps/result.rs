//! Build result and status values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// At-a-glance outcome of a build.
///
/// Variants are declared from best to worst; the derived ordering is the
/// severity ordering, so `Success < Failure < Error < Aborted`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    /// The build finished without any problems.
    #[default]
    Success,

    /// Sanity checks or tests failed.
    Failure,

    /// An unexpected error occurred, typically an unhandled step failure.
    Error,

    /// The build was canceled while a step was running.
    Aborted,
}

impl BuildResult {
    /// All results, best first.
    pub const ALL: [BuildResult; 4] = [
        BuildResult::Success,
        BuildResult::Failure,
        BuildResult::Error,
        BuildResult::Aborted,
    ];

    pub fn is_better_than(self, that: BuildResult) -> bool {
        self < that
    }

    pub fn is_better_than_or_equal_to(self, that: BuildResult) -> bool {
        self <= that
    }

    pub fn is_worse_than(self, that: BuildResult) -> bool {
        self > that
    }

    pub fn is_worse_than_or_equal_to(self, that: BuildResult) -> bool {
        self >= that
    }

    /// The more severe of the two results.
    pub fn worst(self, that: BuildResult) -> BuildResult {
        self.max(that)
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildResult::Success => "SUCCESS",
            BuildResult::Failure => "FAILURE",
            BuildResult::Error => "ERROR",
            BuildResult::Aborted => "ABORTED",
        };
        write!(f, "{}", s)
    }
}

/// Control signal telling the executor whether to keep running steps.
///
/// The executor decides solely on the status, never on the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    /// Keep running build steps.
    #[default]
    Continue,

    /// Stop running build steps.
    Halt,

    /// The post-build phase is running; every remaining step runs no matter
    /// what. Behaves like `Continue`, but a non-forced `Halt` cannot replace it.
    PostBuild,
}

impl BuildStatus {
    /// Whether further steps in the current phase may run.
    pub fn permits_execution(&self) -> bool {
        matches!(self, BuildStatus::Continue | BuildStatus::PostBuild)
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildStatus::Continue => "CONTINUE",
            BuildStatus::Halt => "HALT",
            BuildStatus::PostBuild => "POST_BUILD",
        };
        write!(f, "{}", s)
    }
}
