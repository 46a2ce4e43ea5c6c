//! Result/status aggregation.
//!
//! Combines the build's current `(result, status)` with the pair a step
//! reports. The non-forced path only ever degrades the result, and once the
//! post-build phase has begun a plain `Halt` can no longer take effect.

use crate::steps::{BuildResult, BuildStatus};

/// Aggregate state of a build: the recorded result and control status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub result: BuildResult,
    pub status: BuildStatus,
}

impl Aggregate {
    pub fn new(result: BuildResult, status: BuildStatus) -> Self {
        Self { result, status }
    }
}

/// Merge an incoming `(result, status)` pair into the current one.
///
/// With `forced`, the incoming pair replaces the current one outright.
/// Otherwise:
/// - the result is replaced only when the incoming one is strictly worse
/// - an incoming `Halt` applies unless the current status is `PostBuild`
/// - an incoming `PostBuild` always applies
/// - an incoming `Continue` never changes the status
pub fn merge(current: Aggregate, incoming: Aggregate, forced: bool) -> Aggregate {
    if forced {
        return incoming;
    }

    let result = if incoming.result.is_worse_than(current.result) {
        incoming.result
    } else {
        current.result
    };

    let status = match incoming.status {
        BuildStatus::Halt if current.status != BuildStatus::PostBuild => BuildStatus::Halt,
        BuildStatus::PostBuild => BuildStatus::PostBuild,
        _ => current.status,
    };

    Aggregate { result, status }
}
