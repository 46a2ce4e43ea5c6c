//! Built-in step kinds for pipeline definition files.
//!
//! - [`ShellStep`] - runs a command in the workspace
//! - [`ParameterStep`] - adds a parameter for later steps
//! - [`ResultStep`] - reports a fixed result and status
//!
//! [`build_pipeline`] turns a parsed [`PipelineConfig`] into a runnable
//! [`Pipeline`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::interpolation::resolve_with;
use crate::config::schema::{
    ParameterStepConfig, PipelineConfig, ResultStepConfig, ShellStepConfig, StepConfig,
};
use crate::runner::{BuildStepContext, Pipeline};
use crate::shell::{execute, CommandOptions};

use super::{BuildResult, BuildStatus, BuildStep};

/// Resolve `${name}` against the build's parameters, falling back to
/// `${workspace}`.
fn interpolate(input: &str, context: &BuildStepContext) -> anyhow::Result<String> {
    let parameters = context.parameters();
    let resolved = resolve_with(input, |name| {
        parameters.get(name).cloned().or_else(|| match name {
            "workspace" => Some(context.workspace().display().to_string()),
            _ => None,
        })
    })?;
    Ok(resolved)
}

/// Runs a shell command with the workspace as working directory and the
/// build parameters as environment.
///
/// A non-zero exit reports `(FAILURE, HALT)`, or `(FAILURE, CONTINUE)` when
/// failures are allowed. A command that cannot be started is a step failure.
#[derive(Debug, Clone)]
pub struct ShellStep {
    name: String,
    command: String,
    env: HashMap<String, String>,
    capture: Option<String>,
    allow_failure: bool,
}

impl ShellStep {
    pub fn new(command: impl Into<String>) -> Self {
        let command = command.into();
        Self {
            name: command.clone(),
            command,
            env: HashMap::new(),
            capture: None,
            allow_failure: false,
        }
    }

    pub fn from_config(config: &ShellStepConfig) -> Self {
        Self {
            name: config
                .name
                .clone()
                .unwrap_or_else(|| config.command.clone()),
            command: config.command.clone(),
            env: config.env.clone(),
            capture: config.capture.clone(),
            allow_failure: config.allow_failure,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Store trimmed stdout under `parameter` when the command succeeds.
    pub fn capture(mut self, parameter: impl Into<String>) -> Self {
        self.capture = Some(parameter.into());
        self
    }

    pub fn allow_failure(mut self, allow: bool) -> Self {
        self.allow_failure = allow;
        self
    }
}

impl BuildStep for ShellStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, context: &mut BuildStepContext) -> anyhow::Result<()> {
        if context.abort_requested() {
            info!("Build aborted before '{}'", self.name);
            context.set_result(BuildResult::Aborted, BuildStatus::Halt);
            return Ok(());
        }

        let command = interpolate(&self.command, context)?;

        let mut env = context.parameters().to_env();
        for (key, value) in &self.env {
            env.insert(key.clone(), interpolate(value, context)?);
        }

        let options = CommandOptions {
            cwd: Some(context.workspace().to_path_buf()),
            env,
            capture_stdout: true,
            capture_stderr: true,
        };

        let result = execute(&command, &options)?;
        debug!("`{}` stdout:\n{}", command, result.stdout);

        if !result.success {
            warn!(
                "`{}` exited with code {:?}: {}",
                command,
                result.exit_code,
                result.stderr.trim()
            );
            let status = if self.allow_failure {
                BuildStatus::Continue
            } else {
                BuildStatus::Halt
            };
            context.set_result(BuildResult::Failure, status);
            return Ok(());
        }

        if let Some(parameter) = &self.capture {
            context.add_parameter(parameter.as_str(), result.stdout.trim())?;
        }

        Ok(())
    }
}

/// Adds (or overwrites) a build parameter for later steps.
#[derive(Debug, Clone)]
pub struct ParameterStep {
    label: String,
    name: String,
    value: String,
}

impl ParameterStep {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: format!("set {}", name),
            name,
            value: value.into(),
        }
    }

    pub fn from_config(config: &ParameterStepConfig) -> Self {
        Self::new(config.name.clone(), config.value.clone())
    }
}

impl BuildStep for ParameterStep {
    fn name(&self) -> &str {
        &self.label
    }

    fn execute(&self, context: &mut BuildStepContext) -> anyhow::Result<()> {
        let value = interpolate(&self.value, context)?;
        context.add_parameter(self.name.as_str(), value)?;
        Ok(())
    }
}

/// Reports a fixed result and status, merged or forced.
#[derive(Debug, Clone)]
pub struct ResultStep {
    name: String,
    result: BuildResult,
    status: BuildStatus,
    force: bool,
}

impl ResultStep {
    pub fn new(result: BuildResult, status: BuildStatus) -> Self {
        Self {
            name: format!("result {}/{}", result, status),
            result,
            status,
            force: false,
        }
    }

    pub fn forced(result: BuildResult, status: BuildStatus) -> Self {
        Self {
            force: true,
            ..Self::new(result, status)
        }
    }

    pub fn from_config(config: &ResultStepConfig) -> Self {
        let mut step = Self::new(config.result, config.status);
        step.force = config.force;
        if let Some(name) = &config.name {
            step.name = name.clone();
        }
        step
    }
}

impl BuildStep for ResultStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, context: &mut BuildStepContext) -> anyhow::Result<()> {
        if self.force {
            context.force_set_result(self.result, self.status);
        } else {
            context.set_result(self.result, self.status);
        }
        Ok(())
    }
}

/// Instantiate the step a config entry describes.
pub fn step_from_config(config: &StepConfig) -> Arc<dyn BuildStep> {
    match config {
        StepConfig::Shell(c) => Arc::new(ShellStep::from_config(c)),
        StepConfig::Parameter(c) => Arc::new(ParameterStep::from_config(c)),
        StepConfig::Result(c) => Arc::new(ResultStep::from_config(c)),
    }
}

/// Build a runnable pipeline from a definition.
pub fn build_pipeline(config: &PipelineConfig) -> Pipeline {
    let mut pipeline = Pipeline::new();
    for step in &config.steps {
        pipeline.push_step(step_from_config(step));
    }
    for step in &config.post_build {
        pipeline.push_post_build_step(step_from_config(step));
    }
    pipeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{AbortSignal, ParameterStore};
    use tempfile::TempDir;

    fn context_in(temp: &TempDir) -> BuildStepContext {
        BuildStepContext::new(temp.path(), ParameterStore::new())
    }

    #[test]
    #[cfg(unix)]
    fn shell_step_success_keeps_result() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context_in(&temp);

        ShellStep::new("true").execute(&mut ctx).unwrap();

        assert_eq!(ctx.result(), BuildResult::Success);
        assert_eq!(ctx.status(), BuildStatus::Continue);
    }

    #[test]
    #[cfg(unix)]
    fn shell_step_failure_halts() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context_in(&temp);

        ShellStep::new("exit 1").execute(&mut ctx).unwrap();

        assert_eq!(ctx.result(), BuildResult::Failure);
        assert_eq!(ctx.status(), BuildStatus::Halt);
    }

    #[test]
    #[cfg(unix)]
    fn shell_step_allowed_failure_continues() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context_in(&temp);

        ShellStep::new("exit 1")
            .allow_failure(true)
            .execute(&mut ctx)
            .unwrap();

        assert_eq!(ctx.result(), BuildResult::Failure);
        assert_eq!(ctx.status(), BuildStatus::Continue);
    }

    #[test]
    #[cfg(unix)]
    fn shell_step_captures_interpolated_output() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context_in(&temp);
        ctx.add_parameter("who", "world").unwrap();

        ShellStep::new("echo hello ${who}")
            .capture("greeting")
            .execute(&mut ctx)
            .unwrap();

        assert_eq!(ctx.parameters()["greeting"], "hello world");
    }

    #[test]
    #[cfg(unix)]
    fn shell_step_exports_parameters_and_runs_in_workspace() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context_in(&temp);
        ctx.add_parameter("BUILD_ID", "42").unwrap();

        ShellStep::new("echo $BUILD_ID > id.txt")
            .execute(&mut ctx)
            .unwrap();

        let written = std::fs::read_to_string(temp.path().join("id.txt")).unwrap();
        assert_eq!(written.trim(), "42");
    }

    #[test]
    fn shell_step_unknown_parameter_is_an_error() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context_in(&temp);

        let err = ShellStep::new("echo ${nope}").execute(&mut ctx).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn shell_step_observes_abort() {
        let temp = TempDir::new().unwrap();
        let signal = AbortSignal::new();
        signal.abort();
        let mut ctx = context_in(&temp).with_abort_signal(signal);

        ShellStep::new("touch ran.txt").execute(&mut ctx).unwrap();

        assert_eq!(ctx.result(), BuildResult::Aborted);
        assert_eq!(ctx.status(), BuildStatus::Halt);
        assert!(!temp.path().join("ran.txt").exists());
    }

    #[test]
    fn parameter_step_interpolates_value() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context_in(&temp);
        ctx.add_parameter("major", "2").unwrap();

        ParameterStep::new("version", "${major}.1")
            .execute(&mut ctx)
            .unwrap();

        assert_eq!(ctx.parameters()["version"], "2.1");
    }

    #[test]
    fn parameter_step_resolves_workspace() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context_in(&temp);

        ParameterStep::new("dir", "${workspace}")
            .execute(&mut ctx)
            .unwrap();

        assert_eq!(
            ctx.parameters()["dir"],
            temp.path().display().to_string()
        );
    }

    #[test]
    fn parameter_step_rejects_empty_name() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context_in(&temp);

        let err = ParameterStep::new("", "x").execute(&mut ctx).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn result_step_merges_or_forces() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context_in(&temp);

        ResultStep::new(BuildResult::Failure, BuildStatus::Continue)
            .execute(&mut ctx)
            .unwrap();
        ResultStep::new(BuildResult::Success, BuildStatus::Continue)
            .execute(&mut ctx)
            .unwrap();
        assert_eq!(ctx.result(), BuildResult::Failure);

        ResultStep::forced(BuildResult::Success, BuildStatus::Continue)
            .execute(&mut ctx)
            .unwrap();
        assert_eq!(ctx.result(), BuildResult::Success);
    }

    #[test]
    fn build_pipeline_keeps_phases_and_order() {
        let config: PipelineConfig = serde_yaml::from_str(
            r#"
steps:
  - type: parameter
    name: a
    value: "1"
  - type: shell
    name: compile
    command: make
post_build:
  - type: result
    name: mark
    result: SUCCESS
"#,
        )
        .unwrap();

        let pipeline = build_pipeline(&config);
        let names: Vec<_> = pipeline.build_steps().iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["set a", "compile"]);
        assert_eq!(pipeline.post_build_steps()[0].name(), "mark");
    }
}
