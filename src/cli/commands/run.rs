//! Run command implementation.
//!
//! The `vanilla run` command loads a pipeline definition and executes it.
//!
//! The binary installs no interrupt handler and never raises an
//! [`AbortSignal`](crate::runner::AbortSignal). Ctrl-C terminates the
//! process together with its shell children, so `ABORTED` is only ever
//! reported by hosts that drive [`PipelineExecutor`] through the library.

use std::path::{Path, PathBuf};

use crate::cli::args::RunArgs;
use crate::config::{load_pipeline_file, validate};
use crate::error::{Result, VanillaError};
use crate::runner::{
    ParameterMap, ParameterStore, PipelineExecutor, PipelineResult, RunProgress, StepOutcome,
};
use crate::steps::builtin::build_pipeline;
use crate::steps::BuildResult;
use crate::ui::{format_duration, OutputMode, UserInterface};

use super::dispatcher::{Command, CommandResult};

/// The run command implementation.
pub struct RunCommand {
    working_dir: PathBuf,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(working_dir: &Path, args: RunArgs) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            args,
        }
    }

    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    /// Directory the steps run in.
    pub fn workspace(&self) -> PathBuf {
        self.args
            .workspace
            .clone()
            .unwrap_or_else(|| self.working_dir.clone())
    }

    /// File parameters first, then `-P` overrides on top.
    fn seed_parameters(&self, file_params: &ParameterMap) -> Result<ParameterStore> {
        let mut store = ParameterStore::seeded(file_params.clone())?;
        for (name, value) in &self.args.params {
            store.insert(name.as_str(), value.as_str())?;
        }
        Ok(store)
    }

    fn report(&self, result: &PipelineResult, ui: &mut dyn UserInterface) -> Result<()> {
        if self.args.json {
            let json = serde_json::to_string_pretty(result).map_err(anyhow::Error::from)?;
            ui.raw(&json);
            return Ok(());
        }

        let failed = result.steps.iter().filter(|s| s.is_failed()).count();
        let summary = format!(
            "{} / {} ({} run, {} failed, {} skipped in {})",
            result.result,
            result.status,
            result.steps.len(),
            failed,
            result.skipped.len(),
            format_duration(result.duration)
        );

        if ui.output_mode() == OutputMode::Quiet {
            ui.raw(&summary);
            return Ok(());
        }

        match result.result {
            BuildResult::Success => ui.success(&summary),
            BuildResult::Failure => ui.warning(&summary),
            BuildResult::Error | BuildResult::Aborted => ui.error(&summary),
        }
        Ok(())
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = match load_pipeline_file(&self.args.pipeline) {
            Ok(c) => c,
            Err(VanillaError::ConfigNotFound { path }) => {
                ui.error(&format!("Pipeline file not found: {}", path.display()));
                return Ok(CommandResult::failure(2));
            }
            Err(e) => return Err(e),
        };
        validate(&config)?;

        let parameters = self.seed_parameters(&config.parameters)?;
        let pipeline = build_pipeline(&config);
        let workspace = self.workspace();
        let show_progress = !self.args.json;

        let executor = PipelineExecutor::new();
        let result = executor.run_with_progress(&pipeline, parameters, &workspace, |event| {
            if !show_progress {
                return;
            }
            match event {
                RunProgress::PhaseStarting { phase, total } => {
                    ui.show_header(&format!("{} ({} steps)", phase, total));
                }
                RunProgress::StepStarting {
                    name, index, total, ..
                } => {
                    ui.message(&format!("  [{}/{}] {}", index + 1, total, name));
                }
                RunProgress::StepFinished { record } => {
                    let duration = format_duration(record.duration);
                    match record.outcome {
                        StepOutcome::Completed => ui.message(&format!(
                            "  {} {} -> {}/{} ({})",
                            record.outcome.display_char(),
                            record.name,
                            record.result,
                            record.status,
                            duration
                        )),
                        StepOutcome::Failed => ui.error(&format!(
                            "  {} failed: {} ({})",
                            record.name,
                            record.error.as_deref().unwrap_or("unknown error"),
                            duration
                        )),
                    }
                }
                RunProgress::StepSkipped { name } => {
                    ui.warning(&format!("  {} skipped", name));
                }
            }
        });

        self.report(&result, ui)?;

        if result.success() {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(1))
        }
    }
}
