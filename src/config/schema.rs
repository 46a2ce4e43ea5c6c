//! Pipeline definition schema.
//!
//! This module contains the struct definitions that map to the YAML
//! pipeline file format.
//!
//! Parameter values and environment values are text, but YAML scalars are
//! accepted for them: `jobs: 4` and `debug: true` read as `"4"` and
//! `"true"`. Numbers take their canonical form, so quote a value such as
//! `version: "1.10"` to keep it verbatim.

use indexmap::IndexMap;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::steps::{BuildResult, BuildStatus};

/// Root structure of a pipeline definition file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Initial build parameters, in order.
    #[serde(
        skip_serializing_if = "IndexMap::is_empty",
        deserialize_with = "deserialize_scalar_map"
    )]
    pub parameters: IndexMap<String, String>,

    /// Build-phase steps, in order.
    pub steps: Vec<StepConfig>,

    /// Post-build-phase steps, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_build: Vec<StepConfig>,
}

/// A single step entry, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepConfig {
    /// Run a shell command in the workspace.
    Shell(ShellStepConfig),

    /// Add or overwrite a build parameter.
    Parameter(ParameterStepConfig),

    /// Report a result and status.
    Result(ResultStepConfig),
}

/// Configuration for a shell step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShellStepConfig {
    /// Display name (defaults to the command).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Command to run; may reference parameters as `${name}`.
    pub command: String,

    /// Extra environment variables for the command.
    #[serde(
        default,
        skip_serializing_if = "HashMap::is_empty",
        deserialize_with = "deserialize_scalar_map"
    )]
    pub env: HashMap<String, String>,

    /// Store the command's trimmed stdout under this parameter name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture: Option<String>,

    /// Report a non-zero exit as `(FAILURE, CONTINUE)` instead of `(FAILURE, HALT)`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_failure: bool,
}

/// Configuration for a parameter step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterStepConfig {
    /// Parameter name.
    pub name: String,

    /// Parameter value; may reference parameters as `${name}`.
    #[serde(deserialize_with = "deserialize_scalar")]
    pub value: String,
}

/// Configuration for a result step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResultStepConfig {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Result to report.
    pub result: BuildResult,

    /// Status to report.
    #[serde(default)]
    pub status: BuildStatus,

    /// Overwrite the current result and status instead of merging.
    #[serde(default, skip_serializing_if = "is_false")]
    pub force: bool,
}

fn is_false(v: &bool) -> bool {
    !v
}

fn scalar_text<E: de::Error>(value: serde_yaml::Value) -> Result<String, E> {
    let found = match value {
        serde_yaml::Value::String(s) => return Ok(s),
        serde_yaml::Value::Number(n) => return Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => return Ok(b.to_string()),
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    };
    Err(E::custom(format!(
        "expected a string, number or boolean, found {}",
        found
    )))
}

fn deserialize_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_text(serde_yaml::Value::deserialize(deserializer)?)
}

fn deserialize_scalar_map<'de, D, M>(deserializer: D) -> Result<M, D::Error>
where
    D: Deserializer<'de>,
    M: FromIterator<(String, String)>,
{
    IndexMap::<String, serde_yaml::Value>::deserialize(deserializer)?
        .into_iter()
        .map(|(key, value)| scalar_text(value).map(|text| (key, text)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_pipeline() {
        let yaml = r#"
parameters:
  greeting: hello
  target: release
steps:
  - type: shell
    name: compile
    command: make ${target}
    env:
      CC: clang
    capture: build_output
  - type: parameter
    name: version
    value: "1.0"
  - type: result
    result: FAILURE
    status: HALT
post_build:
  - type: shell
    command: echo cleanup
    allow_failure: true
"#;
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();

        let keys: Vec<_> = config.parameters.keys().cloned().collect();
        assert_eq!(keys, vec!["greeting", "target"]);
        assert_eq!(config.steps.len(), 3);
        assert_eq!(config.post_build.len(), 1);

        match &config.steps[0] {
            StepConfig::Shell(shell) => {
                assert_eq!(shell.name.as_deref(), Some("compile"));
                assert_eq!(shell.env.get("CC").map(String::as_str), Some("clang"));
                assert_eq!(shell.capture.as_deref(), Some("build_output"));
                assert!(!shell.allow_failure);
            }
            other => panic!("expected shell step, got {:?}", other),
        }

        assert_eq!(
            config.steps[2],
            StepConfig::Result(ResultStepConfig {
                name: None,
                result: BuildResult::Failure,
                status: BuildStatus::Halt,
                force: false,
            })
        );
    }

    #[test]
    fn result_status_defaults_to_continue() {
        let step: StepConfig = serde_yaml::from_str("type: result\nresult: ERROR").unwrap();
        match step {
            StepConfig::Result(r) => assert_eq!(r.status, BuildStatus::Continue),
            other => panic!("expected result step, got {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_step_type() {
        let result: Result<StepConfig, _> = serde_yaml::from_str("type: deploy\ncommand: x");
        assert!(result.is_err());
    }

    #[test]
    fn rejects_unknown_fields() {
        let result: Result<PipelineConfig, _> = serde_yaml::from_str("stages: []");
        assert!(result.is_err());
    }

    #[test]
    fn scalar_parameter_values_read_as_text() {
        let yaml = r#"
parameters:
  version: 1.5
  jobs: 4
  debug: true
  name: app
steps:
  - type: parameter
    name: retries
    value: 3
  - type: shell
    command: make
    env:
      VERBOSE: false
"#;
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();

        let params: Vec<_> = config
            .parameters
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            params,
            vec![
                ("version", "1.5"),
                ("jobs", "4"),
                ("debug", "true"),
                ("name", "app")
            ]
        );
        match (&config.steps[0], &config.steps[1]) {
            (StepConfig::Parameter(param), StepConfig::Shell(shell)) => {
                assert_eq!(param.value, "3");
                assert_eq!(shell.env.get("VERBOSE").map(String::as_str), Some("false"));
            }
            other => panic!("unexpected steps: {:?}", other),
        }
    }

    #[test]
    fn rejects_non_scalar_parameter_values() {
        for yaml in [
            "parameters:\n  targets: [a, b]",
            "parameters:\n  nested:\n    key: value",
            "parameters:\n  empty:",
        ] {
            let err = serde_yaml::from_str::<PipelineConfig>(yaml).unwrap_err();
            assert!(
                err.to_string().contains("expected a string, number or boolean"),
                "{}: {}",
                yaml,
                err
            );
        }
    }

    #[test]
    fn empty_document_is_empty_pipeline() {
        let config: PipelineConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.steps.is_empty());
        assert!(config.post_build.is_empty());
        assert!(config.parameters.is_empty());
    }
}
