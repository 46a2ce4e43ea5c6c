//! Integration tests for config module public API.

use indexmap::IndexMap;
use std::fs;
use tempfile::TempDir;
use vanilla::config::{
    load_pipeline_file, resolve_string, validate, PipelineConfig, StepConfig,
};
use vanilla::runner::{ParameterStore, PipelineExecutor};
use vanilla::steps::builtin::build_pipeline;
use vanilla::steps::{BuildResult, BuildStatus};
use vanilla::VanillaError;

#[test]
fn public_api_is_accessible() {
    let config = PipelineConfig::default();
    assert!(config.steps.is_empty());
    assert!(config.post_build.is_empty());
}

#[test]
fn full_config_workflow() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("pipeline.yml");
    fs::write(
        &path,
        r#"
parameters:
  message: hello
steps:
  - type: parameter
    name: shout
    value: "${message}!"
  - type: result
    name: flag
    result: FAILURE
post_build:
  - type: parameter
    name: done
    value: "yes"
"#,
    )
    .unwrap();

    let config = load_pipeline_file(&path).unwrap();
    validate(&config).unwrap();
    assert!(matches!(config.steps[1], StepConfig::Result(_)));

    let pipeline = build_pipeline(&config);
    let params = ParameterStore::seeded(config.parameters.clone()).unwrap();
    let result = PipelineExecutor::new().run(&pipeline, params, temp.path());

    assert_eq!(result.result, BuildResult::Failure);
    assert_eq!(result.status, BuildStatus::PostBuild);
    assert_eq!(result.parameters["shout"], "hello!");
    assert_eq!(result.parameters["done"], "yes");
}

#[test]
fn resolve_string_uses_parameter_map() {
    let mut params = IndexMap::new();
    params.insert("target".to_string(), "release".to_string());

    assert_eq!(
        resolve_string("make ${target}", &params).unwrap(),
        "make release"
    );
    assert!(matches!(
        resolve_string("make ${missing}", &params),
        Err(VanillaError::Interpolation { .. })
    ));
}

#[test]
fn missing_file_is_config_not_found() {
    let temp = TempDir::new().unwrap();
    let err = load_pipeline_file(&temp.path().join("nope.yml")).unwrap_err();
    assert!(matches!(err, VanillaError::ConfigNotFound { .. }));
}

#[test]
fn unknown_step_type_is_parse_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("pipeline.yml");
    fs::write(&path, "steps:\n  - type: docker\n    image: alpine\n").unwrap();

    let err = load_pipeline_file(&path).unwrap_err();
    assert!(matches!(err, VanillaError::ConfigParseError { .. }));
}

#[test]
fn validation_errors_are_collected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("pipeline.yml");
    fs::write(
        &path,
        r#"
steps:
  - type: shell
    command: "  "
  - type: parameter
    name: ""
    value: x
"#,
    )
    .unwrap();

    let config = load_pipeline_file(&path).unwrap();
    let err = validate(&config).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("steps[0]"));
    assert!(message.contains("steps[1]"));
}
