//! Pipeline definition loading, parsing, and validation.
//!
//! - Schema definitions in [`schema`]
//! - File loading in [`loader`]
//! - Validation in [`validator`]
//! - Parameter interpolation in [`interpolation`]
//!
//! # Example
//!
//! ```
//! use vanilla::config::{parse_pipeline, validate};
//! use std::path::Path;
//!
//! let yaml = r#"
//! parameters:
//!   target: release
//! steps:
//!   - type: shell
//!     command: make ${target}
//! post_build:
//!   - type: shell
//!     command: make clean
//! "#;
//!
//! let config = parse_pipeline(yaml, Path::new("pipeline.yml")).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.steps.len(), 1);
//! assert_eq!(config.post_build.len(), 1);
//! ```

pub mod interpolation;
pub mod loader;
pub mod schema;
pub mod validator;

pub use schema::{
    ParameterStepConfig, PipelineConfig, ResultStepConfig, ShellStepConfig, StepConfig,
};

pub use loader::{load_pipeline_file, parse_pipeline};

pub use validator::{validate, validate_config, ValidationError};

pub use interpolation::{parse_interpolation, resolve_string, resolve_with, Segment};
