//! Parameter interpolation for step definitions.
//!
//! Step fields may reference build parameters using `${name}` syntax.
//! References are resolved when the step runs, against the parameters
//! the build has accumulated at that point.
//!
//! # Syntax
//!
//! - `${name}` - replaced with the parameter's value
//! - `$${escaped}` - produces literal `${escaped}` in output
//!
//! # Example
//!
//! ```
//! use vanilla::config::resolve_string;
//! use vanilla::runner::ParameterMap;
//!
//! let mut params = ParameterMap::new();
//! params.insert("target".to_string(), "release".to_string());
//! let command = resolve_string("cargo build --${target}", &params).unwrap();
//! assert_eq!(command, "cargo build --release");
//! ```

use crate::error::{Result, VanillaError};
use crate::runner::ParameterMap;

/// A segment of an interpolated string.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Literal(String),
    /// Parameter reference: ${name}
    Variable(String),
}

/// Parse a string containing ${name} interpolations.
pub fn parse_interpolation(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut chars = input.chars().peekable();
    let mut current_literal = String::new();

    while let Some(c) = chars.next() {
        if c != '$' {
            current_literal.push(c);
            continue;
        }

        match chars.peek() {
            Some('$') => {
                chars.next();
                if chars.peek() == Some(&'{') {
                    // $${...} -> literal ${...}
                    chars.next();
                    current_literal.push_str("${");
                    for c in chars.by_ref() {
                        current_literal.push(c);
                        if c == '}' {
                            break;
                        }
                    }
                } else {
                    current_literal.push('$');
                }
            }
            Some('{') => {
                chars.next();

                if !current_literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut current_literal)));
                }

                let mut name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    name.push(c);
                }

                segments.push(Segment::Variable(name));
            }
            _ => current_literal.push(c),
        }
    }

    if !current_literal.is_empty() {
        segments.push(Segment::Literal(current_literal));
    }

    segments
}

/// Resolve every reference with a custom lookup.
///
/// # Errors
///
/// Returns `Interpolation` for the first name the lookup cannot resolve.
pub fn resolve_with<F>(input: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::new();

    for segment in parse_interpolation(input) {
        match segment {
            Segment::Literal(text) => result.push_str(&text),
            Segment::Variable(name) => {
                let value = lookup(&name).ok_or(VanillaError::Interpolation { variable: name })?;
                result.push_str(&value);
            }
        }
    }

    Ok(result)
}

/// Resolve every reference against a parameter map.
pub fn resolve_string(input: &str, parameters: &ParameterMap) -> Result<String> {
    resolve_with(input, |name| parameters.get(name).cloned())
}
