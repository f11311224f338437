//! Argument schema parsing and call-site binding.
//!
//! A schema string is a comma-separated list of `label : type[?] [= default]`
//! entries. Binding takes `label=value` pairs from the call site, validates them
//! lexically against the schema, and emits the textual argument buffer that gets
//! prepended to the generated script.

use crate::models::{ArgSpec, ArgType, Command};
use std::collections::{HashMap, HashSet};
use std::fmt::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArgumentError {
    #[error("invalid argument declaration: '{0}'")]
    SchemaSyntax(String),
    #[error("invalid or missing argument type: '{0}'")]
    UnknownType(String),
    #[error("argument label '{0}' was declared twice")]
    DuplicateArgumentNames(String),
    #[error("default values for mandatory arguments are not allowed: '{0}'")]
    DefaultOnMandatory(String),
    #[error("invalid argument: '{0}' (expected label=value)")]
    InvalidArgument(String),
    #[error("invalid argument label: '{0}'")]
    InvalidArgumentLabel(String),
    #[error("invalid value '{value}' for argument '{label}': expected {expected}")]
    InvalidArgumentType {
        label: String,
        value: String,
        expected: ArgType,
    },
    #[error("argument label '{0}' appeared more than once")]
    RepeatedLabel(String),
    #[error("missing argument: '{0}'")]
    MissingArgument(String),
}

/// Parses a declared schema string into the label → `ArgSpec` map.
///
/// An empty string yields an empty schema. Labels are trimmed; a default is
/// only legal on an entry marked optional with `?`.
pub fn parse_arg_defs(spec: &str) -> Result<HashMap<String, ArgSpec>, ArgumentError> {
    let mut defs = HashMap::new();

    if spec.trim().is_empty() {
        return Ok(defs);
    }

    for entry in spec.split(',') {
        if entry.trim().is_empty() {
            return Err(ArgumentError::SchemaSyntax(entry.to_string()));
        }

        let (label_part, type_part) = entry
            .split_once(':')
            .ok_or_else(|| ArgumentError::SchemaSyntax(entry.trim().to_string()))?;

        let label = label_part.trim().to_string();
        if label.is_empty() {
            return Err(ArgumentError::SchemaSyntax(entry.trim().to_string()));
        }
        if defs.contains_key(&label) {
            return Err(ArgumentError::DuplicateArgumentNames(label));
        }

        // Peel off a `= default` suffix before looking at the type keyword.
        let mut type_str = type_part.trim();
        let mut default_value = None;
        if let Some((ty, default)) = type_str.split_once('=') {
            if !ty.contains('?') {
                return Err(ArgumentError::DefaultOnMandatory(entry.trim().to_string()));
            }
            type_str = ty.trim();
            default_value = Some(default.to_string());
        }

        let optional = type_str.ends_with('?');
        let type_keyword = type_str.trim_end_matches('?');

        let arg_type = ArgType::from_keyword(type_keyword)
            .ok_or_else(|| ArgumentError::UnknownType(entry.trim().to_string()))?;

        defs.insert(
            label.clone(),
            ArgSpec {
                name: label,
                arg_type,
                optional,
                default_value,
            },
        );
    }

    Ok(defs)
}

/// Validates call-site arguments against a command's schema and emits the
/// textual argument buffer: one `label=value` line per schema entry.
///
/// Bound entries use the provided value; unbound optionals fall back to their
/// declared default or the zero of their type; an unbound mandatory entry is an
/// error. Bindings are local to this call, so the same command can be invoked
/// again without any reset.
pub fn parse_arguments(command: &Command, args: &[String]) -> Result<String, ArgumentError> {
    log::debug!("parsing args {:?} for command '{}'", args, command.name);

    let mut bound: HashMap<&str, &str> = HashMap::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for raw in args {
        let (label, value) = raw
            .split_once('=')
            .ok_or_else(|| ArgumentError::InvalidArgument(raw.clone()))?;
        if value.contains('=') {
            return Err(ArgumentError::InvalidArgument(raw.clone()));
        }

        let spec = command
            .args
            .get(label)
            .ok_or_else(|| ArgumentError::InvalidArgumentLabel(label.to_string()))?;

        if !spec.arg_type.validates(value) {
            return Err(ArgumentError::InvalidArgumentType {
                label: label.to_string(),
                value: value.to_string(),
                expected: spec.arg_type,
            });
        }

        if !seen.insert(label) {
            return Err(ArgumentError::RepeatedLabel(label.to_string()));
        }
        bound.insert(label, value);
    }

    let mut buffer = String::new();
    for spec in command.args.values() {
        match bound.get(spec.name.as_str()) {
            Some(value) => {
                let _ = writeln!(buffer, "{}={}", spec.name, value);
            }
            None if spec.optional => match &spec.default_value {
                Some(default) if !default.is_empty() => {
                    let _ = writeln!(buffer, "{}={}", spec.name, default.trim());
                }
                _ => {
                    let _ = writeln!(buffer, "{}={}", spec.name, spec.arg_type.zero_value());
                }
            },
            None => return Err(ArgumentError::MissingArgument(spec.name.clone())),
        }
    }

    Ok(buffer)
}
