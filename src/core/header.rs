//! Script header decoding.
//!
//! Every command script may open with a metadata block: a run of `# @key: value`
//! comment lines directly below the (optional) shebang. Parsing stops at the
//! first line that is not a comment. Plain comment lines following a `@manual`
//! field are treated as its continuation.

use crate::models::ScriptMeta;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

lazy_static! {
    static ref FIELD_RE: Regex =
        Regex::new(r"^#\s*@([a-z][a-z-]*):\s*(.*)$").expect("header field pattern must compile");
}

#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("failed to read script '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown header field '@{field}' in '{path}'")]
    UnknownField { field: String, path: PathBuf },
    #[error("invalid boolean '{value}' for '@{field}' in '{path}'")]
    InvalidFlag {
        field: String,
        value: String,
        path: PathBuf,
    },
}

/// Decodes the metadata header of the script at `path`.
pub fn parse_script(path: &Path) -> Result<ScriptMeta, HeaderError> {
    let contents = fs::read_to_string(path).map_err(|source| HeaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_header(&contents, path)
}

fn parse_header(contents: &str, path: &Path) -> Result<ScriptMeta, HeaderError> {
    let mut meta = ScriptMeta::default();
    let mut in_manual = false;

    for (index, line) in contents.lines().enumerate() {
        if index == 0 && line.starts_with("#!") {
            continue;
        }
        if !line.starts_with('#') {
            // End of the comment block, the script body begins.
            break;
        }

        let captures = match FIELD_RE.captures(line) {
            Some(captures) => captures,
            None => {
                if in_manual {
                    let text = line.trim_start_matches('#').trim();
                    if !text.is_empty() {
                        meta.manual.push('\n');
                        meta.manual.push_str(text);
                    }
                }
                continue;
            }
        };

        let field = &captures[1];
        let value = captures[2].trim();
        in_manual = false;

        match field {
            "help" => meta.help = value.to_string(),
            "manual" => {
                meta.manual = value.to_string();
                in_manual = true;
            }
            "args" => meta.args = value.to_string(),
            "chain" => meta.chain = value.to_string(),
            "deps" | "dependencies" => meta.dependencies = split_list(value),
            "outputs" => meta.outputs = split_list(value),
            "async" => meta.async_run = parse_flag(field, value, path)?,
            "build-number" => meta.build_number = parse_flag(field, value, path)?,
            _ => {
                return Err(HeaderError::UnknownField {
                    field: field.to_string(),
                    path: path.to_path_buf(),
                });
            }
        }
    }

    Ok(meta)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(field: &str, value: &str, path: &Path) -> Result<bool, HeaderError> {
    value.parse::<bool>().map_err(|_| HeaderError::InvalidFlag {
        field: field.to_string(),
        value: value.to_string(),
        path: path.to_path_buf(),
    })
}
