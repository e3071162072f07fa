// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Document loading: read the configuration file, decode its YAML shape,
//! and expand `$VAR` references in the `environment` overlay. Keeps file
//! paths and YAML tokens out of the scheduler and template layers, which
//! only ever see already-decoded `serde_yaml::Value` entries.

use crate::config_error::ConfigError;
use indexmap::IndexMap;
use serde_yaml::Value;
use std::path::Path;

/// The decoded top-level shape: a bare list of command-entries, or a
/// mapping with optional `environment` / `main` / `post` keys.
#[derive(Debug, Default)]
pub struct Document {
    pub environment: IndexMap<String, String>,
    pub main: Vec<Value>,
    pub post: Vec<Value>,
}

/// Read `path`, decode it as YAML, and expand every `environment` value
/// against the invoking process's environment.
pub fn load_document(path: &Path) -> Result<Document, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_yaml::from_str(&raw)?;
    parse_document(value)
}

fn parse_document(value: Value) -> Result<Document, ConfigError> {
    match value {
        Value::Sequence(entries) => Ok(Document {
            environment: IndexMap::new(),
            main: entries,
            post: Vec::new(),
        }),
        Value::Mapping(map) => {
            let environment = map
                .get(Value::String("environment".to_string()))
                .map(parse_environment)
                .transpose()?
                .unwrap_or_default();
            let main = map
                .get(Value::String("main".to_string()))
                .and_then(Value::as_sequence)
                .cloned()
                .unwrap_or_default();
            let post = map
                .get(Value::String("post".to_string()))
                .and_then(Value::as_sequence)
                .cloned()
                .unwrap_or_default();
            Ok(Document {
                environment,
                main,
                post,
            })
        }
        Value::Null => Ok(Document::default()),
        _ => Err(ConfigError::InvalidTopLevel),
    }
}

fn parse_environment(value: &Value) -> Result<IndexMap<String, String>, ConfigError> {
    let map = value.as_mapping().ok_or(ConfigError::InvalidTopLevel)?;
    let mut out = IndexMap::with_capacity(map.len());
    for (k, v) in map {
        let key = k.as_str().ok_or(ConfigError::InvalidTopLevel)?;
        let raw = v.as_str().ok_or(ConfigError::InvalidTopLevel)?;
        // A reference to an unset variable is left unexpanded rather than
        // erroring or expanding to an empty string.
        let expanded = shellexpand::env_with_context_no_errors(raw, |name| {
            std::env::var(name).ok()
        });
        out.insert(key.to_string(), expanded.into_owned());
    }
    Ok(out)
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
