// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C1: decode raw YAML command-entries into a flat `Vec<Command>`.
//!
//! Works directly on `serde_yaml::Value` rather than a fixed derived schema,
//! since a command-entry is recursively heterogeneous: a bare string, a
//! single-key mapping of features, or a nested sequence.

use serde_yaml::Value;
use shrun_core::command::{Command, Features};
use shrun_core::error::TemplateError;
use shrun_core::series::Series;

const KEYWORDS: &[&str] = &[
    "background",
    "depends_on",
    "if",
    "name",
    "set",
    "timeout",
    "unless",
    "retries",
    "interval",
];

/// Expand every top-level entry (leaf or nested sequence) into its concrete
/// commands, preserving source order.
pub fn generate_commands(entries: &[Value]) -> Result<Vec<Command>, TemplateError> {
    let mut out = Vec::new();
    for entry in entries {
        match entry {
            Value::Sequence(seq) => {
                out.extend(generate_commands_for_sequence(seq, &[])?);
            }
            leaf => {
                let command = parse_leaf(leaf)?;
                out.extend(command.generate_all_commands()?);
            }
        }
    }
    Ok(out)
}

/// A nested sequence. When its first element is a `{foreach: <series-spec>}`
/// mapping, the rest of the sequence is repeated once per item in that
/// series. Otherwise the sequence simply groups its elements in order,
/// re-using whatever `foreach` bindings already enclose it.
/// `bound` carries every (series, item-index) pair already fixed by an
/// enclosing `foreach`, each at the index it was bound at for its own loop.
fn generate_commands_for_sequence(
    sequence: &[Value],
    bound: &[(Series, usize)],
) -> Result<Vec<Command>, TemplateError> {
    match head_foreach_series(sequence)? {
        Some(series) => {
            if bound.iter().any(|(s, _)| s == &series) {
                return Err(TemplateError::SeriesAlreadyDefined(series.identity()));
            }

            let mut out = Vec::new();
            for index in 0..series.items().len() {
                let mut nested_bound = bound.to_vec();
                nested_bound.push((series.clone(), index));
                out.extend(expand_group(&sequence[1..], &nested_bound)?);
            }
            Ok(out)
        }
        None => expand_group(sequence, bound),
    }
}

/// `Some(series)` when `sequence`'s first element is a `{foreach: ...}`
/// mapping; `None` for any other shape, including an empty sequence or one
/// whose first element is a plain leaf or nested sequence.
fn head_foreach_series(sequence: &[Value]) -> Result<Option<Series>, TemplateError> {
    let Some(head_map) = sequence.first().and_then(Value::as_mapping) else {
        return Ok(None);
    };
    let Some(foreach_value) = head_map.get(Value::String("foreach".to_string())) else {
        return Ok(None);
    };
    let foreach_str = foreach_value
        .as_str()
        .ok_or(TemplateError::MissingForeachSeries)?;
    Ok(Some(Series::parse(foreach_str)?))
}

/// Expand every element of a plain (non-`foreach`) group in order, applying
/// whatever series bindings are already in scope.
fn expand_group(items: &[Value], bound: &[(Series, usize)]) -> Result<Vec<Command>, TemplateError> {
    let mut out = Vec::new();
    for item in items {
        match item {
            Value::Sequence(inner) => {
                out.extend(generate_commands_for_sequence(inner, bound)?);
            }
            leaf => {
                let mut command = parse_leaf(leaf)?;
                for (bound_series, bound_index) in bound {
                    command = command.expand_series(bound_series, *bound_index)?;
                }
                out.extend(command.generate_all_commands()?);
            }
        }
    }
    Ok(out)
}

fn parse_leaf(value: &Value) -> Result<Command, TemplateError> {
    match value {
        Value::String(text) => Ok(Command::new(text.clone(), Features::default())),
        Value::Mapping(map) => {
            let (key, features_value) = map
                .iter()
                .next()
                .ok_or_else(|| TemplateError::CommandNotAString(format!("{value:?}")))?;
            let text = key
                .as_str()
                .ok_or_else(|| TemplateError::CommandNotAString(format!("{key:?}")))?;
            let features = parse_features(features_value)?;
            Ok(Command::new(text, features))
        }
        other => Err(TemplateError::CommandNotAString(format!("{other:?}"))),
    }
}

fn parse_features(value: &Value) -> Result<Features, TemplateError> {
    let map = match value {
        Value::Mapping(m) => m,
        Value::Null => return Ok(Features::default()),
        other => return Err(TemplateError::CommandNotAString(format!("{other:?}"))),
    };

    let mut features = Features::default();
    for (k, v) in map {
        let key = k
            .as_str()
            .ok_or_else(|| TemplateError::UnknownKeyword(format!("{k:?}")))?;
        if !KEYWORDS.contains(&key) {
            return Err(TemplateError::UnknownKeyword(key.to_string()));
        }
        match key {
            "name" => features.name = v.as_str().map(str::to_string),
            "background" => features.background = v.as_bool().unwrap_or(false),
            "depends_on" => features.depends_on = string_or_list(v),
            "if" => features.if_preds = string_or_list(v),
            "unless" => features.unless_preds = string_or_list(v),
            "set" => features.set_preds = string_or_list(v),
            "timeout" => features.timeout = v.as_f64(),
            "retries" => features.retries = v.as_u64().unwrap_or(0) as u32,
            "interval" => features.interval = v.as_f64(),
            _ => unreachable!("validated against KEYWORDS above"),
        }
    }
    Ok(features)
}

/// A feature value that is a list yields its items verbatim; one that is a
/// bare string is whitespace-split into tags, matching the original
/// implementation's `extract_tags`. Absent (`Value::Null`/missing) is empty.
fn string_or_list(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Value::String(s) => s.split_whitespace().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
