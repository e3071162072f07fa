// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `{{…}}` series: identity, parsing, and text substitution.

use crate::error::TemplateError;
use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static SERIES_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("constant regex pattern is valid"));

#[allow(clippy::expect_used)]
static LABEL_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_]+):(.*)$").expect("constant regex pattern is valid"));

/// A single `{{…}}` occurrence. Two series are equal when their identities
/// match: labeled series are identified by their label, unlabeled series by
/// their (ordered) item list.
#[derive(Debug, Clone)]
pub enum Series {
    Unlabeled { items: Vec<String> },
    Labeled { label: String, items: Vec<String> },
}

impl Series {
    /// Parse the inner text of a `{{…}}` occurrence (without the braces),
    /// e.g. `"my:A,B"` or `"A,B"`.
    pub fn parse(inner: &str) -> Result<Series, TemplateError> {
        if let Some(caps) = LABEL_PREFIX.captures(inner) {
            let label = caps[1].to_string();
            let items = split_items(&caps[2]);
            return Ok(Series::Labeled { label, items });
        }
        Ok(Series::Unlabeled {
            items: split_items(inner),
        })
    }

    pub fn labeled(label: impl Into<String>, items: Vec<String>) -> Self {
        Series::Labeled {
            label: label.into(),
            items,
        }
    }

    pub fn unlabeled(items: Vec<String>) -> Self {
        Series::Unlabeled { items }
    }

    pub fn is_labeled(&self) -> bool {
        matches!(self, Series::Labeled { .. })
    }

    pub fn items(&self) -> &[String] {
        match self {
            Series::Unlabeled { items } | Series::Labeled { items, .. } => items,
        }
    }

    /// Identity used for equality / co-expansion: the label for labeled
    /// series, or the comma-joined item list for unlabeled ones.
    pub fn identity(&self) -> String {
        match self {
            Series::Unlabeled { items } => items.join(","),
            Series::Labeled { label, .. } => label.clone(),
        }
    }
}

impl PartialEq for Series {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Series {}

fn split_items(s: &str) -> Vec<String> {
    s.split(',').map(|item| item.to_string()).collect()
}

/// Find and parse the first `{{…}}` occurrence in `text`, if any.
pub fn first_series(text: &str) -> Option<Result<Series, TemplateError>> {
    SERIES_SPAN
        .captures(text)
        .map(|caps| Series::parse(&caps[1]))
}

/// Replace every `{{…}}` occurrence in `text` whose identity matches `target`
/// with `target`'s (or, for labeled occurrences, the occurrence's own) item
/// at `index`. Occurrences identifying a different series are left in place
/// for a later expansion pass.
#[allow(clippy::expect_used)]
pub fn substitute(text: &str, target: &Series, index: usize) -> Result<String, TemplateError> {
    let mut result = String::with_capacity(text.len());
    let mut last_end = 0;

    for m in SERIES_SPAN.captures_iter(text) {
        let whole = m.get(0).expect("group 0 always matches");
        let occurrence = Series::parse(&m[1])?;
        if occurrence.identity() != target.identity() {
            continue;
        }

        let value = if occurrence.is_labeled() {
            if occurrence.items().len() != target.items().len() {
                return Err(TemplateError::SeriesMappingMismatch(target.identity()));
            }
            occurrence.items()[index].clone()
        } else {
            target.items()[index].clone()
        };

        result.push_str(&text[last_end..whole.start()]);
        result.push_str(&value);
        last_end = whole.end();
    }

    result.push_str(&text[last_end..]);
    Ok(result)
}

#[cfg(test)]
#[path = "series_tests.rs"]
mod tests;
