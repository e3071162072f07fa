// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Command`: an immutable shell string paired with its feature mapping.

use crate::error::TemplateError;
use crate::series::{self, Series};

/// The fixed feature-keyword set from a command entry. Every field here is
/// already normalized (string-or-list values collapsed to `Vec<String>`,
/// durations to `f64` seconds) by the time a `Command` exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Features {
    pub name: Option<String>,
    pub background: bool,
    pub depends_on: Vec<String>,
    pub if_preds: Vec<String>,
    pub unless_preds: Vec<String>,
    pub set_preds: Vec<String>,
    pub timeout: Option<f64>,
    pub retries: u32,
    pub interval: Option<f64>,
}

/// An immutable command value: shell source text plus its feature mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub text: String,
    pub features: Features,
}

impl Command {
    pub fn new(text: impl Into<String>, features: Features) -> Self {
        Self {
            text: text.into(),
            features,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.features.name.as_deref()
    }

    pub fn background(&self) -> bool {
        self.features.background
    }

    /// Substitute every `{{…}}` occurrence identifying `series` (in both the
    /// command text and every string-valued feature) with the item at
    /// `index`.
    pub fn expand_series(&self, target: &Series, index: usize) -> Result<Command, TemplateError> {
        let text = series::substitute(&self.text, target, index)?;

        let name = self
            .features
            .name
            .as_deref()
            .map(|n| series::substitute(n, target, index))
            .transpose()?;

        let expand_list = |list: &[String]| -> Result<Vec<String>, TemplateError> {
            list.iter()
                .map(|item| series::substitute(item, target, index))
                .collect()
        };

        Ok(Command {
            text,
            features: Features {
                name,
                background: self.features.background,
                depends_on: expand_list(&self.features.depends_on)?,
                if_preds: expand_list(&self.features.if_preds)?,
                unless_preds: expand_list(&self.features.unless_preds)?,
                set_preds: expand_list(&self.features.set_preds)?,
                timeout: self.features.timeout,
                retries: self.features.retries,
                interval: self.features.interval,
            },
        })
    }

    /// Yield a command for every item-permutation of every series present in
    /// the command text (scanning only the text, per the driving-series
    /// rule; features co-expand along with whichever series drives).
    pub fn generate_all_commands(self) -> Result<Vec<Command>, TemplateError> {
        let Some(series) = series::first_series(&self.text) else {
            return Ok(vec![self]);
        };
        let series = series?;

        let mut out = Vec::with_capacity(series.items().len());
        for index in 0..series.items().len() {
            let expanded = self.expand_series(&series, index)?;
            out.extend(expanded.generate_all_commands()?);
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
