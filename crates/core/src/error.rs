// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the data model and template expander.

use thiserror::Error;

/// Configuration errors raised while expanding `{{…}}` series and `foreach`
/// sequences. All of these abort the run before any process is spawned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown keyword '{0}'")]
    UnknownKeyword(String),

    #[error("command '{0}' must be a string")]
    CommandNotAString(String),

    #[error("mapping for series '{0}' must be 1-1")]
    SeriesMappingMismatch(String),

    #[error("series '{0}' is already defined in a parent sequence")]
    SeriesAlreadyDefined(String),

    #[error("'foreach' requires a series specification")]
    MissingForeachSeries,
}

/// Errors raised by [`crate::context::SharedContext`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("name '{0}' is already in use")]
    DuplicateName(String),

    #[error("'if' and 'unless' predicates cannot both be set")]
    MixedIfUnless,
}
