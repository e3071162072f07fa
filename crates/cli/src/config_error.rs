// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised while loading and decoding the configuration document,
//! before any process is spawned.

use shrun_core::error::{ContextError, TemplateError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("top-level document must be a list of commands or a mapping with 'main'/'post'/'environment'")]
    InvalidTopLevel,

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("name '{0}' is used by more than one command")]
    DuplicateName(String),
}
