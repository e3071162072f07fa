// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Job`: a mutable runtime wrapper around an immutable `Command`.

use crate::command::Command;
use crate::context::SharedContext;
use crate::error::ContextError;
use std::sync::Arc;

/// Runtime wrapper around one `Command`, owned by the scheduler for the
/// job's lifetime. `prepare` must run (synchronously, before the job's
/// worker is started) so the job's name is registered before any sibling
/// job can `depends_on` it.
#[derive(Debug, Clone)]
pub struct Job {
    command: Arc<Command>,
    prepared: bool,
}

impl Job {
    pub fn new(command: Arc<Command>) -> Self {
        Self {
            command,
            prepared: false,
        }
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn name(&self) -> Option<&str> {
        self.command.name()
    }

    pub fn background(&self) -> bool {
        self.command.background()
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Register this job's name (if any) with the shared context. Must run
    /// on the scheduling thread before the job's worker starts.
    pub fn prepare(&mut self, ctx: &SharedContext) -> Result<(), ContextError> {
        if let Some(name) = self.name() {
            ctx.register(name)?;
        }
        self.prepared = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
