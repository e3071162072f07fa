// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SharedContext`: name registry, dependency wait/notify, and predicate
//! store, shared by every job's worker for the duration of one run.

use crate::error::ContextError;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameStatus {
    Pending,
    Passed,
    Failed,
}

#[derive(Default)]
struct Inner {
    name_result: HashMap<String, NameStatus>,
    predicates: HashMap<String, bool>,
}

pub struct SharedContext {
    inner: Mutex<Inner>,
    done: Condvar,
}

impl Default for SharedContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedContext {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            done: Condvar::new(),
        }
    }

    /// Register a name as `pending`. A no-op for an empty (anonymous) name.
    /// Fails if the name is already registered — names must be unique
    /// within a run.
    pub fn register(&self, name: &str) -> Result<(), ContextError> {
        if name.is_empty() {
            return Ok(());
        }
        let mut inner = self.inner.lock();
        if inner.name_result.contains_key(name) {
            return Err(ContextError::DuplicateName(name.to_string()));
        }
        inner.name_result.insert(name.to_string(), NameStatus::Pending);
        Ok(())
    }

    /// Block until every listed name has reached a terminal state, then
    /// return the subset that failed (empty means all of them passed). A
    /// name never registered is waited on indefinitely, same as a pending
    /// one — callers are expected to only depend on names that exist.
    pub fn wait_for(&self, names: &[String]) -> Vec<String> {
        if names.is_empty() {
            return Vec::new();
        }
        let mut guard = self.inner.lock();
        loop {
            let all_terminal = names
                .iter()
                .all(|n| matches!(guard.name_result.get(n.as_str()), Some(s) if *s != NameStatus::Pending));
            if all_terminal {
                break;
            }
            self.done.wait(&mut guard);
        }
        names
            .iter()
            .filter(|n| matches!(guard.name_result.get(n.as_str()), Some(NameStatus::Failed)))
            .cloned()
            .collect()
    }

    /// Transition `name` to a terminal state and wake every waiter. A no-op
    /// for an empty (anonymous) name.
    pub fn mark_done(&self, name: Option<&str>, passed: bool) {
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            return;
        };
        {
            let mut inner = self.inner.lock();
            inner.name_result.insert(
                name.to_string(),
                if passed {
                    NameStatus::Passed
                } else {
                    NameStatus::Failed
                },
            );
        }
        self.done.notify_all();
    }

    /// Store `value` for every predicate name listed.
    pub fn set_predicates(&self, names: &[String], value: bool) {
        if names.is_empty() {
            return;
        }
        let mut inner = self.inner.lock();
        for name in names {
            inner.predicates.insert(name.clone(), value);
        }
    }

    /// `if`/`unless` are mutually exclusive. A predicate that was never set
    /// reads as `false` rather than panicking — safer than the source's bare
    /// dict index, and lets `if`/`unless` reference a predicate that simply
    /// hasn't fired yet.
    pub fn should_skip(
        &self,
        if_preds: &[String],
        unless_preds: &[String],
    ) -> Result<bool, ContextError> {
        if !if_preds.is_empty() && !unless_preds.is_empty() {
            return Err(ContextError::MixedIfUnless);
        }

        let inner = self.inner.lock();
        let value_of = |name: &str| inner.predicates.get(name).copied().unwrap_or(false);

        let if_skips = !if_preds.is_empty() && !if_preds.iter().any(|p| value_of(p));
        let unless_skips = !unless_preds.is_empty() && unless_preds.iter().any(|p| value_of(p));
        Ok(if_skips || unless_skips)
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
