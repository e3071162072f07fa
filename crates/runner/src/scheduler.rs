// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C5: construct Jobs, start worker threads, sequence synchronous vs
//! asynchronous execution, and aggregate pass/fail/running results.

use crate::supervisor;
use command_group::GroupChild;
use parking_lot::Mutex;
use shrun_core::color::{Color, ColorPool};
use shrun_core::command::Command;
use shrun_core::context::SharedContext;
use shrun_core::error::ContextError;
use shrun_core::job::Job;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex as StdMutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Pending,
    Passed,
    Failed,
}

pub struct RunnerConfig {
    pub shell: String,
    pub tmpdir: PathBuf,
    pub environment: HashMap<String, String>,
    pub retry_interval: f64,
    pub output_timeout: f64,
}

pub(crate) struct Shared {
    pub(crate) config: RunnerConfig,
    pub(crate) colors: ColorPool,
    pub(crate) context: SharedContext,
    pub(crate) live: Mutex<HashMap<u32, Arc<StdMutex<GroupChild>>>>,
    pub(crate) output_lock: Mutex<()>,
    pub(crate) name_counts: Mutex<HashMap<String, u32>>,
    pub(crate) dead: AtomicBool,
    pub(crate) results: Mutex<HashMap<usize, (Command, JobOutcome)>>,
}

/// Owns the shared runtime state for one scheduler run: colour pool, live
/// process set, per-name counters, the dead flag, and the `normal` /
/// `background` worker registries.
pub struct Scheduler {
    shared: Arc<Shared>,
    normal: Mutex<Vec<JoinHandle<()>>>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                colors: ColorPool::new(),
                context: SharedContext::new(),
                live: Mutex::new(HashMap::new()),
                output_lock: Mutex::new(()),
                name_counts: Mutex::new(HashMap::new()),
                dead: AtomicBool::new(false),
                results: Mutex::new(HashMap::new()),
            }),
            normal: Mutex::new(Vec::new()),
            background: Mutex::new(Vec::new()),
        }
    }

    /// Create a Job for `command`, register its name, record it pending,
    /// and start its worker thread. Blocks until the worker finishes when
    /// the Job is neither `background` nor named (the synchronous gate).
    pub fn start(&self, command: Command, job_id: usize) -> Result<JobOutcome, ContextError> {
        let mut job = Job::new(Arc::new(command));
        job.prepare(&self.shared.context)?;

        let command = job.command().clone();
        let background = job.background();
        let name = job.name().map(str::to_string);
        let synchronous = !background && name.is_none();

        self.shared
            .results
            .lock()
            .insert(job_id, (command.clone(), JobOutcome::Pending));

        let shared = Arc::clone(&self.shared);
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let passed = run_job(&shared, job_id, &command, name.as_deref(), background);
            let _ = tx.send(passed);
        });

        if background {
            self.background.lock().push(handle);
        } else {
            self.normal.lock().push(handle);
        }

        if synchronous {
            let passed = rx.recv().unwrap_or(false);
            return Ok(if passed {
                JobOutcome::Passed
            } else {
                JobOutcome::Failed
            });
        }
        Ok(JobOutcome::Pending)
    }

    /// Join every `normal` worker (background workers are left running).
    pub fn finish(&self) {
        let handles: Vec<_> = self.normal.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.join();
        }
    }

    /// Set the dead flag, kill every live child, and spin until every
    /// worker (normal and background) has returned.
    pub fn kill_all(&self) {
        loop {
            let all_finished = {
                let normal = self.normal.lock();
                let background = self.background.lock();
                normal.iter().all(|h| h.is_finished())
                    && background.iter().all(|h| h.is_finished())
            };

            if all_finished {
                break;
            }

            self.shared.dead.store(true, Ordering::SeqCst);
            {
                let live = self.shared.live.lock();
                for child in live.values() {
                    let mut guard = match child.lock() {
                        Ok(guard) => guard,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    let _ = guard.kill();
                }
            }
            thread::sleep(Duration::from_millis(100));
        }

        for handle in self.normal.lock().drain(..).chain(self.background.lock().drain(..)) {
            let _ = handle.join();
        }
    }

    pub fn failures(&self) -> Vec<Command> {
        self.shared
            .results
            .lock()
            .values()
            .filter(|(_, outcome)| *outcome == JobOutcome::Failed)
            .map(|(command, _)| command.clone())
            .collect()
    }

    pub fn running(&self) -> Vec<Command> {
        self.shared
            .results
            .lock()
            .values()
            .filter(|(_, outcome)| *outcome == JobOutcome::Pending)
            .map(|(command, _)| command.clone())
            .collect()
    }

    pub fn shared_context(&self) -> &SharedContext {
        &self.shared.context
    }
}

fn record_result(shared: &Shared, job_id: usize, command: &Command, outcome: JobOutcome) {
    shared
        .results
        .lock()
        .insert(job_id, (command.clone(), outcome));
}

fn run_job(
    shared: &Shared,
    job_id: usize,
    command: &Command,
    name: Option<&str>,
    background: bool,
) -> bool {
    let start = Instant::now();
    let features = &command.features;

    let failed_deps = shared.context.wait_for(&features.depends_on);
    if !failed_deps.is_empty() {
        supervisor::eprint_colored(
            shared,
            &Color::Red.paint(&format!("NOT STARTED: {}", command.text), false),
        );
        shared.context.mark_done(name, false);
        record_result(shared, job_id, command, JobOutcome::Failed);
        return false;
    }

    let skip = match shared
        .context
        .should_skip(&features.if_preds, &features.unless_preds)
    {
        Ok(skip) => skip,
        Err(err) => {
            tracing::error!(%err, "predicate evaluation failed");
            false
        }
    };

    let color = shared.colors.lease();
    let timeout = features.timeout.or(Some(shared.config.output_timeout));
    let interval = features.interval.unwrap_or(shared.config.retry_interval);
    let ignore_status = !features.set_preds.is_empty();

    let passed = supervisor::run(
        shared,
        job_id,
        &command.text,
        name,
        start,
        skip,
        timeout,
        ignore_status,
        background,
        features.retries,
        interval,
        color,
    );

    shared.context.mark_done(name, passed);
    shared.context.set_predicates(&features.set_preds, passed);

    // A command carrying a non-empty `set` never contributes to the
    // failed list even if it exits non-zero — it's reporting a
    // condition for later predicates, not asserting its own success.
    let counts_as_passed = ignore_status || passed;
    let outcome = if counts_as_passed {
        JobOutcome::Passed
    } else {
        JobOutcome::Failed
    };
    record_result(shared, job_id, command, outcome);

    counts_as_passed
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
