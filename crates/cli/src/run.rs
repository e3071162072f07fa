// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C6: the run controller. Wires document loading, the template expander,
//! and the job scheduler together; owns the global deadline, signal
//! handling, the `post` phase, and the temp-directory lifecycle.

use crate::cli::Cli;
use crate::color::red;
use crate::config_error::ConfigError;
use crate::document::{self, Document};
use crate::exit_error::ExitError;
use indexmap::IndexMap;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use shrun_core::command::Command;
use shrun_runner::{generate_commands, JobOutcome, RunnerConfig, Scheduler};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

struct PhaseOutcome {
    failed: Vec<Command>,
    running: Vec<Command>,
}

pub fn run(cli: Cli) -> Result<(), ExitError> {
    let document = document::load_document(&cli.file).map_err(config_to_exit)?;

    let tmpdir = tempfile::tempdir()
        .map_err(|source| ExitError::new(1, format!("failed to create temp dir: {source}")))?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let active_scheduler: Arc<Mutex<Option<Arc<Scheduler>>>> = Arc::new(Mutex::new(None));

    let _signal_thread = spawn_signal_thread(Arc::clone(&interrupted), Arc::clone(&active_scheduler));
    let cancel_timer = spawn_timeout_timer(cli.timeout);

    let main_result = run_phase(
        &cli,
        &document,
        &document.main,
        tmpdir.path(),
        &interrupted,
        &active_scheduler,
    );

    // Cancel the deadline timer now that the main phase is done; a dropped
    // sender is a no-op if there was never a timer.
    drop(cancel_timer);

    let main_outcome = main_result.map_err(config_to_exit)?;

    let failed_command = if let Some(first) = main_outcome.failed.first() {
        Some(first.text.clone())
    } else if interrupted.load(Ordering::SeqCst) {
        main_outcome.running.last().map(|c| c.text.clone())
    } else {
        None
    };

    if !document.post.is_empty() {
        println!("Running 'post' commands");
        let _ = run_phase(
            &cli,
            &document,
            &document.post,
            tmpdir.path(),
            &interrupted,
            &active_scheduler,
        );
    }

    if let Err(err) = tmpdir.close() {
        eprintln!("Unable to remove temp dir. Got '{err}'");
    }

    let was_interrupted = interrupted.load(Ordering::SeqCst);
    if was_interrupted {
        eprintln!("{}", red("KEYBOARD INTERRUPT"));
    }

    if let Some(text) = failed_command {
        return Err(ExitError::new(
            1,
            red(&format!("FAILED: Failed while running '{text}'")),
        ));
    }

    // An interrupt always exits non-zero, even when it lands before any
    // command could be singled out as the failing one.
    if was_interrupted {
        return Err(ExitError::new(1, red("FAILED")));
    }

    Ok(())
}

fn run_phase(
    cli: &Cli,
    document: &Document,
    entries: &[serde_yaml::Value],
    tmpdir: &std::path::Path,
    interrupted: &Arc<AtomicBool>,
    active_scheduler: &Arc<Mutex<Option<Arc<Scheduler>>>>,
) -> Result<PhaseOutcome, ConfigError> {
    let commands = generate_commands(entries)?;
    validate_unique_names(&commands)?;

    let environment = merge_environment(&document.environment);

    let scheduler = Arc::new(Scheduler::new(RunnerConfig {
        shell: cli.shell.clone(),
        tmpdir: tmpdir.to_path_buf(),
        environment,
        retry_interval: cli.retry_interval,
        output_timeout: cli.output_timeout,
    }));

    *active_scheduler.lock() = Some(Arc::clone(&scheduler));

    let mut stop_feeding = false;
    for (job_id, command) in commands.into_iter().enumerate() {
        if stop_feeding || interrupted.load(Ordering::SeqCst) {
            break;
        }
        match scheduler.start(command, job_id)? {
            JobOutcome::Failed => stop_feeding = true,
            JobOutcome::Passed | JobOutcome::Pending => {}
        }
    }

    scheduler.finish();
    let failed = scheduler.failures();
    let running = scheduler.running();
    scheduler.kill_all();

    *active_scheduler.lock() = None;

    Ok(PhaseOutcome { failed, running })
}

fn validate_unique_names(commands: &[Command]) -> Result<(), ConfigError> {
    let mut seen = std::collections::HashSet::new();
    for command in commands {
        if let Some(name) = command.name() {
            if !seen.insert(name) {
                return Err(ConfigError::DuplicateName(name.to_string()));
            }
        }
    }
    Ok(())
}

fn merge_environment(overlay: &IndexMap<String, String>) -> HashMap<String, String> {
    overlay
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn config_to_exit(err: ConfigError) -> ExitError {
    ExitError::new(1, red(&format!("{err}")))
}

/// Catch SIGINT/SIGTERM in a background thread for the lifetime of the
/// process. SIGINT marks the run interrupted and tears down whichever
/// scheduler is currently active, then keeps listening so the main thread
/// can continue into the `post` phase and final report — including the case
/// where the deadline timer's self-SIGTERM arrives during that later phase.
/// SIGTERM (raised by the deadline timer, or sent externally) tears down and
/// exits the process directly from the signal handler, so the `post` phase
/// never runs on that path.
fn spawn_signal_thread(
    interrupted: Arc<AtomicBool>,
    active_scheduler: Arc<Mutex<Option<Arc<Scheduler>>>>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let mut signals = match Signals::new([SIGINT, SIGTERM]) {
            Ok(signals) => signals,
            Err(err) => {
                tracing::error!(%err, "failed to install signal handler");
                return;
            }
        };

        for signal in signals.forever() {
            let scheduler = active_scheduler.lock().clone();

            match signal {
                SIGINT => {
                    interrupted.store(true, Ordering::SeqCst);
                    if let Some(scheduler) = scheduler {
                        scheduler.kill_all();
                    }
                }
                SIGTERM => {
                    if let Some(scheduler) = scheduler {
                        scheduler.kill_all();
                    }
                    eprintln!("{}", red("FAILED"));
                    std::process::exit(1);
                }
                _ => {}
            }
        }
    })
}

/// One-shot whole-run deadline. Dropping the returned sender cancels the
/// timer if it hasn't fired yet.
fn spawn_timeout_timer(timeout_secs: Option<u64>) -> Option<mpsc::Sender<()>> {
    let secs = timeout_secs?;
    let (tx, rx) = mpsc::channel::<()>();
    std::thread::spawn(move || {
        if let Err(mpsc::RecvTimeoutError::Timeout) = rx.recv_timeout(Duration::from_secs(secs)) {
            eprintln!("{}", red(&format!("FAILED: Timed out after {secs} seconds")));
            let _ = signal::kill(Pid::this(), Signal::SIGTERM);
        }
    });
    Some(tx)
}
