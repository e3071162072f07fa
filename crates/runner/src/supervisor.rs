// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C4: spawn a child under the configured shell, stream its output,
//! enforce the output-idle timeout, and drive the retry loop.

use crate::error::SupervisorError;
use crate::scheduler::Shared;
use command_group::{CommandGroup, GroupChild};
use shrun_core::color::ColorLease;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex as StdMutex};
use std::thread;
use std::time::{Duration, Instant};

const PUMP_INTERVAL: Duration = Duration::from_millis(75);
const TERMINAL_WRITE_RETRIES: u32 = 100;
const TERMINAL_WRITE_BACKOFF: Duration = Duration::from_millis(5);

enum Stream {
    Stdout,
    Stderr,
}

/// A poisoned child-process mutex still holds a perfectly usable
/// `GroupChild`; recover it rather than propagating the panic, since the
/// only way to poison this lock is a panic in another attempt's supervisor
/// code, which already gets reported on its own thread.
fn lock_child(child: &StdMutex<GroupChild>) -> std::sync::MutexGuard<'_, GroupChild> {
    match child.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Tails a regular file that is being written to concurrently, yielding
/// complete lines as they appear and buffering any trailing, newline-less
/// fragment until either more bytes arrive or the caller asks for a final
/// flush.
struct TailReader {
    file: File,
    pending: Vec<u8>,
}

impl TailReader {
    fn open(path: &Path) -> io::Result<Self> {
        Ok(Self {
            file: File::open(path)?,
            pending: Vec::new(),
        })
    }

    fn drain_lines(&mut self) -> io::Result<Vec<String>> {
        let mut chunk = [0u8; 8192];
        loop {
            let n = self.file.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            self.pending.extend_from_slice(&chunk[..n]);
        }

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        Ok(lines)
    }

    /// Called once after the child has exited: flush a trailing fragment
    /// that never received a newline.
    fn drain_final(&mut self) -> io::Result<Vec<String>> {
        let mut lines = self.drain_lines()?;
        if !self.pending.is_empty() {
            lines.push(String::from_utf8_lossy(&std::mem::take(&mut self.pending)).into_owned());
        }
        Ok(lines)
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    shared: &Shared,
    job_id: usize,
    command_text: &str,
    name: Option<&str>,
    start: Instant,
    skip: bool,
    timeout: Option<f64>,
    ignore_status: bool,
    background: bool,
    retries: u32,
    interval: f64,
    color: ColorLease,
) -> bool {
    if skip {
        print_command(shared, color.color(), "", "Skipping", command_text);
        return true;
    }

    let mut passed = false;
    let mut last_pid: Option<u32> = None;
    for attempt in 0..=retries {
        let command_name = create_name(shared, name, command_text);
        let stdout_path = shared.config.tmpdir.join(format!(
            "{command_name}_{attempt}.stdout"
        ));
        let stderr_path = shared.config.tmpdir.join(format!(
            "{command_name}_{attempt}.stderr"
        ));

        passed = match run_attempt(
            shared,
            job_id,
            command_text,
            name,
            attempt,
            &stdout_path,
            &stderr_path,
            timeout,
            background,
            &color,
        ) {
            Ok((passed, pid)) => {
                last_pid = Some(pid);
                passed
            }
            Err(err) => {
                tracing::error!(%err, "failed to spawn or supervise attempt");
                false
            }
        };

        if passed || shared.dead.load(Ordering::SeqCst) {
            break;
        }
        if attempt < retries {
            let prefix = prefix_for(name, last_pid);
            print_colored(
                shared,
                Stream::Stdout,
                &color.color().paint(&format!("{prefix}| Retrying after {interval}s"), false),
            );
            thread::sleep(Duration::from_secs_f64(interval.max(0.0)));
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    let prefix = prefix_for(name, last_pid);
    let (message, bold) = if passed {
        ("Done", false)
    } else if ignore_status {
        ("Failed", false)
    } else {
        ("FAILED", true)
    };
    let suffix = if !passed && ignore_status {
        format!("(ignored) ({elapsed:.1}s)")
    } else {
        format!("({elapsed:.1}s)")
    };
    print_colored(
        shared,
        Stream::Stdout,
        &color.color().paint(&format!("{prefix}| {message} {suffix}"), bold),
    );

    passed
}

#[allow(clippy::too_many_arguments)]
fn run_attempt(
    shared: &Shared,
    _job_id: usize,
    command_text: &str,
    name: Option<&str>,
    attempt: u32,
    stdout_path: &Path,
    stderr_path: &Path,
    timeout: Option<f64>,
    background: bool,
    color: &ColorLease,
) -> Result<(bool, u32), SupervisorError> {
    let stdout_writer = File::create(stdout_path).map_err(|source| SupervisorError::LogFile {
        path: stdout_path.to_path_buf(),
        source,
    })?;
    let stderr_writer = File::create(stderr_path).map_err(|source| SupervisorError::LogFile {
        path: stderr_path.to_path_buf(),
        source,
    })?;
    let mut stdout_reader = TailReader::open(stdout_path).map_err(|source| SupervisorError::LogFile {
        path: stdout_path.to_path_buf(),
        source,
    })?;
    let mut stderr_reader = TailReader::open(stderr_path).map_err(|source| SupervisorError::LogFile {
        path: stderr_path.to_path_buf(),
        source,
    })?;

    let mut builder = StdCommand::new(&shared.config.shell);
    builder
        .arg("-c")
        .arg(command_text)
        .envs(&shared.config.environment)
        .stdout(Stdio::from(stdout_writer))
        .stderr(Stdio::from(stderr_writer));

    let child: GroupChild = builder.group_spawn().map_err(|source| SupervisorError::Spawn {
        shell: shared.config.shell.clone(),
        source,
    })?;

    let pid = child.id();
    let child = Arc::new(StdMutex::new(child));
    shared.live.lock().insert(pid, Arc::clone(&child));

    let prefix = prefix_for(name, Some(pid));
    let message = if attempt > 0 {
        format!("Retrying ({attempt})")
    } else {
        "Running".to_string()
    };
    print_command(shared, color.color(), &prefix, &message, command_text);

    let mut last_output = Instant::now();
    let status = loop {
        let exited = {
            let mut guard = lock_child(&child);
            guard.try_wait().ok().flatten()
        };

        let out_lines = stdout_reader.drain_lines().unwrap_or_default();
        let err_lines = stderr_reader.drain_lines().unwrap_or_default();
        let saw_output = !out_lines.is_empty() || !err_lines.is_empty();
        print_lines(shared, &out_lines, &format!("{prefix}| "), color.color());
        print_lines(shared, &err_lines, &format!("{prefix}: "), color.color());

        if let Some(status) = exited {
            break status;
        }

        let now = Instant::now();
        if let Some(timeout) = timeout {
            if !background && now.duration_since(last_output).as_secs_f64() > timeout {
                let mut guard = lock_child(&child);
                let _ = guard.kill();
                print_colored(
                    shared,
                    Stream::Stdout,
                    &color
                        .color()
                        .paint(&format!("{prefix}! OUTPUT TIMEOUT ({timeout:.1}s)"), true),
                );
            } else if saw_output {
                last_output = now;
            }
        } else if saw_output {
            last_output = now;
        }

        thread::sleep(PUMP_INTERVAL);
    };

    let final_out = stdout_reader.drain_final().unwrap_or_default();
    let final_err = stderr_reader.drain_final().unwrap_or_default();
    print_lines(shared, &final_out, &format!("{prefix}| "), color.color());
    print_lines(shared, &final_err, &format!("{prefix}: "), color.color());

    shared.live.lock().remove(&pid);

    Ok((status.success(), pid))
}

/// `<prefix>` for banners and output-line prefixes: the declared name, or
/// else the most recently known child PID for this job.
fn prefix_for(name: Option<&str>, pid: Option<u32>) -> String {
    name.map(str::to_string)
        .or_else(|| pid.map(|p| p.to_string()))
        .unwrap_or_else(|| "?".to_string())
}

fn create_name(shared: &Shared, name: Option<&str>, command_text: &str) -> String {
    if let Some(name) = name {
        return name.to_string();
    }
    let base = command_text
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .find(|s| !s.is_empty())
        .unwrap_or("job")
        .to_string();

    let mut counts = shared.name_counts.lock();
    match counts.get_mut(&base) {
        Some(count) => {
            *count += 1;
            format!("{base}_{count}")
        }
        None => {
            counts.insert(base.clone(), 0);
            base
        }
    }
}

fn print_command(shared: &Shared, color: shrun_core::color::Color, prefix: &str, message: &str, text: &str) {
    let _guard = shared.output_lock.lock();
    let lines: Vec<&str> = text.split('\n').collect();
    let body: Vec<String> = if lines.len() > 1 {
        std::iter::once(format!("{message}: "))
            .chain(lines.iter().map(|l| l.to_string()))
            .chain(std::iter::once("---".to_string()))
            .collect()
    } else {
        vec![format!("{message}: {}", lines[0])]
    };
    for line in body {
        write_line(Stream::Stdout, &color.paint(&format!("{prefix}| {line}"), false));
    }
}

fn print_lines(shared: &Shared, lines: &[String], prefix: &str, color: shrun_core::color::Color) {
    if lines.is_empty() {
        return;
    }
    let _guard = shared.output_lock.lock();
    for line in lines {
        write_line(Stream::Stdout, &color.paint(&format!("{prefix}{line}"), false));
    }
}

fn print_colored(shared: &Shared, stream: Stream, painted: &str) {
    let _guard = shared.output_lock.lock();
    write_line(stream, painted);
}

fn write_line(stream: Stream, line: &str) {
    let mut attempts = 0;
    loop {
        let result = match stream {
            Stream::Stdout => writeln!(io::stdout().lock(), "{line}"),
            Stream::Stderr => writeln!(io::stderr().lock(), "{line}"),
        };
        match result {
            Ok(()) => return,
            Err(_) if attempts < TERMINAL_WRITE_RETRIES => {
                attempts += 1;
                thread::sleep(TERMINAL_WRITE_BACKOFF);
            }
            Err(_) => return,
        }
    }
}

/// Print a single already-colour-painted line to stderr, honouring the same
/// retry-on-transient-failure policy as the job output pump. Used by the
/// scheduler for `NOT STARTED` and teardown messages.
pub(crate) fn eprint_colored(shared: &Shared, painted: &str) {
    print_colored(shared, Stream::Stderr, painted);
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
