// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::command::Features;
use std::sync::Arc;

fn named_command(name: &str) -> Command {
    let mut features = Features::default();
    features.name = Some(name.to_string());
    Command::new("echo hi", features)
}

#[test]
fn prepare_registers_the_job_name() {
    let ctx = SharedContext::new();
    let mut job = Job::new(Arc::new(named_command("build")));
    assert!(!job.is_prepared());

    job.prepare(&ctx).unwrap();
    assert!(job.is_prepared());

    // Registering the same name again now fails: the job already claimed it.
    assert!(ctx.register("build").is_err());
}

#[test]
fn prepare_is_a_no_op_for_an_anonymous_command() {
    let ctx = SharedContext::new();
    let mut job = Job::new(Arc::new(Command::new("echo hi", Features::default())));
    job.prepare(&ctx).unwrap();
    assert_eq!(job.name(), None);
}

#[test]
fn prepare_fails_on_a_duplicate_name() {
    let ctx = SharedContext::new();
    ctx.register("build").unwrap();

    let mut job = Job::new(Arc::new(named_command("build")));
    assert!(job.prepare(&ctx).is_err());
}

#[test]
fn name_and_background_project_from_the_command() {
    let mut features = Features::default();
    features.name = Some("build".to_string());
    features.background = true;
    let job = Job::new(Arc::new(Command::new("echo hi", features)));
    assert_eq!(job.name(), Some("build"));
    assert!(job.background());
}