// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn register_rejects_duplicate_names() {
    let ctx = SharedContext::new();
    ctx.register("build").unwrap();
    let err = ctx.register("build").unwrap_err();
    assert!(matches!(err, ContextError::DuplicateName(n) if n == "build"));
}

#[test]
fn register_ignores_empty_name() {
    let ctx = SharedContext::new();
    ctx.register("").unwrap();
    ctx.register("").unwrap();
}

#[test]
fn wait_for_unblocks_on_mark_done() {
    let ctx = Arc::new(SharedContext::new());
    ctx.register("first").unwrap();

    let waiter_ctx = Arc::clone(&ctx);
    let handle = thread::spawn(move || waiter_ctx.wait_for(&["first".to_string()]));

    thread::sleep(Duration::from_millis(20));
    ctx.mark_done(Some("first"), true);

    let failed = handle.join().unwrap();
    assert!(failed.is_empty());
}

#[test]
fn wait_for_reports_failed_dependency() {
    let ctx = SharedContext::new();
    ctx.register("setup").unwrap();
    ctx.mark_done(Some("setup"), false);
    let failed = ctx.wait_for(&["setup".to_string()]);
    assert_eq!(failed, vec!["setup".to_string()]);
}

#[test]
fn should_skip_rejects_mixed_if_unless() {
    let ctx = SharedContext::new();
    let err = ctx
        .should_skip(&["a".to_string()], &["b".to_string()])
        .unwrap_err();
    assert!(matches!(err, ContextError::MixedIfUnless));
}

#[test]
fn should_skip_if_true_when_no_predicate_is_set() {
    let ctx = SharedContext::new();
    ctx.set_predicates(&["skip_it".to_string()], true);
    assert!(!ctx.should_skip(&["skip_it".to_string()], &[]).unwrap());
    assert!(ctx
        .should_skip(&["other".to_string()], &[])
        .unwrap());
}

#[test]
fn should_skip_unless_true_when_predicate_is_set() {
    let ctx = SharedContext::new();
    ctx.set_predicates(&["skip_it".to_string()], true);
    assert!(ctx.should_skip(&[], &["skip_it".to_string()]).unwrap());
}