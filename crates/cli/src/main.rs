// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `shrun`: run a declarative list of shell commands as a concurrent job
//! graph. This binary wires the external collaborators (document loading,
//! CLI parsing, colour rendering, signal handling) around the
//! `shrun-core`/`shrun-runner` scheduler.

mod cli;
mod color;
mod config_error;
mod document;
mod exit_error;
mod run;

use clap::Parser;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = cli::Cli::parse();

    if let Err(err) = run::run(cli) {
        eprintln!("{err}");
        std::process::exit(err.code);
    }
}
