// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line surface for the `shrun` binary.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "shrun", version, about = "Run a declarative list of shell commands as a job graph")]
pub struct Cli {
    /// Verbosity (currently always on; kept for compatibility with the
    /// original flag).
    #[arg(short = 'v', long = "verbose", default_value_t = true)]
    pub verbose: bool,

    /// Shell used to execute commands.
    #[arg(long, default_value = "/bin/bash")]
    pub shell: String,

    /// Seconds for the entire run.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Seconds between retries.
    #[arg(long = "retry_interval", default_value_t = 1.0)]
    pub retry_interval: f64,

    /// Timeout for any job not generating output.
    #[arg(long = "output-timeout", default_value_t = 300.0)]
    pub output_timeout: f64,

    /// File to run.
    pub file: PathBuf,
}
