//! The xspec-runner command-line interface.
//!
//! This module is the main entry point for the CLI and orchestrates the
//! core library functions: load the manifest, stand up the process engine
//! and the runner, run the suite, summarize.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::cli::args::{Command, XSpecArgs};
use crate::engine::process::ProcessEngine;
use crate::error::HarnessError;
use crate::manifest::Manifest;
use crate::results::TestResults;
use crate::runner::{Resources, XSpecRunner};

pub mod args;
pub mod output;

/// The main entry point for the CLI. Returns the process exit code.
pub fn run() -> u8 {
    let args = XSpecArgs::parse();

    match args.command {
        Command::Run {
            manifest,
            report_dir,
        } => match run_suite(&manifest, report_dir) {
            Ok(results) => {
                output::print_summary(&results);
                u8::from(results.has_failures())
            }
            Err(err) => {
                eprintln!("{:?}", miette::Report::new(err));
                2
            }
        },
    }
}

fn run_suite(
    manifest_path: &Path,
    report_dir_override: Option<PathBuf>,
) -> Result<TestResults, HarnessError> {
    let manifest = Manifest::load(manifest_path)?;
    let report_dir = report_dir_override.unwrap_or_else(|| manifest.report_dir.clone());

    let engine = ProcessEngine::new(
        manifest.engine.transform.clone(),
        manifest.engine.query.clone(),
    )
    .map_err(|source| HarnessError::Startup {
        name: "engine",
        source,
    })?;
    let resources = Resources::from_dir(&manifest.resources)?;
    let runner = XSpecRunner::new(Box::new(engine), resources)?;

    runner.run(manifest.test_mapping(), &report_dir)
}
