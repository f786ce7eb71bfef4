//! Defines the command-line arguments and subcommands for the runner CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "xspec",
    version,
    about = "Runs XSpec behavior specifications through an external XSLT engine."
)]
pub struct XSpecArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run every test named by a suite manifest and write the reports.
    Run {
        /// Path to the suite manifest.
        #[arg(long, short, value_name = "FILE")]
        manifest: PathBuf,
        /// Write reports here instead of the manifest's report_dir.
        #[arg(long, value_name = "DIR")]
        report_dir: Option<PathBuf>,
    },
}
