//! Fatal harness failures.
//!
//! Execution-level engine errors are expected test outcomes and never
//! appear here; see [`crate::engine::EngineError`]. Everything in this
//! module invalidates the whole run: missing startup resources, report
//! emission failures, unusable manifests.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::engine::EngineError;

#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    /// A bundled stylesheet could not be found at startup.
    #[error("missing bundled resource: {path}")]
    #[diagnostic(
        code(xspec::missing_resource),
        help("point the resources directory at an XSpec distribution containing the compiler and reporter stylesheets")
    )]
    MissingResource { path: PathBuf },

    /// A bundled transform could not be prepared at startup.
    #[error("failed to prepare the {name} transform")]
    #[diagnostic(code(xspec::startup))]
    Startup {
        name: &'static str,
        #[source]
        source: EngineError,
    },

    /// An I/O failure while writing a report file.
    #[error("failed to write {path}")]
    #[diagnostic(
        code(xspec::report_io),
        help("check that the report directory exists and is writable")
    )]
    ReportIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A report-formatting transform failed for an otherwise healthy test.
    #[error("formatting reports for test `{test}` failed")]
    #[diagnostic(code(xspec::report_transform))]
    ReportTransform {
        test: String,
        #[source]
        source: EngineError,
    },

    #[error("cannot read suite manifest {path}")]
    #[diagnostic(code(xspec::manifest))]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse suite manifest {path}")]
    #[diagnostic(
        code(xspec::manifest),
        help("the manifest is YAML with report_dir, resources, engine, and tests entries")
    )]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
