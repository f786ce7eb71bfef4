//! The transform-engine seam.
//!
//! Everything the harness needs from an XSLT processor is expressed through
//! the traits in this module: compiling a transform source into a reusable
//! [`Executable`], invoking it against a [`Document`], and counting outcome
//! elements in a result document. The processor itself stays external; one
//! production implementation that drives a Saxon-compatible command line
//! lives in [`process`].

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

pub mod process;

/// An execution-level failure reported by the engine.
///
/// These are expected test outcomes, not harness failures: the runner folds
/// them into the per-test result and the batch continues.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EngineError {
    /// Human-readable description of what went wrong.
    pub message: String,
    /// Full diagnostic output captured from the engine, when available.
    pub details: Option<String>,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: Some(details.into()),
        }
    }
}

/// A namespace-qualified name, rendered in Clark notation (`{uri}local`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub ns: String,
    pub local: String,
}

impl QName {
    pub fn new(ns: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            ns: ns.into(),
            local: local.into(),
        }
    }

    /// A name with no namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self::new("", local)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ns.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.ns, self.local)
        }
    }
}

/// A parameter value handed to a transform invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Number(f64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(text) => write!(f, "{}", text),
            ParamValue::Number(number) => write!(f, "{}", number),
        }
    }
}

/// Resource-resolution strategy for one invocation.
///
/// A plain value owned by the invocation that carries it: selecting a
/// catalog for one test can never leak into another test's resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolver {
    /// The engine's built-in resolution.
    Default,
    /// Resolution scoped to a catalog file.
    Catalog(PathBuf),
}

/// Receives engine messages and error reports during an invocation,
/// synchronously and in order.
pub trait DiagnosticSink {
    fn message(&mut self, text: &str);
}

/// Sink that discards everything it is given.
pub struct SilentSink;

impl DiagnosticSink for SilentSink {
    fn message(&mut self, _text: &str) {}
}

/// A document produced or consumed by the engine.
pub trait Document: fmt::Debug {
    /// The serialized form of the document.
    fn bytes(&self) -> Result<Vec<u8>, EngineError>;

    /// Backing file, when the document already lives on disk.
    fn path(&self) -> Option<&Path> {
        None
    }
}

/// A document backed by a file on disk.
#[derive(Debug, Clone)]
pub struct FileDocument {
    path: PathBuf,
}

impl FileDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Document for FileDocument {
    fn bytes(&self) -> Result<Vec<u8>, EngineError> {
        fs::read(&self.path)
            .map_err(|err| EngineError::new(format!("cannot read {}: {}", self.path.display(), err)))
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// Where a transform definition comes from.
#[derive(Debug, Clone)]
pub enum TransformSource {
    File(PathBuf),
    Doc(Arc<dyn Document>),
}

/// One invocation of an executable transform.
///
/// Built incrementally; fields left unset fall back to the engine's
/// defaults (no source document, no entry point, default resolution,
/// engine-default diagnostic handling).
pub struct Invocation<'a> {
    pub source: Option<&'a dyn Document>,
    pub entry: Option<&'a QName>,
    pub params: Vec<(QName, ParamValue)>,
    pub resolver: Resolver,
    pub sink: Option<&'a mut dyn DiagnosticSink>,
}

impl<'a> Invocation<'a> {
    pub fn new() -> Self {
        Self {
            source: None,
            entry: None,
            params: Vec::new(),
            resolver: Resolver::Default,
            sink: None,
        }
    }

    pub fn source(mut self, doc: &'a dyn Document) -> Self {
        self.source = Some(doc);
        self
    }

    pub fn entry(mut self, entry: &'a QName) -> Self {
        self.entry = Some(entry);
        self
    }

    pub fn param(mut self, name: QName, value: ParamValue) -> Self {
        self.params.push((name, value));
        self
    }

    pub fn resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn sink(mut self, sink: &'a mut dyn DiagnosticSink) -> Self {
        self.sink = Some(sink);
        self
    }
}

impl Default for Invocation<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome classes enumerated by an XSpec result document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeClass {
    Pending,
    Successful,
    Failed,
}

/// A compiled, reusable transform.
pub trait Executable: fmt::Debug {
    fn invoke(&self, invocation: Invocation<'_>) -> Result<Arc<dyn Document>, EngineError>;
}

/// The external transformation engine.
pub trait TransformEngine {
    /// Prepare a transform for repeated invocation.
    fn compile(&self, source: &TransformSource) -> Result<Box<dyn Executable>, EngineError>;

    /// Count outcome elements of the given class in a result document.
    fn count(&self, doc: &dyn Document, class: OutcomeClass) -> Result<usize, EngineError>;
}
