//! Engine implementation that drives a Saxon-compatible command line.
//!
//! The processor is reached through two argv prefixes, one for its
//! transform entry point and one for its query entry point, e.g.
//! `["java", "-cp", "saxon.jar", "net.sf.saxon.Transform"]` and
//! `["java", "-cp", "saxon.jar", "net.sf.saxon.Query"]`. Intermediate
//! documents live in a scratch directory owned by the engine.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tempfile::TempDir;

use super::{
    DiagnosticSink, Document, EngineError, Executable, FileDocument, Invocation, OutcomeClass,
    ParamValue, QName, Resolver, TransformEngine, TransformSource,
};

const XSPEC_NS: &str = "http://www.jenitennison.com/xslt/xspec";

/// Drives an external XSLT/XQuery processor through its CLI.
#[derive(Debug)]
pub struct ProcessEngine {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    transform_argv: Vec<String>,
    query_argv: Vec<String>,
    scratch: TempDir,
    serial: AtomicU64,
}

impl ProcessEngine {
    pub fn new(transform_argv: Vec<String>, query_argv: Vec<String>) -> Result<Self, EngineError> {
        if transform_argv.is_empty() || query_argv.is_empty() {
            return Err(EngineError::new("engine command lines must not be empty"));
        }
        let scratch = TempDir::new()
            .map_err(|err| EngineError::new(format!("cannot create scratch directory: {}", err)))?;
        Ok(Self {
            inner: Arc::new(Inner {
                transform_argv,
                query_argv,
                scratch,
                serial: AtomicU64::new(0),
            }),
        })
    }
}

impl Inner {
    fn scratch_file(&self, stem: &str) -> PathBuf {
        let n = self.serial.fetch_add(1, Ordering::Relaxed);
        self.scratch.path().join(format!("{}-{}.xml", stem, n))
    }

    /// Ensure the document is addressable as a file the processor can read.
    fn materialize(&self, doc: &dyn Document, stem: &str) -> Result<PathBuf, EngineError> {
        if let Some(path) = doc.path() {
            return Ok(path.to_path_buf());
        }
        let path = self.scratch_file(stem);
        std::fs::write(&path, doc.bytes()?)
            .map_err(|err| EngineError::new(format!("cannot write scratch document: {}", err)))?;
        Ok(path)
    }

    /// Run one processor invocation, streaming stderr into the sink.
    fn run(
        &self,
        argv: &[String],
        args: &[String],
        mut sink: Option<&mut dyn DiagnosticSink>,
    ) -> Result<Vec<u8>, EngineError> {
        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .args(args)
            .output()
            .map_err(|err| EngineError::new(format!("cannot launch {}: {}", argv[0], err)))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if let Some(sink) = sink.as_mut() {
            for line in stderr.lines() {
                sink.message(line);
            }
        }

        if !output.status.success() {
            return Err(EngineError::with_details(
                format!("{} exited with {}", argv[0], output.status),
                stderr.trim().to_string(),
            ));
        }
        Ok(output.stdout)
    }
}

#[derive(Debug)]
struct ProcessExecutable {
    stylesheet: PathBuf,
    engine: Arc<Inner>,
}

impl Executable for ProcessExecutable {
    fn invoke(&self, invocation: Invocation<'_>) -> Result<Arc<dyn Document>, EngineError> {
        let Invocation {
            source,
            entry,
            params,
            resolver,
            sink,
        } = invocation;

        let source_path = match source {
            Some(doc) => Some(self.engine.materialize(doc, "source")?),
            None => None,
        };
        let out = self.engine.scratch_file("result");
        let args = transform_args(
            &self.stylesheet,
            &out,
            source_path.as_deref(),
            entry,
            &resolver,
            &params,
        );
        self.engine.run(&self.engine.transform_argv, &args, sink)?;
        Ok(Arc::new(FileDocument::new(out)))
    }
}

impl TransformEngine for ProcessEngine {
    fn compile(&self, source: &TransformSource) -> Result<Box<dyn Executable>, EngineError> {
        // CLI processors compile per invocation; compilation here pins the
        // stylesheet to a readable file and defers real errors to invoke.
        let stylesheet = match source {
            TransformSource::File(path) => {
                if !path.is_file() {
                    return Err(EngineError::new(format!(
                        "stylesheet not found: {}",
                        path.display()
                    )));
                }
                path.clone()
            }
            TransformSource::Doc(doc) => self.inner.materialize(doc.as_ref(), "stylesheet")?,
        };
        Ok(Box::new(ProcessExecutable {
            stylesheet,
            engine: Arc::clone(&self.inner),
        }))
    }

    fn count(&self, doc: &dyn Document, class: OutcomeClass) -> Result<usize, EngineError> {
        let path = self.inner.materialize(doc, "query-input")?;
        let args = vec![
            format!("-s:{}", path.display()),
            format!("-qs:{}", count_expression(class)),
        ];
        let stdout = self.inner.run(&self.inner.query_argv, &args, None)?;
        let text = String::from_utf8_lossy(&stdout);
        let text = text.trim();
        text.parse::<usize>()
            .map_err(|_| EngineError::new(format!("unexpected count result: {:?}", text)))
    }
}

fn transform_args(
    stylesheet: &Path,
    out: &Path,
    source: Option<&Path>,
    entry: Option<&QName>,
    resolver: &Resolver,
    params: &[(QName, ParamValue)],
) -> Vec<String> {
    let mut args = vec![
        format!("-xsl:{}", stylesheet.display()),
        format!("-o:{}", out.display()),
    ];
    if let Some(source) = source {
        args.push(format!("-s:{}", source.display()));
    }
    if let Some(entry) = entry {
        args.push(format!("-it:{}", entry));
    }
    if let Resolver::Catalog(catalog) = resolver {
        args.push(format!("-catalog:{}", catalog.display()));
    }
    for (name, value) in params {
        args.push(format!("{}={}", name, value));
    }
    args
}

fn count_expression(class: OutcomeClass) -> String {
    let matched = match class {
        OutcomeClass::Pending => "//x:test[@pending]",
        OutcomeClass::Successful => "//x:test[@successful = 'true']",
        OutcomeClass::Failed => "//x:test[@successful = 'false'][not(@pending)]",
    };
    format!("declare namespace x = \"{}\"; count({})", XSPEC_NS, matched)
}
