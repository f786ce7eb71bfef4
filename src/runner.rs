//! The per-test execution pipeline and batch aggregation.
//!
//! Each test goes through compile → resolve context → execute → classify,
//! and, when execution was error-free, four report emissions: the raw
//! result document, the shared CSS asset, an HTML report, and a
//! CI-compatible XML report. Engine errors are absorbed into the per-test
//! result; report-emission failures abort the whole run.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::Lazy;

use crate::classify;
use crate::engine::{
    DiagnosticSink, Document, EngineError, Executable, FileDocument, Invocation, ParamValue, QName,
    Resolver, SilentSink, TransformEngine, TransformSource,
};
use crate::error::HarnessError;
use crate::results::{TestResults, TestResultsBuilder};

/// Namespace of the XSpec vocabulary.
pub const XSPEC_NS: &str = "http://www.jenitennison.com/xslt/xspec";

/// Name of the shared report stylesheet, written once per run.
pub const CSS_NAME: &str = "xspec-report.css";

const CSS_BYTES: &[u8] = include_bytes!("../assets/xspec-report.css");

const COMPILER_XSL: &str = "generate-xspec-tests.xsl";
const HTML_FORMATTER_XSL: &str = "format-xspec-report.xsl";
const JUNIT_FORMATTER_XSL: &str = "format-junit-report.xsl";

static MAIN_TEMPLATE: Lazy<QName> = Lazy::new(|| QName::new(XSPEC_NS, "main"));
static CSS_URI_PARAM: Lazy<QName> = Lazy::new(|| QName::local("report-css-uri"));
static JUNIT_NAME_PARAM: Lazy<QName> = Lazy::new(|| QName::local("name"));
static JUNIT_TIME_PARAM: Lazy<QName> = Lazy::new(|| QName::local("time"));

/// Locations of the transform definitions consumed at startup.
#[derive(Debug, Clone)]
pub struct Resources {
    pub compiler: TransformSource,
    pub html_formatter: TransformSource,
    pub junit_formatter: TransformSource,
}

impl Resources {
    pub fn new(
        compiler: TransformSource,
        html_formatter: TransformSource,
        junit_formatter: TransformSource,
    ) -> Self {
        Self {
            compiler,
            html_formatter,
            junit_formatter,
        }
    }

    /// Locate the three stylesheets by their conventional names in `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, HarnessError> {
        Ok(Self::new(
            locate(dir, COMPILER_XSL)?,
            locate(dir, HTML_FORMATTER_XSL)?,
            locate(dir, JUNIT_FORMATTER_XSL)?,
        ))
    }
}

fn locate(dir: &Path, name: &str) -> Result<TransformSource, HarnessError> {
    let path = dir.join(name);
    if path.is_file() {
        Ok(TransformSource::File(path))
    } else {
        Err(HarnessError::MissingResource { path })
    }
}

/// Runs XSpec tests through a transform engine and writes their reports.
pub struct XSpecRunner {
    engine: Box<dyn TransformEngine>,
    compiler: Box<dyn Executable>,
    html_formatter: Box<dyn Executable>,
    junit_formatter: Box<dyn Executable>,
}

impl XSpecRunner {
    /// Prepare the bundled transforms once. Fails before any test runs if
    /// a resource is missing or cannot be prepared.
    pub fn new(engine: Box<dyn TransformEngine>, resources: Resources) -> Result<Self, HarnessError> {
        let compiler = prepare(engine.as_ref(), "compiler", &resources.compiler)?;
        let html_formatter = prepare(engine.as_ref(), "HTML formatter", &resources.html_formatter)?;
        let junit_formatter =
            prepare(engine.as_ref(), "CI-report formatter", &resources.junit_formatter)?;
        Ok(Self {
            engine,
            compiler,
            html_formatter,
            junit_formatter,
        })
    }

    /// Run every test in order and fold the outcomes into one aggregate.
    ///
    /// Execution errors are data and never short-circuit the batch; only a
    /// report-emission failure aborts.
    pub fn run<I>(&self, tests: I, report_dir: &Path) -> Result<TestResults, HarnessError>
    where
        I: IntoIterator<Item = (String, PathBuf)>,
    {
        fs::create_dir_all(report_dir).map_err(|source| HarnessError::ReportIo {
            path: report_dir.to_path_buf(),
            source,
        })?;

        let mut builder = TestResultsBuilder::new("");
        for (name, file) in tests {
            builder.add_sub_results(self.run_single(&name, &file, report_dir)?);
        }
        Ok(builder.build())
    }

    /// Run one test through the whole pipeline.
    pub fn run_single(
        &self,
        name: &str,
        file: &Path,
        report_dir: &Path,
    ) -> Result<TestResults, HarnessError> {
        let log_path = report_dir.join(format!("OUT-{}.txt", name));
        let mut log = TeeSink::create(&log_path)?;
        log.line(&format!("Running {}", name));

        let started = Instant::now();
        let outcome = self.execute(file, &mut log);
        let elapsed = started.elapsed();

        let (results, result_doc) = match outcome {
            Ok(doc) => {
                match classify::from_report(name, doc.as_ref(), self.engine.as_ref(), elapsed) {
                    Ok(results) => (results, Some(doc)),
                    Err(err) => {
                        log.engine_error(&err);
                        (classify::from_error(name, elapsed), None)
                    }
                }
            }
            Err(err) => {
                log.engine_error(&err);
                (classify::from_error(name, elapsed), None)
            }
        };

        log.line(&results.to_string());
        log.finish().map_err(|source| HarnessError::ReportIo {
            path: log_path,
            source,
        })?;

        if results.errors() == 0 {
            if let Some(doc) = result_doc {
                self.emit_reports(name, doc.as_ref(), &results, report_dir)?;
            }
        }

        Ok(results)
    }

    /// Stages 1–3: compile the test, pick its resolver, execute it.
    fn execute(&self, file: &Path, sink: &mut TeeSink) -> Result<Arc<dyn Document>, EngineError> {
        let test_doc = FileDocument::new(file);
        let compiled = self
            .compiler
            .invoke(Invocation::new().source(&test_doc).sink(&mut *sink))?;

        let resolver = test_resolver(file);

        let runner = self.engine.compile(&TransformSource::Doc(compiled))?;
        runner.invoke(
            Invocation::new()
                .entry(&MAIN_TEMPLATE)
                .resolver(resolver)
                .sink(&mut *sink),
        )
    }

    /// Stage 5: raw result, shared CSS, HTML report, CI report.
    fn emit_reports(
        &self,
        name: &str,
        doc: &dyn Document,
        results: &TestResults,
        report_dir: &Path,
    ) -> Result<(), HarnessError> {
        let xspec_path = report_dir.join(format!("XSPEC-{}.xml", name));
        write_doc(&xspec_path, doc, name)?;

        write_css_once(report_dir)?;

        // Formatter chatter is intentionally discarded for the HTML stage.
        let mut silent = SilentSink;
        let html = self
            .html_formatter
            .invoke(
                Invocation::new()
                    .source(doc)
                    .param(CSS_URI_PARAM.clone(), ParamValue::Text(CSS_NAME.into()))
                    .sink(&mut silent),
            )
            .map_err(|source| HarnessError::ReportTransform {
                test: name.to_string(),
                source,
            })?;
        write_doc(&report_dir.join(format!("HTML-{}.html", name)), html.as_ref(), name)?;

        let junit = self
            .junit_formatter
            .invoke(
                Invocation::new()
                    .source(doc)
                    .param(JUNIT_NAME_PARAM.clone(), ParamValue::Text(name.into()))
                    .param(
                        JUNIT_TIME_PARAM.clone(),
                        ParamValue::Number(results.duration().as_secs_f64()),
                    ),
            )
            .map_err(|source| HarnessError::ReportTransform {
                test: name.to_string(),
                source,
            })?;
        write_doc(&report_dir.join(format!("TEST-{}.xml", name)), junit.as_ref(), name)?;

        Ok(())
    }
}

fn prepare(
    engine: &dyn TransformEngine,
    name: &'static str,
    source: &TransformSource,
) -> Result<Box<dyn Executable>, HarnessError> {
    engine
        .compile(source)
        .map_err(|source| HarnessError::Startup { name, source })
}

/// A sibling `catalog.xml` scopes resolution to that catalog for this test
/// only; everything else uses the engine default.
fn test_resolver(test_file: &Path) -> Resolver {
    match test_file.parent().map(|dir| dir.join("catalog.xml")) {
        Some(path) if path.is_file() => Resolver::Catalog(path),
        _ => Resolver::Default,
    }
}

fn write_doc(path: &Path, doc: &dyn Document, test: &str) -> Result<(), HarnessError> {
    let bytes = doc.bytes().map_err(|source| HarnessError::ReportTransform {
        test: test.to_string(),
        source,
    })?;
    fs::write(path, bytes).map_err(|source| HarnessError::ReportIo {
        path: path.to_path_buf(),
        source,
    })
}

/// Create the shared stylesheet if absent; never overwrite an existing one.
fn write_css_once(report_dir: &Path) -> Result<(), HarnessError> {
    let path = report_dir.join(CSS_NAME);
    match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(mut file) => file
            .write_all(CSS_BYTES)
            .map_err(|source| HarnessError::ReportIo { path, source }),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(source) => Err(HarnessError::ReportIo { path, source }),
    }
}

/// Duplicates every diagnostic line to the per-test log and the console.
struct TeeSink {
    log: BufWriter<File>,
}

impl TeeSink {
    fn create(path: &Path) -> Result<Self, HarnessError> {
        let file = File::create(path).map_err(|source| HarnessError::ReportIo {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            log: BufWriter::new(file),
        })
    }

    fn line(&mut self, text: &str) {
        println!("{}", text);
        let _ = writeln!(self.log, "{}", text);
    }

    fn engine_error(&mut self, err: &EngineError) {
        self.line(&err.message);
        if let Some(details) = &err.details {
            self.line(details);
        }
    }

    fn finish(mut self) -> io::Result<()> {
        self.log.flush()
    }
}

impl DiagnosticSink for TeeSink {
    fn message(&mut self, text: &str) {
        self.line(text);
    }
}
