//! Shared fixtures: a scripted in-memory transform engine and helpers.
//!
//! Test definitions drive the engine's behavior through their content:
//! `passed=N`, `failed=N`, `pending=N` set the outcome counts, and the
//! directives `compile-error`, `run-error`, `count-error`, and
//! `html-error` trigger the corresponding failure mode.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use xspec_runner::engine::{
    Document, EngineError, Executable, Invocation, OutcomeClass, Resolver, TransformEngine,
    TransformSource,
};
use xspec_runner::runner::{Resources, XSpecRunner};

/// In-memory document carrying its serialized form.
#[derive(Debug, Clone)]
pub struct MemDocument(pub String);

impl Document for MemDocument {
    fn bytes(&self) -> Result<Vec<u8>, EngineError> {
        Ok(self.0.clone().into_bytes())
    }
}

/// What the mock engine observed for one invocation.
#[derive(Debug, Clone)]
pub struct InvocationRecord {
    pub transform: &'static str,
    pub entry: Option<String>,
    pub resolver: Resolver,
    pub params: Vec<(String, String)>,
}

pub type Trace = Arc<Mutex<Vec<InvocationRecord>>>;

pub struct MockEngine {
    trace: Trace,
}

impl MockEngine {
    pub fn new() -> (Self, Trace) {
        let trace = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                trace: Arc::clone(&trace),
            },
            trace,
        )
    }
}

#[derive(Debug)]
enum Kind {
    Compiler,
    Html,
    Junit,
    Test { content: String },
}

#[derive(Debug)]
struct MockExecutable {
    kind: Kind,
    trace: Trace,
}

fn record(trace: &Trace, transform: &'static str, invocation: &Invocation<'_>) {
    trace.lock().unwrap().push(InvocationRecord {
        transform,
        entry: invocation.entry.map(|entry| entry.to_string()),
        resolver: invocation.resolver.clone(),
        params: invocation
            .params
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
    });
}

impl Executable for MockExecutable {
    fn invoke(&self, mut invocation: Invocation<'_>) -> Result<Arc<dyn Document>, EngineError> {
        match &self.kind {
            Kind::Compiler => {
                let source = invocation
                    .source
                    .ok_or_else(|| EngineError::new("compiler needs a source document"))?;
                let content = String::from_utf8_lossy(&source.bytes()?).to_string();
                record(&self.trace, "compiler", &invocation);
                if let Some(sink) = invocation.sink.as_mut() {
                    sink.message("engine: compiling specification");
                }
                if content.contains("compile-error") {
                    return Err(EngineError::with_details(
                        "compilation failed",
                        "engine trace: unresolvable instruction",
                    ));
                }
                Ok(Arc::new(MemDocument(format!("compiled\n{}", content))))
            }
            Kind::Test { content } => {
                record(&self.trace, "test", &invocation);
                if content.contains("run-error") {
                    return Err(EngineError::with_details(
                        "execution failed",
                        "engine trace: dynamic error",
                    ));
                }
                Ok(Arc::new(MemDocument(format!(
                    "report\n{}\nresolver={:?}",
                    content, invocation.resolver
                ))))
            }
            Kind::Html => {
                let source = invocation
                    .source
                    .ok_or_else(|| EngineError::new("formatter needs a source document"))?;
                let content = String::from_utf8_lossy(&source.bytes()?).to_string();
                record(&self.trace, "html", &invocation);
                if content.contains("html-error") {
                    return Err(EngineError::new("HTML formatting failed"));
                }
                Ok(Arc::new(MemDocument(format!(
                    "<html><!-- {} bytes --></html>",
                    content.len()
                ))))
            }
            Kind::Junit => {
                record(&self.trace, "junit", &invocation);
                let params: Vec<String> = invocation
                    .params
                    .iter()
                    .map(|(name, value)| format!("{}={}", name, value))
                    .collect();
                Ok(Arc::new(MemDocument(format!(
                    "<testsuite {}/>",
                    params.join(" ")
                ))))
            }
        }
    }
}

impl TransformEngine for MockEngine {
    fn compile(&self, source: &TransformSource) -> Result<Box<dyn Executable>, EngineError> {
        let kind = match source {
            TransformSource::File(path) => match path.file_name().and_then(|n| n.to_str()) {
                Some("generate-xspec-tests.xsl") => Kind::Compiler,
                Some("format-xspec-report.xsl") => Kind::Html,
                Some("format-junit-report.xsl") => Kind::Junit,
                other => {
                    return Err(EngineError::new(format!(
                        "unexpected stylesheet: {:?}",
                        other
                    )))
                }
            },
            TransformSource::Doc(doc) => Kind::Test {
                content: String::from_utf8_lossy(&doc.bytes()?).to_string(),
            },
        };
        Ok(Box::new(MockExecutable {
            kind,
            trace: Arc::clone(&self.trace),
        }))
    }

    fn count(&self, doc: &dyn Document, class: OutcomeClass) -> Result<usize, EngineError> {
        let content = String::from_utf8_lossy(&doc.bytes()?).to_string();
        if content.contains("count-error") {
            return Err(EngineError::new("outcome query failed"));
        }
        let key = match class {
            OutcomeClass::Pending => "pending",
            OutcomeClass::Successful => "passed",
            OutcomeClass::Failed => "failed",
        };
        Ok(parse_count(&content, key))
    }
}

fn parse_count(content: &str, key: &str) -> usize {
    let marker = format!("{}=", key);
    content
        .split_whitespace()
        .find_map(|token| token.strip_prefix(marker.as_str()))
        .and_then(|rest| rest.parse().ok())
        .unwrap_or(0)
}

/// Write the three stub stylesheets and return `Resources` over them.
pub fn stub_resources(root: &Path) -> Resources {
    let dir = root.join("xslt");
    fs::create_dir_all(&dir).unwrap();
    for name in [
        "generate-xspec-tests.xsl",
        "format-xspec-report.xsl",
        "format-junit-report.xsl",
    ] {
        fs::write(dir.join(name), "<xsl:stylesheet/>").unwrap();
    }
    Resources::from_dir(&dir).unwrap()
}

pub fn new_runner(root: &Path) -> (XSpecRunner, Trace) {
    let (engine, trace) = MockEngine::new();
    let runner = XSpecRunner::new(Box::new(engine), stub_resources(root)).unwrap();
    (runner, trace)
}

pub fn write_spec(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(format!("{}.xspec", name));
    fs::write(&path, content).unwrap();
    path
}
