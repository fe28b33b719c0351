//! Reporter fan-out (`spec.md` §4.6, `SPEC_FULL.md` §E).
//!
//! A [`Reporter`] is bracketed by `start()`/`finish()`; the planner never
//! calls either — that is the caller's responsibility (`spec.md` §4.5
//! "Observable side effects").

use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::error::{PlugError, Result};

/// The opaque result value a [`Sink`](crate::model::Sink) delivers via
/// [`Reporter::add_report`].
///
/// Concrete check result types (out of scope for this crate, per `spec.md`
/// §1) implement this trait; `category`/`package`/`version` are used by
/// grouping reporters like [`FancyReporter`].
pub trait ReportResult: Send {
    /// A single human-readable line describing the result.
    fn short_line(&self) -> String;
    /// A structured/XML rendering of the result.
    fn xml_block(&self) -> String;
    /// The category this result belongs to, if any.
    fn category(&self) -> Option<&str> {
        None
    }
    /// The package this result belongs to, if any.
    fn package(&self) -> Option<&str> {
        None
    }
    /// The version this result belongs to, if any.
    fn version(&self) -> Option<&str> {
        None
    }
}

/// A trivial [`ReportResult`] carrying just a line of text, for tests and
/// integrators who don't need a richer result type.
pub struct TextResult {
    line: String,
}

impl TextResult {
    /// Builds a result carrying `line` verbatim.
    pub fn new(line: impl Into<String>) -> Self {
        TextResult { line: line.into() }
    }
}

impl ReportResult for TextResult {
    fn short_line(&self) -> String {
        self.line.clone()
    }
    fn xml_block(&self) -> String {
        format!("<result>{}</result>", self.line)
    }
}

/// An output handler for check results, bracketed by `start()`/`finish()`.
pub trait Reporter: Send + Sync {
    /// Called once before any sink writes.
    fn start(&self);
    /// Called once per result, in the order sinks produce them.
    ///
    /// Takes `result` by reference so a [`MultiplexReporter`] can pass the
    /// same object to every child unchanged, instead of reconstructing a
    /// lossy copy per child.
    fn add_report(&self, result: &dyn ReportResult);
    /// Called once after the last drain.
    fn finish(&self);
}

/// Writes one line per result, in arrival order.
pub struct PlainReporter<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> PlainReporter<W> {
    /// Wraps `out` for line-at-a-time reporting.
    pub fn new(out: W) -> Self {
        PlainReporter { out: Mutex::new(out) }
    }
}

impl<W: Write + Send> Reporter for PlainReporter<W> {
    fn start(&self) {}

    fn add_report(&self, result: &dyn ReportResult) {
        let mut out = self.out.lock().unwrap();
        let _ = writeln!(out, "{}", result.short_line());
    }

    fn finish(&self) {}
}

/// A result's fields copied out at `add_report` time, since `FancyReporter`
/// must hold onto them past the call until `finish()` groups and prints.
struct BufferedResult {
    category: String,
    package: String,
    line: String,
}

/// Buffers results and, on `finish()`, groups and prints them by
/// `(category, package)`, printing a header the first time a group is seen.
pub struct FancyReporter<W: Write + Send> {
    out: Mutex<W>,
    buffered: Mutex<Vec<BufferedResult>>,
}

impl<W: Write + Send> FancyReporter<W> {
    /// Wraps `out` for category/package-grouped reporting.
    pub fn new(out: W) -> Self {
        FancyReporter {
            out: Mutex::new(out),
            buffered: Mutex::new(Vec::new()),
        }
    }
}

impl<W: Write + Send> Reporter for FancyReporter<W> {
    fn start(&self) {}

    fn add_report(&self, result: &dyn ReportResult) {
        self.buffered.lock().unwrap().push(BufferedResult {
            category: result.category().unwrap_or("unknown").to_string(),
            package: result.package().unwrap_or("unknown").to_string(),
            line: result.short_line(),
        });
    }

    fn finish(&self) {
        let results = std::mem::take(&mut *self.buffered.lock().unwrap());
        let mut out = self.out.lock().unwrap();
        let mut current_key: Option<(&str, &str)> = None;
        for result in &results {
            let key = (result.category.as_str(), result.package.as_str());
            if current_key != Some(key) {
                let _ = writeln!(out, "{}/{}", key.0, key.1);
                current_key = Some(key);
            }
            let _ = writeln!(out, "  {}", result.line);
        }
    }
}

/// Emits an opening root element in `start()`, one block per result, and a
/// closing root element in `finish()`.
pub struct XmlReporter<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> XmlReporter<W> {
    /// Wraps `out` for XML-framed reporting.
    pub fn new(out: W) -> Self {
        XmlReporter { out: Mutex::new(out) }
    }
}

impl<W: Write + Send> Reporter for XmlReporter<W> {
    fn start(&self) {
        let mut out = self.out.lock().unwrap();
        let _ = writeln!(out, "<checks>");
    }

    fn add_report(&self, result: &dyn ReportResult) {
        let mut out = self.out.lock().unwrap();
        let _ = writeln!(out, "{}", result.xml_block());
    }

    fn finish(&self) {
        let mut out = self.out.lock().unwrap();
        let _ = writeln!(out, "</checks>");
    }
}

/// Forwards every call to each child reporter, in order.
pub struct MultiplexReporter {
    reporters: Vec<Box<dyn Reporter>>,
}

impl MultiplexReporter {
    /// Builds a multiplexer over at least two reporters.
    pub fn new(reporters: Vec<Box<dyn Reporter>>) -> Result<Self> {
        if reporters.len() < 2 {
            return Err(PlugError::NotEnoughReporters(reporters.len()));
        }
        Ok(MultiplexReporter { reporters })
    }
}

impl Reporter for MultiplexReporter {
    fn start(&self) {
        for r in &self.reporters {
            r.start();
        }
    }

    fn add_report(&self, result: &dyn ReportResult) {
        for r in &self.reporters {
            r.add_report(result);
        }
    }

    fn finish(&self) {
        for r in &self.reporters {
            r.finish();
        }
    }
}

/// A destination reporters can share without each owning the underlying
/// stream — a multiplex fans a single configured destination out to every
/// child, mirroring the original's `factory(out)` pattern where `out` is
/// one shared formatter instance.
pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

struct SharedWriterHandle(SharedWriter);

impl Write for SharedWriterHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        self.0.lock().unwrap().flush()
    }
}

/// The configurable-factory pattern as a sum type (`spec.md` §9 "global
/// reporter factories → configuration objects"): pick a shape, call
/// [`ReporterConfig::build`] against a destination, get back a live
/// [`Reporter`].
pub enum ReporterConfig {
    /// One line per result.
    Plain,
    /// Results grouped by category/package.
    Fancy,
    /// XML-framed results.
    Xml,
    /// Fan out to every child configuration.
    Multiplex(Vec<ReporterConfig>),
}

impl ReporterConfig {
    /// Builds the configured reporter, writing to `out`.
    ///
    /// Fails with [`PlugError::NotEnoughReporters`] if a `Multiplex` variant
    /// names fewer than two children — the one place a misconfiguration is
    /// a constructible error rather than a planner assertion, since it is
    /// caller-supplied configuration, not a planner invariant.
    pub fn build(&self, out: SharedWriter) -> Result<Box<dyn Reporter>> {
        match self {
            ReporterConfig::Plain => Ok(Box::new(PlainReporter::new(SharedWriterHandle(out)))),
            ReporterConfig::Fancy => Ok(Box::new(FancyReporter::new(SharedWriterHandle(out)))),
            ReporterConfig::Xml => Ok(Box::new(XmlReporter::new(SharedWriterHandle(out)))),
            ReporterConfig::Multiplex(children) => {
                let built = children
                    .iter()
                    .map(|child| child.build(out.clone()))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Box::new(MultiplexReporter::new(built)?))
            }
        }
    }
}
