//! Compile-time diagnostics and runtime errors.
//!
//! The scanner, parser, and resolver all report through a [`DiagnosticSink`]
//! and keep going, so a single compile surfaces as many problems as possible.
//! Runtime failures are a separate type: they carry the line of the operative
//! token and unwind evaluation instead of accumulating.

use std::fmt;

/// A single user-facing compile-time diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based source line the diagnostic refers to.
    pub line: u32,
    /// Human-readable description, e.g. `Error at ')': Expect expression.`
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] {}", self.line, self.message)
    }
}

/// Receiver for compile-time diagnostics.
///
/// Implementations record or forward each report; the pipeline never inspects
/// past reports, it only emits new ones.
pub trait DiagnosticSink {
    /// Records a diagnostic at the given 1-based line.
    fn report(&mut self, line: u32, message: &str);
}

/// A [`DiagnosticSink`] that collects diagnostics into a vector.
#[derive(Debug, Default)]
pub struct CollectDiagnostics {
    diagnostics: Vec<Diagnostic>,
}

impl CollectDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True if at least one diagnostic has been reported.
    #[must_use]
    pub fn had_error(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consumes the sink and returns the collected diagnostics.
    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for CollectDiagnostics {
    fn report(&mut self, line: u32, message: &str) {
        self.diagnostics.push(Diagnostic {
            line,
            message: message.to_owned(),
        });
    }
}

/// Forwards reports to an inner sink while counting them.
///
/// Lets a compile entry point detect whether its own pipeline stages reported
/// anything, without assuming the caller's sink started out empty.
pub(crate) struct CountingSink<'a, S: DiagnosticSink> {
    inner: &'a mut S,
    count: usize,
}

impl<'a, S: DiagnosticSink> CountingSink<'a, S> {
    pub fn new(inner: &'a mut S) -> Self {
        Self { inner, count: 0 }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl<S: DiagnosticSink> DiagnosticSink for CountingSink<'_, S> {
    fn report(&mut self, line: u32, message: &str) {
        self.count += 1;
        self.inner.report(line, message);
    }
}

/// A runtime failure: type mismatch, bad arity, undefined variable, and so on.
///
/// Unlike compile-time diagnostics these unwind evaluation immediately. The
/// `Display` form matches what the CLI prints before exiting with status 70.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    /// 1-based line of the operative token.
    pub line: u32,
    pub message: String,
}

impl RuntimeError {
    pub(crate) fn new(line: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n[line {}]", self.message, self.line)
    }
}

impl std::error::Error for RuntimeError {}
