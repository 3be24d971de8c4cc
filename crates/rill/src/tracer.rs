//! Execution tracing hooks.
//!
//! The interpreter is generic over a [`Tracer`] so hosts can observe call
//! activity without the interpreter knowing anything about logging. The
//! default [`NoopTracer`] compiles to nothing.

/// Observer for interpreter call activity.
pub trait Tracer {
    /// A function is about to run. `name` is empty for lambdas; `depth` is
    /// the call depth including this call.
    fn on_call(&mut self, name: &str, depth: usize) {
        let _ = (name, depth);
    }

    /// A function finished (normal completion or `return`).
    fn on_return(&mut self, depth: usize) {
        let _ = depth;
    }
}

/// A [`Tracer`] that does nothing.
#[derive(Debug, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {}

/// One recorded trace event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    Call { name: String, depth: usize },
    Return { depth: usize },
}

/// A [`Tracer`] that records events for later inspection.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Vec<TraceEvent>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    #[must_use]
    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }
}

impl Tracer for RecordingTracer {
    fn on_call(&mut self, name: &str, depth: usize) {
        self.events.push(TraceEvent::Call {
            name: name.to_owned(),
            depth,
        });
    }

    fn on_return(&mut self, depth: usize) {
        self.events.push(TraceEvent::Return { depth });
    }
}
