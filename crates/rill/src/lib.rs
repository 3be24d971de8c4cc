#![doc = include_str!("../../../README.md")]

mod builtins;
mod diagnostics;
mod environment;
mod expressions;
mod intern;
mod interp;
mod io;
mod parse;
mod repl;
mod repl_error;
mod resolve;
mod run;
mod scan;
mod tracer;
mod value;

pub use crate::{
    builtins::Builtin,
    diagnostics::{CollectDiagnostics, Diagnostic, DiagnosticSink, RuntimeError},
    io::{CollectStringPrint, NoPrint, PrintWriter, StdPrint},
    repl::ReplSession,
    repl_error::ReplError,
    run::Runner,
    tracer::{NoopTracer, RecordingTracer, TraceEvent, Tracer},
};
