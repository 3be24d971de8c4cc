//! Public interface for compiling and running Rill code.

use crate::{
    builtins::Builtin,
    diagnostics::{CollectDiagnostics, CountingSink, Diagnostic, DiagnosticSink, RuntimeError},
    environment::Environment,
    expressions::Stmt,
    intern::Interner,
    interp::Interpreter,
    io::PrintWriter,
    parse::parse,
    resolve::{Resolutions, resolve},
    scan::scan,
    tracer::{NoopTracer, Tracer},
    value::Value,
};

/// A compiled program: statements, resolved depths, and the interner.
///
/// Compiling runs the whole front end (scan, parse, resolve); a `Runner`
/// only exists when no diagnostics were reported, so evaluation can assume a
/// well-formed program. Runs are repeatable: each [`run`](Self::run) starts
/// from fresh globals.
///
/// # Example
/// ```
/// use rill::{CollectStringPrint, Runner};
///
/// let runner = Runner::compile("print 1 + 2;").unwrap();
/// let mut print = CollectStringPrint::new();
/// runner.run(&mut print).unwrap();
/// assert_eq!(print.output(), "3\n");
/// ```
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Runner {
    stmts: Vec<Stmt>,
    resolutions: Resolutions,
    interner: Interner,
}

impl Runner {
    /// Compiles `source`, returning the diagnostics if any were reported.
    pub fn compile(source: &str) -> Result<Self, Vec<Diagnostic>> {
        let mut sink = CollectDiagnostics::new();
        match Self::compile_into(source, &mut sink) {
            Some(runner) => Ok(runner),
            None => Err(sink.into_diagnostics()),
        }
    }

    /// Compiles `source`, reporting diagnostics to a caller-provided sink.
    ///
    /// Returns `None` when anything was reported; a program with compile
    /// errors is never evaluated. Parse errors skip resolution entirely.
    pub fn compile_into(source: &str, sink: &mut impl DiagnosticSink) -> Option<Self> {
        let mut counting = CountingSink::new(sink);
        let mut interner = Interner::new();
        for builtin in Builtin::ALL {
            interner.intern(builtin.name());
        }
        let tokens = scan(source, &mut interner, &mut counting);
        let outcome = parse(tokens, &interner, 0, &mut counting);
        if counting.count() > 0 {
            return None;
        }
        let mut resolutions = Resolutions::for_use_count(outcome.var_use_count);
        resolve(&outcome.stmts, &interner, &mut resolutions, &mut counting);
        if counting.count() > 0 {
            return None;
        }
        Some(Self {
            stmts: outcome.stmts,
            resolutions,
            interner,
        })
    }

    /// Executes the program against fresh globals, printing through `print`.
    pub fn run(&self, print: &mut impl PrintWriter) -> Result<(), RuntimeError> {
        self.run_with_tracer(print, &mut NoopTracer)
    }

    /// Like [`run`](Self::run), with a tracer observing call activity.
    pub fn run_with_tracer(
        &self,
        print: &mut impl PrintWriter,
        tracer: &mut impl Tracer,
    ) -> Result<(), RuntimeError> {
        let globals = Environment::global();
        install_builtins(&self.interner, &globals);
        let mut interpreter = Interpreter::new(&self.interner, &self.resolutions, globals, print, tracer);
        interpreter.interpret(&self.stmts, false)
    }

    /// Serializes the compiled program to a binary format.
    ///
    /// The data can be stored and later restored with [`load`](Self::load),
    /// so hosts can cache compiled programs and skip re-parsing.
    pub fn dump(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    /// Deserializes a compiled program produced by [`dump`](Self::dump).
    pub fn load(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

/// Binds every builtin in a fresh globals frame.
///
/// Builtin names are interned at compile time, so the lookups here always
/// succeed for programs built by [`Runner::compile_into`].
pub(crate) fn install_builtins(interner: &Interner, globals: &Environment) {
    for builtin in Builtin::ALL {
        if let Some(id) = interner.lookup(builtin.name()) {
            globals.define(id, Value::Builtin(builtin));
        }
    }
}
