//! Persistent REPL session support.
//!
//! `ReplSession` keeps interpreter state across `execute()` calls so
//! interactive snippets share variables, functions, and closures. Bare
//! expression statements echo their value, script-style statements do not.

use crate::{
    builtins::Builtin,
    diagnostics::CollectDiagnostics,
    environment::Environment,
    intern::Interner,
    interp::Interpreter,
    io::PrintWriter,
    parse::parse,
    repl_error::ReplError,
    resolve::{Resolutions, resolve},
    scan::scan,
    tracer::NoopTracer,
    value::Value,
};

/// An interactive session: each [`execute`](Self::execute) compiles one
/// input against the session's accumulated state and evaluates it in the
/// persistent globals frame.
///
/// Compile failures leave the session untouched. Runtime failures keep the
/// state committed before evaluation started — side effects that already
/// happened (a global defined before the error) stay visible, matching what
/// a user watching the session saw.
///
/// # Example
/// ```
/// use rill::{CollectStringPrint, ReplSession};
///
/// let mut session = ReplSession::new();
/// let mut print = CollectStringPrint::new();
/// session.execute("var x = 20;", &mut print).unwrap();
/// session.execute("x + 22;", &mut print).unwrap();
/// assert_eq!(print.output(), "42\n");
/// ```
#[derive(Debug)]
pub struct ReplSession {
    interner: Interner,
    resolutions: Resolutions,
    /// Seed for the next line's variable-use counter; keeps ids dense and
    /// unique across lines so earlier lines' closures resolve correctly.
    var_use_count: u32,
    globals: Environment,
}

impl ReplSession {
    #[must_use]
    pub fn new() -> Self {
        let mut interner = Interner::new();
        let globals = Environment::global();
        for builtin in Builtin::ALL {
            let id = interner.intern(builtin.name());
            globals.define(id, Value::Builtin(builtin));
        }
        Self {
            interner,
            resolutions: Resolutions::default(),
            var_use_count: 0,
            globals,
        }
    }

    /// Compiles and evaluates one input line (or block of lines).
    pub fn execute(&mut self, source: &str, print: &mut impl PrintWriter) -> Result<(), ReplError> {
        let mut sink = CollectDiagnostics::new();
        // work on clones so a failed compile leaves the session untouched
        let mut interner = self.interner.clone();
        let tokens = scan(source, &mut interner, &mut sink);
        let outcome = parse(tokens, &interner, self.var_use_count, &mut sink);
        if sink.had_error() {
            return Err(ReplError::Compile(sink.into_diagnostics()));
        }
        let mut resolutions = self.resolutions.clone();
        resolutions.grow(outcome.var_use_count);
        resolve(&outcome.stmts, &interner, &mut resolutions, &mut sink);
        if sink.had_error() {
            return Err(ReplError::Compile(sink.into_diagnostics()));
        }

        // commit before evaluating: the globals frame mutates during the run
        // no matter how it ends, and functions defined on this line keep
        // consulting these tables from later lines
        self.interner = interner;
        self.resolutions = resolutions;
        self.var_use_count = outcome.var_use_count;

        let mut tracer = NoopTracer;
        let mut interpreter = Interpreter::new(
            &self.interner,
            &self.resolutions,
            self.globals.clone(),
            print,
            &mut tracer,
        );
        interpreter
            .interpret(&outcome.stmts, true)
            .map_err(ReplError::Runtime)
    }
}

impl Default for ReplSession {
    fn default() -> Self {
        Self::new()
    }
}
