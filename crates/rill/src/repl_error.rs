//! Error type for REPL execution.

use std::fmt;

use crate::diagnostics::{Diagnostic, RuntimeError};

/// Error from executing one REPL input, split by pipeline stage.
///
/// Keeping compile-time and runtime failures distinct lets drivers handle
/// feedback and recovery accurately without string matching. Either way the
/// session stays usable.
#[derive(Debug, Clone)]
pub enum ReplError {
    /// Scanning, parsing, or resolution reported diagnostics; nothing was
    /// evaluated and no session state changed.
    Compile(Vec<Diagnostic>),
    /// Evaluation failed. Side effects before the failure (defined globals,
    /// printed output) persist.
    Runtime(RuntimeError),
}

impl fmt::Display for ReplError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile(diagnostics) => {
                let mut first = true;
                for diagnostic in diagnostics {
                    if !first {
                        writeln!(f)?;
                    }
                    write!(f, "{diagnostic}")?;
                    first = false;
                }
                Ok(())
            }
            Self::Runtime(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for ReplError {}

impl From<RuntimeError> for ReplError {
    fn from(error: RuntimeError) -> Self {
        Self::Runtime(error)
    }
}
