//! Native functions installed in every fresh globals frame.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::value::Value;

/// A host-provided native function.
///
/// A `Copy` enum rather than trait objects: dispatch is a match, and values
/// holding a builtin stay trivially cloneable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `clock()` — seconds since the Unix epoch, as a number.
    Clock,
}

impl Builtin {
    /// Every builtin, in the order they are installed into globals.
    pub const ALL: [Self; 1] = [Self::Clock];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Clock => "clock",
        }
    }

    #[must_use]
    pub fn arity(self) -> usize {
        match self {
            Self::Clock => 0,
        }
    }

    /// Invokes the builtin. Arity has already been checked by the caller.
    pub(crate) fn call(self, _args: &[Value]) -> Value {
        match self {
            Self::Clock => {
                let seconds = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_or(0.0, |elapsed| elapsed.as_secs_f64());
                Value::Num(seconds)
            }
        }
    }
}
