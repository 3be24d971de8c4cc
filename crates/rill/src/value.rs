//! The runtime value domain: nil, booleans, numbers, strings, callables.

use std::{borrow::Cow, rc::Rc};

use crate::{
    builtins::Builtin,
    environment::Environment,
    expressions::FunctionDecl,
    intern::{Interner, StringId},
};

/// A runtime value.
///
/// Values are cheap to clone: everything heap-backed is behind an `Rc`.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Num(f64),
    Str(StrValue),
    /// A function defined in source, carrying its captured frame.
    Fn(Rc<Function>),
    /// A host-provided native function.
    Builtin(Builtin),
}

/// A string value.
///
/// Literals stay as interner ids so evaluating one never allocates; strings
/// built at runtime (concatenation) live on their own allocation. The two
/// forms compare and print identically.
#[derive(Debug, Clone)]
pub enum StrValue {
    Interned(StringId),
    Runtime(Rc<str>),
}

impl StrValue {
    pub fn as_str<'a>(&'a self, interner: &'a Interner) -> &'a str {
        match self {
            Self::Interned(id) => interner.get(*id),
            Self::Runtime(s) => s,
        }
    }
}

/// A function value: the parsed declaration plus the frame it closed over.
///
/// The captured frame is the one active at the *definition* site; calls chain
/// a fresh frame onto it, which is what gives closures lexical rather than
/// dynamic scope.
#[derive(Debug)]
pub struct Function {
    pub decl: Rc<FunctionDecl>,
    pub closure: Environment,
}

impl Function {
    pub fn arity(&self) -> usize {
        self.decl.params.len()
    }

    /// The declared name, or `None` for lambdas.
    pub fn name_id(&self) -> Option<StringId> {
        self.decl.name.map(|n| n.id)
    }
}

impl Value {
    /// `nil` and `false` are falsy; every other value (including `0`, `""`,
    /// and `nan`) is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Self::Nil | Self::Bool(false))
    }

    /// Structural equality: `nil` only equals `nil`, numbers compare by IEEE
    /// `==` (so `nan != nan`), strings by content, functions by identity.
    /// Values of different kinds are never equal.
    pub fn equals(&self, other: &Self, interner: &Interner) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Num(a), Self::Num(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a.as_str(interner) == b.as_str(interner),
            (Self::Fn(a), Self::Fn(b)) => Rc::ptr_eq(a, b),
            (Self::Builtin(a), Self::Builtin(b)) => a == b,
            _ => false,
        }
    }

    /// Renders the value the way `print` shows it.
    pub fn render<'a>(&'a self, interner: &'a Interner) -> Cow<'a, str> {
        match self {
            Self::Nil => Cow::Borrowed("nil"),
            Self::Bool(true) => Cow::Borrowed("true"),
            Self::Bool(false) => Cow::Borrowed("false"),
            Self::Num(n) => Cow::Owned(num_repr(*n)),
            Self::Str(s) => Cow::Borrowed(s.as_str(interner)),
            Self::Fn(f) => match f.name_id() {
                Some(id) => Cow::Owned(format!("<fn {}>", interner.get(id))),
                None => Cow::Borrowed("<fn >"),
            },
            Self::Builtin(b) => Cow::Owned(format!("<native fn {}>", b.name())),
        }
    }
}

/// Returns the canonical text of a number.
///
/// Uses the `ryu` crate for the shortest decimal representation that
/// round-trips through `f64` parsing. Integral doubles drop the trailing
/// `.0` (`3`, not `3.0`); specials render as `nan`, `inf`, `-inf`.
pub(crate) fn num_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value.is_sign_negative() {
            "-inf".to_string()
        } else {
            "inf".to_string()
        };
    }
    let mut buffer = ryu::Buffer::new();
    let repr = buffer.format_finite(value);
    repr.strip_suffix(".0").unwrap_or(repr).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_render_without_a_fraction() {
        assert_eq!(num_repr(3.0), "3");
        assert_eq!(num_repr(-0.0), "-0");
        assert_eq!(num_repr(55.0), "55");
    }

    #[test]
    fn fractional_numbers_use_shortest_round_trip_form() {
        assert_eq!(num_repr(2.5), "2.5");
        assert_eq!(num_repr(0.1), "0.1");
    }

    #[test]
    fn special_numbers_render_lowercase() {
        assert_eq!(num_repr(f64::NAN), "nan");
        assert_eq!(num_repr(f64::INFINITY), "inf");
        assert_eq!(num_repr(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn nan_is_not_equal_to_itself() {
        let interner = Interner::new();
        let nan = Value::Num(f64::NAN);
        assert!(!nan.equals(&nan, &interner));
    }

    #[test]
    fn interned_and_runtime_strings_compare_by_content() {
        let mut interner = Interner::new();
        let id = interner.intern("hi");
        let a = Value::Str(StrValue::Interned(id));
        let b = Value::Str(StrValue::Runtime(Rc::from("hi")));
        assert!(a.equals(&b, &interner));
    }

    #[test]
    fn values_of_different_kinds_are_unequal() {
        let interner = Interner::new();
        assert!(!Value::Num(0.0).equals(&Value::Bool(false), &interner));
        assert!(!Value::Nil.equals(&Value::Bool(false), &interner));
    }
}
