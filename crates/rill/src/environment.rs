//! Scope frames: name-to-value maps chained from innermost to global.

use std::{cell::RefCell, rc::Rc};

use ahash::AHashMap;

use crate::{intern::StringId, value::Value};

/// One frame in the chain: bindings plus the enclosing link.
#[derive(Debug, Default)]
struct Frame {
    values: AHashMap<StringId, Value>,
    enclosing: Option<Environment>,
}

/// A handle to one frame of the environment chain.
///
/// Handles are reference-counted, so a closure keeps its defining frame alive
/// after the block that created it exits. A frame that binds a closure whose
/// captured frame is an ancestor forms an `Rc` cycle and leaks; tolerated
/// deliberately, interpreted programs are short-lived.
#[derive(Debug, Clone)]
pub struct Environment(Rc<RefCell<Frame>>);

impl Environment {
    /// Creates a root frame with no enclosing link.
    #[must_use]
    pub fn global() -> Self {
        Self(Rc::new(RefCell::new(Frame::default())))
    }

    /// Creates a fresh frame enclosed by `self`.
    #[must_use]
    pub fn child(&self) -> Self {
        Self(Rc::new(RefCell::new(Frame {
            values: AHashMap::new(),
            enclosing: Some(self.clone()),
        })))
    }

    /// Binds `name` in this frame, overwriting any existing binding here.
    /// Enclosing frames are untouched: this is how shadowing works.
    pub fn define(&self, name: StringId, value: Value) {
        self.0.borrow_mut().values.insert(name, value);
    }

    /// Reads `name` from the nearest frame binding it, or `None`.
    #[must_use]
    pub fn get(&self, name: StringId) -> Option<Value> {
        let mut env = self.0.clone();
        loop {
            let frame = env.borrow();
            if let Some(value) = frame.values.get(&name) {
                return Some(value.clone());
            }
            let next = frame.enclosing.as_ref().map(|e| e.0.clone());
            drop(frame);
            env = next?;
        }
    }

    /// Mutates the nearest existing binding of `name`. Returns `false` when
    /// no frame in the chain binds it: assignment never creates bindings.
    #[must_use]
    pub fn assign(&self, name: StringId, value: Value) -> bool {
        let mut env = self.0.clone();
        loop {
            let mut frame = env.borrow_mut();
            if frame.values.contains_key(&name) {
                frame.values.insert(name, value);
                return true;
            }
            let next = frame.enclosing.as_ref().map(|e| e.0.clone());
            drop(frame);
            match next {
                Some(e) => env = e,
                None => return false,
            }
        }
    }

    /// Reads `name` from exactly the frame `depth` links up the chain.
    #[must_use]
    pub fn get_at(&self, depth: usize, name: StringId) -> Option<Value> {
        let env = self.ancestor(depth);
        let value = env.0.borrow().values.get(&name).cloned();
        value
    }

    /// Writes `name` in exactly the frame `depth` links up the chain.
    /// Returns `false` if that frame does not bind the name.
    #[must_use]
    pub fn assign_at(&self, depth: usize, name: StringId, value: Value) -> bool {
        let env = self.ancestor(depth);
        let mut frame = env.0.borrow_mut();
        if frame.values.contains_key(&name) {
            frame.values.insert(name, value);
            true
        } else {
            false
        }
    }

    fn ancestor(&self, depth: usize) -> Self {
        let mut env = self.clone();
        for _ in 0..depth {
            let next = env.0.borrow().enclosing.clone();
            env = next.expect("environment chain shorter than resolved depth");
        }
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Interner;

    fn name(interner: &mut Interner, text: &str) -> StringId {
        interner.intern(text)
    }

    #[test]
    fn define_and_get_in_one_frame() {
        let mut interner = Interner::new();
        let a = name(&mut interner, "a");
        let env = Environment::global();
        env.define(a, Value::Num(1.0));
        assert!(matches!(env.get(a), Some(Value::Num(n)) if n == 1.0));
    }

    #[test]
    fn child_frames_shadow_without_clobbering() {
        let mut interner = Interner::new();
        let a = name(&mut interner, "a");
        let global = Environment::global();
        global.define(a, Value::Num(1.0));
        let inner = global.child();
        inner.define(a, Value::Num(2.0));
        assert!(matches!(inner.get(a), Some(Value::Num(n)) if n == 2.0));
        assert!(matches!(global.get(a), Some(Value::Num(n)) if n == 1.0));
    }

    #[test]
    fn assign_mutates_the_nearest_binding() {
        let mut interner = Interner::new();
        let a = name(&mut interner, "a");
        let global = Environment::global();
        global.define(a, Value::Num(1.0));
        let inner = global.child();
        assert!(inner.assign(a, Value::Num(5.0)));
        assert!(matches!(global.get(a), Some(Value::Num(n)) if n == 5.0));
    }

    #[test]
    fn assign_fails_for_unbound_names() {
        let mut interner = Interner::new();
        let a = name(&mut interner, "a");
        let env = Environment::global();
        assert!(!env.assign(a, Value::Nil));
    }

    #[test]
    fn depth_qualified_access_skips_shadowing_frames() {
        let mut interner = Interner::new();
        let a = name(&mut interner, "a");
        let global = Environment::global();
        global.define(a, Value::Num(1.0));
        let inner = global.child();
        inner.define(a, Value::Num(2.0));
        assert!(matches!(inner.get_at(0, a), Some(Value::Num(n)) if n == 2.0));
        assert!(matches!(inner.get_at(1, a), Some(Value::Num(n)) if n == 1.0));
        assert!(inner.assign_at(1, a, Value::Num(9.0)));
        assert!(matches!(global.get(a), Some(Value::Num(n)) if n == 9.0));
    }
}
