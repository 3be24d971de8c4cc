//! String interning for identifiers and string literals.
//!
//! The scanner interns every identifier and string literal it produces, so the
//! rest of the pipeline (parser, resolver, environments) works with cheap
//! `Copy` ids instead of owned strings. Lookups back to text are only needed
//! for diagnostics and `print` output.

use ahash::AHashMap;

/// Index into the interner's storage.
///
/// Uses `u32` to keep tokens and AST nodes small. ~4 billion unique strings
/// is far more than any source file can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct StringId(u32);

impl StringId {
    /// Returns the raw index value.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Deduplicating store of strings, addressed by [`StringId`].
///
/// A `ReplSession` clones the interner before compiling each input line and
/// commits the clone only once the line is known to evaluate, so ids handed
/// out by earlier lines stay stable even when a later line fails to parse.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Interner {
    lookup: AHashMap<String, StringId>,
    strings: Vec<String>,
}

impl Interner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `text`, interning it first if it is new.
    pub fn intern(&mut self, text: &str) -> StringId {
        if let Some(&id) = self.lookup.get(text) {
            return id;
        }
        let id = StringId(u32::try_from(self.strings.len()).expect("interner overflowed u32 ids"));
        self.strings.push(text.to_owned());
        self.lookup.insert(text.to_owned(), id);
        id
    }

    /// Returns the text for a previously interned id.
    #[must_use]
    pub fn get(&self, id: StringId) -> &str {
        &self.strings[id.index()]
    }

    /// Returns the id for `text` if it has been interned, without interning.
    #[must_use]
    pub fn lookup(&self, text: &str) -> Option<StringId> {
        self.lookup.get(text).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_twice_returns_the_same_id() {
        let mut interner = Interner::new();
        let a = interner.intern("count");
        let b = interner.intern("count");
        assert_eq!(a, b);
        assert_eq!(interner.get(a), "count");
    }

    #[test]
    fn distinct_strings_get_distinct_ids() {
        let mut interner = Interner::new();
        let a = interner.intern("a");
        let b = interner.intern("b");
        assert_ne!(a, b);
        assert_eq!(interner.get(b), "b");
    }
}
