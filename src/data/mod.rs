//! Lisp data types and allocators.
//!
//! All values live in a `Storage`: an arena of fixed-size slots addressed
//! by index-based, type-tagged pointers (`Ptr`). There is no reclamation;
//! objects live as long as their storage.
//!
//! - Pairs, numbers, operators and resource handles occupy arena slots.
//!   Pairs may be updated in place (`rplaca`/`rplacd` style), which is what
//!   the reader's destructive append and quote expansion are built on.
//! - String *contents* live in a separate byte arena; a string object is
//!   an (offset, length) range over it.
//! - Symbols are interned and perpetual. A symbol pointer indexes the
//!   symbol table directly, so pointer identity coincides with spelling
//!   equality for the lifetime of the storage.
//!
//! `Storage` is an explicit, context-scoped service object rather than
//! process-global state; callers that want parallel read sessions create
//! one per session.

mod bitset;
mod objects;

pub(crate) use bitset::BitSet;
pub use objects::*;

use std::cmp::max;

use string_interner::{DefaultStringInterner, Symbol as InternerSymbol};

/// Storage allows representing all persistent objects.
pub struct Storage {
    objects: Vec<StoredValue>,
    string_data: Vec<u8>,

    symbols: DefaultStringInterner,

    sym_true: Ptr,
    sym_false: Ptr,
}

/// A single arena slot. A closed sum, pattern-matched on access;
/// the pointer tag is redundant with the variant and checked in `get`.
#[derive(Clone, Copy)]
enum StoredValue {
    Number(Number),
    String(LString),
    Pair(Pair),
    Operator(Operator),
    Pointer(Handle),
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct StorageStats {
    pub objects: usize,
    pub string_data: usize,
    pub symbols: usize,
}

impl Default for Storage {
    fn default() -> Self {
        let mut s = Self {
            objects: Vec::new(),
            string_data: Vec::new(),
            symbols: DefaultStringInterner::default(),
            sym_true: Ptr::nil(),
            sym_false: Ptr::nil(),
        };
        // The boolean atoms exist from the start.
        s.sym_true = s.put_symbol("#t");
        s.sym_false = s.put_symbol("#f");
        s
    }
}

impl Storage {
    pub fn current_stats(&self) -> StorageStats {
        StorageStats {
            objects: self.objects.len(),
            string_data: self.string_data.len(),
            symbols: self.symbols.len(),
        }
    }

    /// The canonical true atom, the pre-interned symbol `#t`.
    pub fn t(&self) -> Ptr {
        self.sym_true
    }

    /// The canonical false atom, the pre-interned symbol `#f`.
    pub fn f(&self) -> Ptr {
        self.sym_false
    }

    /// Add a symbol to the symbol table, or return the existing instance.
    ///
    /// For the lifetime of this storage, equal spellings yield the
    /// identical pointer.
    pub fn put_symbol(&mut self, name: &str) -> Ptr {
        let sym = self.symbols.get_or_intern(name);
        Ptr::new(sym.to_usize(), Tag::Symbol)
    }

    /// Resolve a symbol to its spelling.
    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        self.symbols
            .resolve(symbol.symbol)
            .expect("symbol was interned in this storage")
    }

    /// Add a string to the string arena.
    ///
    /// The arena reserves `max(min_length, content.len() + 1)` bytes for
    /// the object; the extra space is zero-filled. The object's length is
    /// always the content length.
    pub fn put_string(&mut self, content: &[u8], min_length: usize) -> Ptr {
        let reserved = max(min_length, content.len() + 1);
        let offset = self.string_data.len();
        self.string_data.extend_from_slice(content);
        self.string_data.resize(offset + reserved, 0);
        self.put(LString {
            offset: offset as u32,
            length: content.len() as u32,
        })
    }

    /// Resolve a string to its binary contents.
    pub fn get_string(&self, s: &LString) -> &[u8] {
        &self.string_data[s.range()]
    }

    pub fn put_number(&mut self, integer: Integer, fraction: Integer) -> Ptr {
        self.put(Number { integer, fraction })
    }

    pub fn put_operator(&mut self, operator: Operator) -> Ptr {
        self.put(Object::Operator(operator))
    }

    pub fn put_pointer(&mut self, handle: Handle) -> Ptr {
        self.put(Object::Pointer(handle))
    }

    /// Stores the Lisp object in storage.
    pub fn put(&mut self, value: impl Into<Object>) -> Ptr {
        let (stored, tag) = match value.into() {
            // Nil is canonically the zero pointer; never stored.
            Object::Nil => return Ptr::nil(),
            // Symbols live in the symbol table, not the arena.
            Object::Symbol(s) => return Ptr::new(s.symbol.to_usize(), Tag::Symbol),
            Object::Number(n) => (StoredValue::Number(n), Tag::Number),
            Object::String(s) => (StoredValue::String(s), Tag::String),
            Object::Pair(p) => (StoredValue::Pair(p), Tag::Pair),
            Object::Operator(f) => (StoredValue::Operator(f), Tag::Operator),
            Object::Pointer(h) => (StoredValue::Pointer(h), Tag::Pointer),
        };
        let slot = self.objects.len();
        self.objects.push(stored);
        Ptr::new(slot, tag)
    }

    pub fn get(&self, ptr: Ptr) -> Object {
        if ptr.is_nil() {
            return Object::Nil;
        }
        if ptr.is_symbol() {
            let symbol = string_interner::DefaultSymbol::try_from_usize(ptr.idx())
                .expect("symbol pointer is in range of the symbol table");
            return Object::Symbol(Symbol { symbol });
        }

        let idx = ptr.idx();
        assert!(idx < self.objects.len());
        match (self.objects[idx], ptr.tag()) {
            (StoredValue::Number(n), Tag::Number) => Object::Number(n),
            (StoredValue::String(s), Tag::String) => Object::String(s),
            (StoredValue::Pair(p), Tag::Pair) => Object::Pair(p),
            (StoredValue::Operator(f), Tag::Operator) => Object::Operator(f),
            (StoredValue::Pointer(h), Tag::Pointer) => Object::Pointer(h),
            _ => panic!("pointer tag does not match stored object"),
        }
    }

    /// Replace the given pair with a new one, in place.
    /// This is the only form of update permitted.
    pub fn update(&mut self, ptr: Ptr, pair: Pair) {
        assert!(ptr.is_pair());
        let idx = ptr.idx();
        assert!(idx < self.objects.len());
        self.objects[idx] = StoredValue::Pair(pair);
    }

    /// Destructively append `tail` onto the proper list `list`: walk to the
    /// last cell and replace its cdr. Returns the head of the result.
    ///
    /// Panics if `list` is not nil or a nil-terminated chain of pairs; a
    /// dotted list is a checked precondition failure, like a non-pair
    /// handed to `update`.
    ///
    /// O(length of `list`) per call. Splicing a tail that is an ancestor of
    /// `list` creates a cycle; the printer guards against those, this does
    /// not.
    pub fn append(&mut self, list: Ptr, tail: Ptr) -> Ptr {
        if list.is_nil() {
            return tail;
        }
        let mut cursor = list;
        loop {
            let pair = self
                .get(cursor)
                .as_pair()
                .expect("append requires a proper list");
            if pair.cdr.is_nil() {
                self.update(cursor, Pair::cons(pair.car, tail));
                return list;
            }
            cursor = pair.cdr;
        }
    }
}
