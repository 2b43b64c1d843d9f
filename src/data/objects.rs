use std::ops::Range;

use super::Storage;

pub type Integer = i64;

/// An opaque primitive-operator handle.
///
/// The core never calls these; an evaluator registers them and the core
/// only stores and prints them.
pub type Operator = fn(&mut Storage, Ptr) -> Ptr;

/// An opaque resource handle, e.g. an index into a collaborator's stream
/// table. The core stores it and refuses to print it.
pub type Handle = usize;

/// Type tag carried by every pointer. Three bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    Nil = 0,
    Number = 1,
    Symbol = 2,
    String = 3,
    Pair = 4,
    Operator = 5,
    Pointer = 6,
}

impl From<u8> for Tag {
    fn from(value: u8) -> Self {
        match value {
            0 => Tag::Nil,
            1 => Tag::Number,
            2 => Tag::Symbol,
            3 => Tag::String,
            4 => Tag::Pair,
            5 => Tag::Operator,
            6 => Tag::Pointer,
            _ => panic!("invalid tag, possible data corruption"),
        }
    }
}

/// An ID for a stored object: a combination of arena index and type tag.
///
/// Symbol pointers index the symbol table rather than the object arena,
/// so two symbols with the same spelling compare equal as pointers.
#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct Ptr {
    combined_tag: u32,
}

impl Ptr {
    pub(super) fn new(idx: usize, tag: Tag) -> Self {
        Ptr {
            combined_tag: ((idx as u32) << 3) | (tag as u32),
        }
    }

    /// The canonical empty list. Never stored in the arena.
    pub fn nil() -> Ptr {
        Default::default()
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        self.tag() == Tag::Nil
    }
    #[inline]
    pub fn is_number(&self) -> bool {
        self.tag() == Tag::Number
    }
    #[inline]
    pub fn is_symbol(&self) -> bool {
        self.tag() == Tag::Symbol
    }
    #[inline]
    pub fn is_string(&self) -> bool {
        self.tag() == Tag::String
    }
    #[inline]
    pub fn is_pair(&self) -> bool {
        self.tag() == Tag::Pair
    }

    #[inline]
    pub(crate) fn tag(&self) -> Tag {
        ((self.combined_tag & 0b111) as u8).into()
    }

    #[inline]
    pub(crate) fn idx(&self) -> usize {
        (self.combined_tag >> 3) as usize
    }
}

impl Default for Ptr {
    fn default() -> Self {
        Ptr::new(0, Tag::Nil)
    }
}

impl std::fmt::Display for Ptr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.tag() {
            Tag::Nil => "nil",
            Tag::Number => "num",
            Tag::Symbol => "sym",
            Tag::String => "str",
            Tag::Pair => "obj",
            Tag::Operator => "opr",
            Tag::Pointer => "ptr",
        };
        write!(f, "{}#{}", tag, self.idx())
    }
}

impl std::fmt::Debug for Ptr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ptr")
            .field("idx", &self.idx())
            .field("tag", &self.tag())
            .finish()
    }
}

/// Enum for a Lisp object, as retrieved from storage.
#[derive(Debug, Clone, Copy)]
pub enum Object {
    Nil,
    Number(Number),
    Symbol(Symbol),
    String(LString),
    Pair(Pair),
    Operator(Operator),
    Pointer(Handle),
}

impl Object {
    pub fn as_pair(&self) -> Option<Pair> {
        match self {
            Object::Pair(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Object::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<Symbol> {
        match self {
            Object::Symbol(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<LString> {
        match self {
            Object::String(s) => Some(*s),
            _ => None,
        }
    }
}

/// A two-part numeric literal.
///
/// The parts are independent integers with no carry or sign convention
/// tying them together; the reader only ever produces `fraction == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Number {
    pub integer: Integer,
    pub fraction: Integer,
}

#[derive(Debug, Clone, Copy)]
pub struct Pair {
    pub car: Ptr,
    pub cdr: Ptr,
}

impl Pair {
    pub fn cons(car: Ptr, cdr: Ptr) -> Self {
        Self { car, cdr }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub(super) symbol: string_interner::DefaultSymbol,
}

/// A string object: a range of the storage's string arena.
#[derive(Debug, Clone, Copy)]
pub struct LString {
    pub(super) offset: u32,
    pub(super) length: u32,
}

impl LString {
    pub fn len(&self) -> u32 {
        self.length
    }
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub(super) fn range(&self) -> Range<usize> {
        let start = self.offset as usize;
        start..start + self.length as usize
    }
}

impl From<Number> for Object {
    fn from(value: Number) -> Self {
        Object::Number(value)
    }
}

impl From<Pair> for Object {
    fn from(value: Pair) -> Self {
        Object::Pair(value)
    }
}

impl From<Symbol> for Object {
    fn from(value: Symbol) -> Self {
        Object::Symbol(value)
    }
}

impl From<LString> for Object {
    fn from(value: LString) -> Self {
        Object::String(value)
    }
}

impl From<Operator> for Object {
    fn from(value: Operator) -> Self {
        Object::Operator(value)
    }
}
