//! Support for reading Lisp expressions from character streams.
//!
//! The tokenizer (`token`) turns a character source into typed tokens; the
//! parser (`parse`) assembles tokens into an object graph, one top-level
//! form per call.
//!
//! A read that fails may be a true error, e.g. `())`, that no additional
//! input can fix, or it may have hit an unexpected end-of-input, e.g. `((`,
//! where more input could complete the form. Interactive callers can use
//! [`ReadError::is_incomplete`] to decide between reporting an error and
//! prompting for more input.

use thiserror::Error;

use crate::data::{Pair, Ptr, Storage};

mod parse;
mod token;

pub use parse::read_form;
pub use token::{CharSource, Chars, Token, Tokenizer};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("string not closed before end of input (starting line {line}, column {column})")]
    UnterminatedString { line: usize, column: usize },
    #[error("right paren without matching left paren (line {line}, column {column})")]
    UnbalancedParen { line: usize, column: usize },
    #[error("end of input inside an expression of depth {depth}")]
    UnexpectedEof { depth: usize },
    #[error("quote with no following object")]
    DanglingQuote,
    #[error("unrecognized character {ch:?} (line {line}, column {column})")]
    UnrecognizedCharacter { ch: char, line: usize, column: usize },
    #[error("number {text:?} out of range (line {line}, column {column})")]
    NumberOutOfRange {
        text: String,
        line: usize,
        column: usize,
    },
}

impl ReadError {
    /// True if more input might complete the form; false for errors that
    /// no additional input can fix.
    pub fn is_incomplete(&self) -> bool {
        matches!(
            self,
            ReadError::UnterminatedString { .. }
                | ReadError::UnexpectedEof { .. }
                | ReadError::DanglingQuote
        )
    }
}

/// The main result type for this module.
pub type ReadResult<T> = Result<T, ReadError>;

/// Read a single form from `input`.
///
/// Empty input is a clean boundary and yields the empty list.
pub fn read_str(store: &mut Storage, input: &str) -> ReadResult<Ptr> {
    let mut tokens = Tokenizer::new(Chars::new(input.chars()));
    Ok(read_form(store, &mut tokens)?.unwrap_or_else(Ptr::nil))
}

/// Read every top-level form from `input` into a proper list (a body).
pub fn read_body(store: &mut Storage, input: &str) -> ReadResult<Ptr> {
    let mut tokens = Tokenizer::new(Chars::new(input.chars()));
    let mut body = Ptr::nil();
    let mut count = 0usize;
    while let Some(form) = read_form(store, &mut tokens)? {
        let cell = store.put(Pair::cons(form, Ptr::nil()));
        body = store.append(body, cell);
        count += 1;
    }
    tracing::trace!(forms = count, "read body");
    Ok(body)
}
