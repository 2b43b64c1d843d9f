//! Module for extracting Lisp tokens from a character source.
//!
//! The tokenizer is a state machine over single characters with one
//! character of pushback. End-of-input is reported as a "no token" result
//! (`Ok(None)`); the parser decides whether that is a clean boundary or an
//! error, except inside a string literal, where it is always a hard
//! failure.
//!
//! Only significant terminators (parens, quote, the character opening the
//! next token) are pushed back; a whitespace terminator is consumed with
//! the token it ends, since the next token would skip it anyway.

use crate::reader::{ReadError, ReadResult};
use crate::data::Integer;

/// A character source with exactly one character of lookahead.
///
/// A driving collaborator that owns a real stream implements this; tests
/// and the driver use [`Chars`] over an in-memory iterator.
pub trait CharSource {
    /// Produce the next character, or `None` at end of input.
    fn read_next(&mut self) -> Option<char>;

    /// Return the most recently read character to the source. At most one
    /// character may be pending at a time.
    fn push_back(&mut self, ch: char);
}

/// [`CharSource`] over any char iterator, with a one-slot pushback buffer.
pub struct Chars<I> {
    iter: I,
    pending: Option<char>,
}

impl<I> Chars<I>
where
    I: Iterator<Item = char>,
{
    pub fn new(iter: I) -> Self {
        Chars {
            iter,
            pending: None,
        }
    }
}

impl<I> CharSource for Chars<I>
where
    I: Iterator<Item = char>,
{
    fn read_next(&mut self) -> Option<char> {
        self.pending.take().or_else(|| self.iter.next())
    }

    fn push_back(&mut self, ch: char) {
        debug_assert!(self.pending.is_none(), "only one character of pushback");
        self.pending = Some(ch);
    }
}

/// A Lisp token.
///
/// Whitespace and comments are ignored.
#[derive(Debug, PartialEq, Eq)]
pub enum Token {
    LParen,
    RParen,
    Quote,
    Symbol(String),
    Number(Integer),
    String(String),
}

/// Lexer state; `None` between tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    None,
    Symbol,
    Number,
    StringLit,
    Comment,
}

mod classes {
    use regex::Regex;
    use std::sync::OnceLock;

    /// Characters that may open a symbol: the original reader's fixed set.
    /// `'` is listed for completeness but unreachable, since the quote
    /// token is matched first.
    pub(super) fn symbol_start() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| {
            Regex::new(r"\A[A-Za-z_:+=*&^%$#@!~'<>/?`|-]")
                .expect("could not compile regex for symbol start")
        })
    }
}

fn is_symbol_start(ch: char) -> bool {
    let mut buf = [0u8; 4];
    classes::symbol_start().is_match(ch.encode_utf8(&mut buf))
}

/// Splits a character source into Lisp tokens, tracking line/column for
/// error messages.
pub struct Tokenizer<S> {
    source: S,
    line: usize,
    column: usize,
}

impl<S: CharSource> Tokenizer<S> {
    pub fn new(source: S) -> Self {
        Tokenizer {
            source,
            line: 1,
            column: 0,
        }
    }

    /// The (line, column) of the most recently read character, 1-indexed.
    pub fn position(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    fn read(&mut self) -> Option<char> {
        let ch = self.source.read_next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Push a terminator back for the next token. Never used for
    /// whitespace (which the next token would skip anyway), so the column
    /// count stays consistent.
    fn unread(&mut self, ch: char) {
        debug_assert!(!ch.is_whitespace());
        self.column -= 1;
        self.source.push_back(ch);
    }

    fn number(&self, text: String) -> ReadResult<Token> {
        let (line, column) = self.position();
        match text.parse() {
            Ok(n) => Ok(Token::Number(n)),
            Err(_) => Err(ReadError::NumberOutOfRange { text, line, column }),
        }
    }

    /// Produce the next token, or `None` at a clean end of input.
    pub fn next_token(&mut self) -> ReadResult<Option<Token>> {
        let mut state = State::None;
        let mut text = String::new();
        // Where the current token started; reported for unterminated strings.
        let mut start = self.position();

        loop {
            let ch = match self.read() {
                Some(ch) => ch,
                None => {
                    // End-of-input terminates a symbol or number like any
                    // other boundary; anything else is the caller's call.
                    return match state {
                        State::None | State::Comment => Ok(None),
                        State::Symbol => Ok(Some(Token::Symbol(text))),
                        State::Number => self.number(text).map(Some),
                        State::StringLit => Err(ReadError::UnterminatedString {
                            line: start.0,
                            column: start.1,
                        }),
                    };
                }
            };

            match state {
                State::None => {
                    if ch.is_whitespace() {
                        continue;
                    }
                    start = self.position();
                    match ch {
                        '(' => return Ok(Some(Token::LParen)),
                        ')' => return Ok(Some(Token::RParen)),
                        '\'' => return Ok(Some(Token::Quote)),
                        ';' => state = State::Comment,
                        '"' => state = State::StringLit,
                        '0'..='9' => {
                            text.push(ch);
                            state = State::Number;
                        }
                        _ if is_symbol_start(ch) => {
                            text.push(ch);
                            state = State::Symbol;
                        }
                        _ => {
                            return Err(ReadError::UnrecognizedCharacter {
                                ch,
                                line: start.0,
                                column: start.1,
                            })
                        }
                    }
                }
                State::Comment => {
                    // Consumed through end of line, discarded.
                    if ch == '\n' {
                        state = State::None;
                    }
                }
                State::Symbol => {
                    if matches!(ch, '(' | ')' | '\'') {
                        self.unread(ch);
                        return Ok(Some(Token::Symbol(text)));
                    }
                    if ch.is_whitespace() {
                        return Ok(Some(Token::Symbol(text)));
                    }
                    text.push(ch);
                }
                State::Number => {
                    if ch.is_ascii_digit() {
                        text.push(ch);
                    } else if ch.is_whitespace() {
                        return self.number(text).map(Some);
                    } else {
                        self.unread(ch);
                        return self.number(text).map(Some);
                    }
                }
                State::StringLit => {
                    // Closing quote is consumed, not stored. No escapes.
                    if ch == '"' {
                        return Ok(Some(Token::String(text)));
                    }
                    text.push(ch);
                }
            }
        }
    }
}
