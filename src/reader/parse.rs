//! Stack-driven parser: tokens in, one object graph out per call.
//!
//! The parser keeps an explicit stack of in-progress list accumulators
//! rather than recursing: a left paren suspends the current accumulator, a
//! right paren closes the current one and routes it to its parent as a
//! completed datum. Quote expansion works by appending a `(quote)`
//! placeholder immediately and splicing the next completed datum into it
//! in place.

use crate::data::{Pair, Ptr, Storage};

use super::token::{CharSource, Token, Tokenizer};
use super::{ReadError, ReadResult};

/// Read one top-level form from the token stream.
///
/// Returns `Ok(None)` at a clean end of input. One call consumes exactly
/// one form; the tokenizer can be handed back for the next one.
pub fn read_form<S: CharSource>(
    store: &mut Storage,
    tokens: &mut Tokenizer<S>,
) -> ReadResult<Option<Ptr>> {
    // The list being built at the current depth.
    let mut expr = Ptr::nil();
    // Suspended accumulators, one per open paren.
    let mut expr_stack: Vec<Ptr> = Vec::new();
    // Pending (quote) placeholder cells, with the depth each was opened at.
    let mut quote_stack: Vec<(Ptr, usize)> = Vec::new();

    loop {
        let token = match tokens.next_token()? {
            Some(token) => token,
            None => {
                return if !expr_stack.is_empty() {
                    Err(ReadError::UnexpectedEof {
                        depth: expr_stack.len(),
                    })
                } else if !quote_stack.is_empty() {
                    Err(ReadError::DanglingQuote)
                } else {
                    // Clean boundary: nothing (or only whitespace and
                    // comments) before end of input.
                    Ok(None)
                };
            }
        };

        let datum = match token {
            Token::LParen => {
                expr_stack.push(expr);
                expr = Ptr::nil();
                continue;
            }
            Token::RParen => {
                let parent = match expr_stack.pop() {
                    Some(parent) => parent,
                    None => {
                        let (line, column) = tokens.position();
                        return Err(ReadError::UnbalancedParen { line, column });
                    }
                };
                let list = expr;
                expr = parent;
                // A quote opened inside the closed list was never satisfied.
                if let Some(&(_, depth)) = quote_stack.last() {
                    if depth > expr_stack.len() {
                        return Err(ReadError::DanglingQuote);
                    }
                }
                list
            }
            Token::Symbol(name) => store.put_symbol(&name),
            Token::Number(n) => store.put_number(n, 0),
            Token::String(text) => store.put_string(text.as_bytes(), 0),
            Token::Quote => {
                // Placeholder list (quote); the next datum at this depth
                // gets spliced in behind the symbol.
                let quote = store.put_symbol("quote");
                let placeholder = store.put(Pair::cons(quote, Ptr::nil()));
                route(store, &mut expr, &mut quote_stack, expr_stack.len(), placeholder);
                quote_stack.push((placeholder, expr_stack.len()));
                continue;
            }
        };

        route(store, &mut expr, &mut quote_stack, expr_stack.len(), datum);

        if expr_stack.is_empty() && quote_stack.is_empty() {
            // The top-level form is complete.
            let pair = store
                .get(expr)
                .as_pair()
                .expect("accumulator holds at least the completed datum");
            tracing::trace!("read form {}", pair.car);
            return Ok(Some(pair.car));
        }
    }
}

/// Route a completed datum: splice it into a pending quote opened at this
/// depth, or tail-splice it onto the accumulator.
fn route(
    store: &mut Storage,
    expr: &mut Ptr,
    quote_stack: &mut Vec<(Ptr, usize)>,
    depth: usize,
    datum: Ptr,
) {
    let cell = store.put(Pair::cons(datum, Ptr::nil()));
    if let Some(&(placeholder, d)) = quote_stack.last() {
        if d == depth {
            quote_stack.pop();
            // (quote) -> (quote <datum>), in place.
            let head = store
                .get(placeholder)
                .as_pair()
                .expect("quote placeholder is a pair");
            store.update(placeholder, Pair::cons(head.car, cell));
            return;
        }
    }
    *expr = store.append(*expr, cell);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Object;
    use crate::reader::{read_body, read_str};

    /// Collect the elements of a proper list; panics on a dotted tail.
    fn elements(store: &Storage, mut list: Ptr) -> Vec<Ptr> {
        let mut items = Vec::new();
        while !list.is_nil() {
            let pair = store.get(list).as_pair().expect("proper list");
            items.push(pair.car);
            list = pair.cdr;
        }
        items
    }

    #[test]
    fn parse_number_list() -> ReadResult<()> {
        let mut store = Storage::default();
        let got = read_str(&mut store, "(1 2 3)")?;

        let items = elements(&store, got);
        assert_eq!(items.len(), 3);
        for (item, want) in items.iter().zip([1, 2, 3]) {
            let n = store.get(*item).as_number().unwrap();
            assert_eq!(n.integer, want);
            assert_eq!(n.fraction, 0);
        }
        Ok(())
    }

    #[test]
    fn parse_nested_list() -> ReadResult<()> {
        let mut store = Storage::default();
        let got = read_str(&mut store, "(a (b c) d)")?;

        let items = elements(&store, got);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], store.put_symbol("a"));
        assert_eq!(items[2], store.put_symbol("d"));

        let inner = elements(&store, items[1]);
        assert_eq!(inner.len(), 2);
        assert_eq!(inner[0], store.put_symbol("b"));
        assert_eq!(inner[1], store.put_symbol("c"));
        Ok(())
    }

    #[test]
    fn parse_bare_atom() -> ReadResult<()> {
        let mut store = Storage::default();
        let got = read_str(&mut store, "foo")?;
        assert_eq!(got, store.put_symbol("foo"));
        Ok(())
    }

    #[test]
    fn parse_string_atom() -> ReadResult<()> {
        let mut store = Storage::default();
        let got = read_str(&mut store, "\"hi there\"")?;
        let s = store.get(got).as_string().unwrap();
        assert_eq!(store.get_string(&s), b"hi there");
        Ok(())
    }

    #[test]
    fn parse_booleans() -> ReadResult<()> {
        let mut store = Storage::default();
        let got = read_str(&mut store, "(#t #f)")?;
        let items = elements(&store, got);
        assert_eq!(items, [store.t(), store.f()]);
        Ok(())
    }

    #[test]
    fn quote_expands_to_list() -> ReadResult<()> {
        let mut store = Storage::default();
        let got = read_str(&mut store, "'(a b)")?;

        let items = elements(&store, got);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], store.put_symbol("quote"));
        let quoted = elements(&store, items[1]);
        assert_eq!(quoted[0], store.put_symbol("a"));
        assert_eq!(quoted[1], store.put_symbol("b"));
        Ok(())
    }

    #[test]
    fn quote_expands_bare_atom() -> ReadResult<()> {
        let mut store = Storage::default();
        let got = read_str(&mut store, "'a")?;
        let items = elements(&store, got);
        assert_eq!(
            items,
            [store.put_symbol("quote"), store.put_symbol("a")]
        );
        Ok(())
    }

    #[test]
    fn quote_nests() -> ReadResult<()> {
        let mut store = Storage::default();
        let got = read_str(&mut store, "''x")?;

        let outer = elements(&store, got);
        assert_eq!(outer[0], store.put_symbol("quote"));
        let inner = elements(&store, outer[1]);
        assert_eq!(
            inner,
            [store.put_symbol("quote"), store.put_symbol("x")]
        );
        Ok(())
    }

    #[test]
    fn quote_inside_list() -> ReadResult<()> {
        let mut store = Storage::default();
        let got = read_str(&mut store, "(a 'b c)")?;

        let items = elements(&store, got);
        assert_eq!(items.len(), 3);
        let quoted = elements(&store, items[1]);
        assert_eq!(
            quoted,
            [store.put_symbol("quote"), store.put_symbol("b")]
        );
        Ok(())
    }

    #[test]
    fn empty_input_yields_nil() -> ReadResult<()> {
        let mut store = Storage::default();
        assert!(read_str(&mut store, "")?.is_nil());
        assert!(read_str(&mut store, "  ; just a comment\n")?.is_nil());
        Ok(())
    }

    #[test]
    fn empty_list_is_nil() -> ReadResult<()> {
        let mut store = Storage::default();
        assert!(read_str(&mut store, "()")?.is_nil());
        Ok(())
    }

    #[test]
    fn error_on_unbalanced_paren() {
        let mut store = Storage::default();
        let err = read_str(&mut store, ")").unwrap_err();
        assert!(matches!(err, ReadError::UnbalancedParen { .. }));
        assert!(!err.is_incomplete());
    }

    #[test]
    fn error_on_unclosed_list() {
        let mut store = Storage::default();
        let err = read_str(&mut store, "(a b").unwrap_err();
        assert_eq!(err, ReadError::UnexpectedEof { depth: 1 });
        assert!(err.is_incomplete());
    }

    #[test]
    fn error_on_dangling_quote() {
        let mut store = Storage::default();
        let err = read_str(&mut store, "'").unwrap_err();
        assert_eq!(err, ReadError::DanglingQuote);
        assert!(err.is_incomplete());
    }

    #[test]
    fn error_on_quote_closed_by_paren() {
        let mut store = Storage::default();
        let err = read_str(&mut store, "(a ')").unwrap_err();
        assert_eq!(err, ReadError::DanglingQuote);
    }

    #[test]
    fn one_form_per_call() -> ReadResult<()> {
        let mut store = Storage::default();
        let mut tokens = Tokenizer::new(super::super::Chars::new("1 (2) 3".chars()));

        let first = read_form(&mut store, &mut tokens)?.unwrap();
        assert_eq!(store.get(first).as_number().unwrap().integer, 1);

        let second = read_form(&mut store, &mut tokens)?.unwrap();
        let inner = elements(&store, second);
        assert_eq!(store.get(inner[0]).as_number().unwrap().integer, 2);

        let third = read_form(&mut store, &mut tokens)?.unwrap();
        assert_eq!(store.get(third).as_number().unwrap().integer, 3);

        assert!(read_form(&mut store, &mut tokens)?.is_none());
        Ok(())
    }

    #[test]
    fn read_body_collects_forms() -> ReadResult<()> {
        let mut store = Storage::default();
        let body = read_body(&mut store, "a (b) \"c\"")?;

        let items = elements(&store, body);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], store.put_symbol("a"));
        assert!(items[1].is_pair());
        assert!(matches!(store.get(items[2]), Object::String(_)));
        Ok(())
    }

    #[test]
    fn symbols_are_interned_across_forms() -> ReadResult<()> {
        let mut store = Storage::default();
        let body = read_body(&mut store, "foo foo bar")?;
        let items = elements(&store, body);
        assert_eq!(items[0], items[1]);
        assert_ne!(items[0], items[2]);
        Ok(())
    }
}
