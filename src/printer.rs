//! Printing of object graphs back to canonical text.
//!
//! Traversal uses an explicit work stack, mirroring the reader, so deeply
//! nested input never grows the native call stack. Pair cells on the
//! currently-open path are marked in a bit set; reaching a marked cell
//! again means the graph has a cycle (possible via `Storage::update`) and
//! printing fails instead of looping. A cell is marked only when its own
//! spine traversal begins and cleared on the way out, so shared structure
//! is fine wherever it occurs: sibling cars, shared tails, even a car
//! aliasing a cell further along its own spine.
//!
//! Serialization rules:
//! - nil prints as `()`; a proper list as `(a b c)`.
//! - A non-nil, non-pair final cdr prints in dotted notation, `(a . b)`.
//!   The read grammar has no dot token, so dotted output does not reparse.
//! - Strings print re-quoted, so reader output round-trips.
//! - A number prints as its integer part alone when the fraction is zero
//!   (the only form the reader produces), `integer.fraction` otherwise.
//! - An operator prints as an opaque placeholder; a pointer object is not
//!   printable at all.

use std::io::{self, Write};

use thiserror::Error;

use crate::data::{BitSet, Object, Ptr, Storage};

#[derive(Debug, Error)]
pub enum PrintError {
    #[error("object {0} is not printable")]
    UnprintableObject(Ptr),
    #[error("cycle detected at {0}")]
    CircularStructure(Ptr),
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

pub type PrintResult = Result<(), PrintError>;

/// One unit of pending work for the traversal.
enum Step {
    /// Print a whole datum.
    Datum(Ptr),
    /// Print the car of this cell, then continue along its cdr.
    Chain(Ptr),
    /// Emit literal text.
    Text(&'static str),
    /// Leave a list: clear the path mark for this arena index.
    Unmark(usize),
}

/// Write the canonical textual form of `ptr` to `out`.
pub fn print(store: &Storage, ptr: Ptr, out: &mut impl Write) -> PrintResult {
    let mut stack = vec![Step::Datum(ptr)];
    let mut on_path = BitSet::new();

    // Enter a pair cell: fail on a back-reference, otherwise mark it.
    let enter = |on_path: &mut BitSet, p: Ptr| -> PrintResult {
        if on_path.get(p.idx()) {
            return Err(PrintError::CircularStructure(p));
        }
        on_path.set(p.idx());
        Ok(())
    };

    while let Some(step) = stack.pop() {
        match step {
            Step::Text(s) => out.write_all(s.as_bytes())?,
            Step::Unmark(idx) => on_path.clear(idx),
            Step::Datum(p) => match store.get(p) {
                Object::Nil => out.write_all(b"()")?,
                Object::Number(n) => {
                    if n.fraction == 0 {
                        write!(out, "{}", n.integer)?;
                    } else {
                        write!(out, "{}.{}", n.integer, n.fraction)?;
                    }
                }
                Object::Symbol(s) => out.write_all(store.symbol_name(s).as_bytes())?,
                Object::String(s) => {
                    out.write_all(b"\"")?;
                    out.write_all(store.get_string(&s))?;
                    out.write_all(b"\"")?;
                }
                Object::Operator(_) => out.write_all(b"#<operator>")?,
                Object::Pointer(_) => return Err(PrintError::UnprintableObject(p)),
                Object::Pair(_) => {
                    out.write_all(b"(")?;
                    stack.push(Step::Chain(p));
                }
            },
            Step::Chain(p) => {
                // Marked here, once this cell's own traversal begins; a
                // car printed before this point may alias it freely.
                enter(&mut on_path, p)?;
                let pair = store.get(p).as_pair().expect("chain steps hold pairs");
                // Pushed in reverse of execution order.
                match store.get(pair.cdr) {
                    Object::Nil => {
                        stack.push(Step::Unmark(p.idx()));
                        stack.push(Step::Text(")"));
                        stack.push(Step::Datum(pair.car));
                    }
                    Object::Pair(_) => {
                        stack.push(Step::Unmark(p.idx()));
                        stack.push(Step::Chain(pair.cdr));
                        stack.push(Step::Text(" "));
                        stack.push(Step::Datum(pair.car));
                    }
                    _ => {
                        // Dotted tail.
                        stack.push(Step::Unmark(p.idx()));
                        stack.push(Step::Text(")"));
                        stack.push(Step::Datum(pair.cdr));
                        stack.push(Step::Text(" . "));
                        stack.push(Step::Datum(pair.car));
                    }
                }
            }
        }
    }
    Ok(())
}

/// [`print`] into a fresh String. String contents pass through as-is, so
/// non-UTF-8 bytes stored by a collaborator are replaced lossily.
pub fn print_to_string(store: &Storage, ptr: Ptr) -> Result<String, PrintError> {
    let mut buf = Vec::new();
    print(store, ptr, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write an indented, one-node-per-line dump of the object graph.
///
/// This is the debugging traversal: every cell appears with its pointer,
/// cars one level deeper than their cell. Already-visited pairs are
/// elided rather than re-expanded, so shared structure and cycles are
/// both safe here.
pub fn dump(store: &Storage, ptr: Ptr, out: &mut impl Write) -> PrintResult {
    let mut stack = vec![(ptr, 0usize)];
    let mut seen = BitSet::new();

    while let Some((p, indent)) = stack.pop() {
        let pad = indent * 2;
        match store.get(p) {
            Object::Pair(pair) => {
                if seen.get(p.idx()) {
                    writeln!(out, "{:pad$}{} (shared)", "", p)?;
                    continue;
                }
                seen.set(p.idx());
                writeln!(out, "{:pad$}{}", "", p)?;
                stack.push((pair.cdr, indent));
                stack.push((pair.car, indent + 1));
            }
            Object::Nil => writeln!(out, "{:pad$}{} nil", "", p)?,
            Object::Number(n) => {
                writeln!(out, "{:pad$}{} number {}.{}", "", p, n.integer, n.fraction)?
            }
            Object::Symbol(s) => {
                writeln!(out, "{:pad$}{} symbol {}", "", p, store.symbol_name(s))?
            }
            Object::String(s) => writeln!(
                out,
                "{:pad$}{} string {:?}",
                "",
                p,
                String::from_utf8_lossy(store.get_string(&s))
            )?,
            Object::Operator(_) => writeln!(out, "{:pad$}{} operator", "", p)?,
            Object::Pointer(h) => writeln!(out, "{:pad$}{} pointer {}", "", p, h)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Pair, Storage};
    use crate::reader::read_str;

    fn roundtrip(input: &str) -> String {
        let mut store = Storage::default();
        let ptr = read_str(&mut store, input).expect("test input parses");
        print_to_string(&store, ptr).expect("test input prints")
    }

    #[test]
    fn print_canonical_forms() {
        for input in [
            "()",
            "a",
            "42",
            "(1 2 3)",
            "(a (b c) d)",
            "(quote (a b))",
            "\"hi there\"",
            "(a \"b\" 3)",
            "(#t #f)",
        ] {
            assert_eq!(roundtrip(input), input);
        }
    }

    #[test]
    fn quote_prints_expanded() {
        assert_eq!(roundtrip("'(a b)"), "(quote (a b))");
        assert_eq!(roundtrip("'a"), "(quote a)");
    }

    #[test]
    fn whitespace_and_comments_normalize() {
        assert_eq!(roundtrip("( a\n\tb ; comment\n c )"), "(a b c)");
    }

    #[test]
    fn fraction_zero_prints_integer_only() {
        let mut store = Storage::default();
        let n = store.put_number(7, 0);
        assert_eq!(print_to_string(&store, n).unwrap(), "7");
    }

    #[test]
    fn nonzero_fraction_prints_dotted_digits() {
        let mut store = Storage::default();
        let n = store.put_number(3, 14);
        assert_eq!(print_to_string(&store, n).unwrap(), "3.14");
    }

    #[test]
    fn dotted_pair_prints_with_dot() {
        let mut store = Storage::default();
        let a = store.put_symbol("a");
        let b = store.put_symbol("b");
        let pair = store.put(Pair::cons(a, b));
        assert_eq!(print_to_string(&store, pair).unwrap(), "(a . b)");
    }

    #[test]
    fn operator_prints_placeholder() {
        fn no_op(_: &mut Storage, x: Ptr) -> Ptr {
            x
        }
        let mut store = Storage::default();
        let op = store.put_operator(no_op);
        let cell = store.put(Pair::cons(op, Ptr::nil()));
        assert_eq!(print_to_string(&store, cell).unwrap(), "(#<operator>)");
    }

    #[test]
    fn pointer_is_unprintable() {
        let mut store = Storage::default();
        let handle = store.put_pointer(7);
        let err = print_to_string(&store, handle).unwrap_err();
        assert!(matches!(err, PrintError::UnprintableObject(_)));
    }

    #[test]
    fn cycle_is_detected() {
        let mut store = Storage::default();
        let list = read_str(&mut store, "(a b)").unwrap();

        // Splice the list onto its own tail: (a b a b a b ...)
        let head = store.get(list).as_pair().unwrap();
        let tail = head.cdr;
        let last = store.get(tail).as_pair().unwrap();
        store.update(tail, Pair::cons(last.car, list));

        let err = print_to_string(&store, list).unwrap_err();
        assert!(matches!(err, PrintError::CircularStructure(_)));
    }

    #[test]
    fn car_back_reference_is_detected() {
        let mut store = Storage::default();
        let a = store.put_symbol("a");
        let cell = store.put(Pair::cons(a, Ptr::nil()));
        // Point the cell's car back at itself.
        store.update(cell, Pair::cons(cell, Ptr::nil()));

        let err = print_to_string(&store, cell).unwrap_err();
        assert!(matches!(err, PrintError::CircularStructure(_)));
    }

    #[test]
    fn shared_tail_is_not_a_cycle() {
        let mut store = Storage::default();
        let c = store.put_symbol("c");
        let shared = store.put(Pair::cons(c, Ptr::nil()));

        let a = store.put_symbol("a");
        let b = store.put_symbol("b");
        let first = store.put(Pair::cons(a, shared));
        let second = store.put(Pair::cons(b, shared));

        let tail = store.put(Pair::cons(second, Ptr::nil()));
        let both = store.put(Pair::cons(first, tail));

        assert_eq!(print_to_string(&store, both).unwrap(), "((a c) (b c))");
    }

    #[test]
    fn car_aliasing_its_own_spine_is_not_a_cycle() {
        // The first element is the same cell the spine continues with:
        // ((a) a), acyclic. The car must print before its alias is
        // treated as an ancestor.
        let mut store = Storage::default();
        let a = store.put_symbol("a");
        let shared = store.put(Pair::cons(a, Ptr::nil()));
        let both = store.put(Pair::cons(shared, shared));

        assert_eq!(print_to_string(&store, both).unwrap(), "((a) a)");
    }

    #[test]
    fn dump_indents_and_terminates() {
        let mut store = Storage::default();
        let list = read_str(&mut store, "(a (b) 3)").unwrap();

        let text = {
            let mut buf = Vec::new();
            dump(&store, list, &mut buf).unwrap();
            String::from_utf8(buf).unwrap()
        };
        assert!(text.contains("symbol a"));
        assert!(text.contains("  sym")); // cars are indented
        assert!(text.contains("number 3.0"));

        // A cyclic graph still terminates.
        let head = store.get(list).as_pair().unwrap();
        store.update(list, Pair::cons(head.car, list));
        let mut buf = Vec::new();
        dump(&store, list, &mut buf).unwrap();
        assert!(String::from_utf8(buf).unwrap().contains("(shared)"));
    }

    #[test]
    fn reader_output_reparses_equal() {
        let mut store = Storage::default();
        for input in ["(a (b c) d)", "(1 (2 3) \"x\" foo)", "'(a b)"] {
            let first = read_str(&mut store, input).unwrap();
            let text = print_to_string(&store, first).unwrap();
            let second = read_str(&mut store, &text).unwrap();
            assert_eq!(
                print_to_string(&store, second).unwrap(),
                text,
                "round-trip mismatch for {input:?}"
            );
        }
    }
}
