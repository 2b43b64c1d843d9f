//! A small Lisp reader and printer.
//!
//! The core is a character-level tokenizer, a stack-driven parser that
//! builds a cons-cell object graph in an arena [`data::Storage`], a symbol
//! interner, and a structural printer that serializes the graph back to
//! text. Evaluation, environments and stream acquisition are left to
//! collaborators: a driver hands the reader a character source and gets
//! back pointers into the storage it supplied.

pub mod data;
pub mod printer;
pub mod reader;

pub use data::{Object, Pair, Ptr, Storage};
pub use printer::{print, print_to_string, PrintError};
pub use reader::{read_body, read_str, ReadError};
