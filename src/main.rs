//! Read Lisp forms from stdin and render each one back:
//! - canonical Lisp on stdout, i.e. a normalized mirror of the input
//! - an indented dump of the object graph on stderr
//!
//! ```ignore
//! <input.lisp lisp_echo
//! ```

use std::io::{Read, Write};
use std::process::ExitCode;

use protolisp::data::Storage;
use protolisp::printer;
use protolisp::reader::{self, Chars, Tokenizer};

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let mut bytes = Vec::new();
    std::io::stdin()
        .lock()
        .read_to_end(&mut bytes)
        .expect("error: could not read input");
    let input = String::from_utf8(bytes).expect("error: input is not UTF-8");

    let mut store = Storage::default();
    let mut tokens = Tokenizer::new(Chars::new(input.chars()));
    let mut stdout = std::io::stdout().lock();
    let mut stderr = std::io::stderr().lock();

    loop {
        match reader::read_form(&mut store, &mut tokens) {
            Ok(None) => break,
            Ok(Some(form)) => {
                printer::print(&store, form, &mut stdout).expect("error: could not print form");
                writeln!(stdout).expect("error: could not print form");
                printer::dump(&store, form, &mut stderr).expect("error: could not dump form");
            }
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    tracing::debug!(stats = ?store.current_stats(), "storage after reading");
    ExitCode::SUCCESS
}
