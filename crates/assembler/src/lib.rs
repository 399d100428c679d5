//! Lingo assembler: text ↔ script library.
//!
//! Handlers are authored as opcode mnemonics inside `script` and `handler`
//! blocks. The assembler interns names and literals, scales variable slots by
//! the library's multiplier and resolves `@label` jumps to byte distances, so
//! the result looks like a decoded Director cast library.
//!
//! # Usage
//!
//! ```
//! use lingo_assembler::{assemble, listing};
//!
//! let text = "\
//! library 1 \"Internal\" version=1200
//! script 1 movie
//!   handler answer
//!     PUSH_INT8 42
//!     RET
//!   end
//! end
//! ";
//! let library = assemble(text).unwrap();
//! assert_eq!(library.scripts[0].handlers.len(), 1);
//!
//! let again = assemble(&listing(&library)).unwrap();
//! assert_eq!(again, library);
//! ```

pub mod error;

mod lexer;
mod listing;
mod parser;

pub use error::AsmError;
pub use parser::{DEFAULT_DIR_VERSION, DEFAULT_LIBRARY_NAME, DEFAULT_LIBRARY_NUMBER};

use lingo_common::ScriptLibrary;
use parser::Assembler;

/// Assemble text into a script library.
///
/// Returns the first error encountered. Every error carries its line number.
pub fn assemble(text: &str) -> Result<ScriptLibrary, AsmError> {
    let mut assembler = Assembler::new();
    for (idx, line) in text.lines().enumerate() {
        assembler.feed(line, idx + 1)?;
    }
    assembler.finish()
}

/// Print a library as annotated assembly text that reassembles to it.
pub fn listing(library: &ScriptLibrary) -> String {
    listing::listing(library)
}
